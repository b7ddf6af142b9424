//! mapcolor: the computational core of the world map renderer.
//!
//! - `region`: typed country records (`Region`) over a tagged polygon / multi-polygon geometry.
//! - `adjacency`: "shares a border" graph built from the DE-9IM touches predicate,
//!   with an R-tree envelope prefilter.
//! - `coloring`: smallest-last greedy coloring of that graph.
//! - `palette`: continent palette and color-class palette used for fills.
//! - `projection`: Eckert II equal-area projection (ESRI:53014) and its inverse.
//! - `graticule`: 10 degree reference grid.
//! - `svg`: deterministic SVG 1.1 writer.
//!
//! Everything here is pure computation over in-memory data; file formats and
//! the command line live in the `world_map` binary.

pub mod adjacency;
pub mod coloring;
pub mod error;
pub mod graticule;
pub mod palette;
pub mod projection;
pub mod region;
pub mod svg;

pub use adjacency::{build_adjacency, AdjacencyGraph, AdjacencyStrategy};
pub use coloring::{greedy_color, smallest_last_order, ColorAssignment};
pub use error::{GeometryError, ParseContinentError};
pub use graticule::Graticule;
pub use palette::FillScheme;
pub use projection::Projection;
pub use region::{Continent, Region, RegionGeometry, RegionId};
