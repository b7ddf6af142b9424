//! Fill colors for countries.
//!
//! Two schemes: a fixed continent palette (Olympic ring colors) and a
//! per-country palette indexed by graph color class.

use crate::coloring::ColorAssignment;
use crate::region::{Continent, Region};

/// Sea color; also the root fill/stroke of the document.
pub const WATER: &str = "#6baed6";

/// ColorBrewer Set2 entries 4, 5, 6, 3, 1.
pub const COLOR_MAP: [&str; 5] = ["#a6d854", "#ffd92f", "#e5c494", "#e78ac3", "#fc8d62"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FillScheme {
    /// One color per continent.
    #[default]
    Continent,
    /// One color per graph color class, so touching countries differ.
    GraphColoring,
}

pub fn continent_fill(continent: Continent) -> &'static str {
    match continent {
        Continent::Africa => "green",
        Continent::Antarctica => "white",
        Continent::Asia => "red",
        Continent::Europe => "black",
        Continent::NorthAmerica => "blue",
        Continent::Oceania => "green",
        Continent::SevenSeas => WATER,
        Continent::SouthAmerica => "yellow",
    }
}

/// Palette entry for a color class; wraps when there are more classes than entries.
pub fn class_fill(class: usize) -> &'static str {
    COLOR_MAP[class % COLOR_MAP.len()]
}

impl FillScheme {
    /// Fill set on a continent's group, if the scheme colors whole continents.
    pub fn continent_fill(self, continent: Continent) -> Option<&'static str> {
        match self {
            FillScheme::Continent => Some(continent_fill(continent)),
            FillScheme::GraphColoring => None,
        }
    }

    /// Fill for one region's polygons. `node` is the region's graph index.
    pub fn region_fill(self, region: &Region, node: usize, colors: &ColorAssignment) -> &'static str {
        match self {
            FillScheme::Continent => continent_fill(region.continent()),
            FillScheme::GraphColoring if region.continent() == Continent::Antarctica => "white",
            FillScheme::GraphColoring => class_fill(colors.color(node)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::AdjacencyGraph;
    use crate::coloring::greedy_color;
    use crate::region::RegionId;
    use geo::polygon;

    fn region(continent: Continent) -> Region {
        Region::new(
            RegionId(0),
            "r",
            continent,
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
        )
    }

    #[test]
    fn continent_scheme_ignores_classes() {
        let colors = greedy_color(&AdjacencyGraph::with_nodes(1));
        let asia = region(Continent::Asia);
        assert_eq!(FillScheme::Continent.region_fill(&asia, 0, &colors), "red");
        assert_eq!(FillScheme::Continent.continent_fill(Continent::SevenSeas), Some(WATER));
    }

    #[test]
    fn coloring_scheme_uses_classes() {
        let graph = AdjacencyGraph::from_edges(2, [(0, 1)]);
        let colors = greedy_color(&graph);
        let europe = region(Continent::Europe);

        let a = FillScheme::GraphColoring.region_fill(&europe, 0, &colors);
        let b = FillScheme::GraphColoring.region_fill(&europe, 1, &colors);
        assert_ne!(a, b);
        assert_eq!(FillScheme::GraphColoring.continent_fill(Continent::Europe), None);

        let antarctica = region(Continent::Antarctica);
        assert_eq!(FillScheme::GraphColoring.region_fill(&antarctica, 0, &colors), "white");
    }

    #[test]
    fn class_fill_wraps() {
        assert_eq!(class_fill(0), class_fill(5));
        assert_eq!(class_fill(4), "#fc8d62");
    }
}
