//! End-to-end render: locate inputs, load, project, color, compose, write.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use geo::{MultiLineString, MultiPolygon};
use log::{debug, info};
use mapcolor::{build_adjacency, greedy_color, AdjacencyStrategy, FillScheme, Graticule, Projection, Region};

use crate::datasets::{self, DatasetIndex, NamedLines};
use crate::error::PipelineError;
use crate::relief::{self, ReliefConfig};
use crate::render::{self, MapLayers};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub output: PathBuf,
    pub projection: Projection,
    pub fill: FillScheme,
    pub adjacency: AdjacencyStrategy,
    /// `None` leaves the relief layer out.
    pub relief: Option<ReliefConfig>,
}

/// Summary of a finished render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub bytes_written: usize,
    pub regions: usize,
    pub edges: usize,
    pub colors_used: usize,
}

/// Dataset paths, all resolved before anything is read.
struct Inputs {
    countries: PathBuf,
    rivers: PathBuf,
    lakes: PathBuf,
    glaciers: PathBuf,
    geographic_lines: PathBuf,
}

impl Inputs {
    fn resolve(config: &PipelineConfig) -> Result<Self, PipelineError> {
        if !config.data_dir.is_dir() {
            return Err(PipelineError::MissingInput {
                what: "data directory".into(),
                path: config.data_dir.clone(),
            });
        }

        let index = DatasetIndex::build(&config.data_dir);
        debug!("{} candidate datasets in {}", index.len(), config.data_dir.display());

        let find = |stem: &str| {
            index
                .resolve(stem)
                .map(Path::to_path_buf)
                .ok_or_else(|| PipelineError::MissingInput {
                    what: format!("dataset {stem} (.shp, .geojson, .json or .zip)"),
                    path: config.data_dir.clone(),
                })
        };

        Ok(Inputs {
            countries: find(datasets::COUNTRIES)?,
            rivers: find(datasets::RIVERS)?,
            lakes: find(datasets::LAKES)?,
            glaciers: find(datasets::GLACIERS)?,
            geographic_lines: find(datasets::GEOGRAPHIC_LINES)?,
        })
    }
}

fn project_polygons(layer: Vec<MultiPolygon<f64>>, projection: &Projection) -> Vec<MultiPolygon<f64>> {
    layer.iter().map(|mp| projection.project(mp)).collect()
}

fn project_lines(layer: Vec<MultiLineString<f64>>, projection: &Projection) -> Vec<MultiLineString<f64>> {
    layer.iter().map(|ml| projection.project(ml)).collect()
}

/// Write through a sibling temporary file so a failed run never leaves a
/// truncated SVG behind.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

/// Render the map described by `config` and write it to `config.output`.
///
/// Missing inputs are reported before any dataset is read, and the output
/// file is only created once the whole document has been built.
pub fn run(config: &PipelineConfig) -> Result<OutputArtifact, PipelineError> {
    let started = Instant::now();
    let projection = config.projection;

    // ---------------------------------------------------------------------
    // Inputs
    // ---------------------------------------------------------------------
    let inputs = Inputs::resolve(config)?;
    if let Some(relief) = &config.relief {
        relief.check()?;
    }

    // ---------------------------------------------------------------------
    // Countries: load, project, adjacency, coloring
    // ---------------------------------------------------------------------
    let regions: Vec<Region> = datasets::load_regions(&inputs.countries)?
        .iter()
        .map(|r| r.reprojected(|c| projection.forward_coord(c)))
        .collect();
    info!("Loaded {} regions from {}", regions.len(), inputs.countries.display());

    let graph = build_adjacency(&regions, config.adjacency)?;
    let colors = greedy_color(&graph);
    info!(
        "Colored {} regions ({} shared borders) with {} colors",
        graph.node_count(),
        graph.edge_count(),
        colors.color_count()
    );

    // ---------------------------------------------------------------------
    // Remaining layers
    // ---------------------------------------------------------------------
    let rivers = project_lines(datasets::load_lines(&inputs.rivers)?, &projection);
    let lakes = project_polygons(datasets::load_polygons(&inputs.lakes)?, &projection);
    let glaciers = project_polygons(datasets::load_polygons(&inputs.glaciers)?, &projection);
    let geographic_lines: Vec<NamedLines> = datasets::load_named_lines(&inputs.geographic_lines)?
        .into_iter()
        .map(|named| NamedLines {
            lines: projection.project(&named.lines),
            name: named.name,
        })
        .collect();
    debug!(
        "Layers: {} rivers, {} lakes, {} glaciers, {} geographic lines",
        rivers.len(),
        lakes.len(),
        glaciers.len(),
        geographic_lines.len()
    );

    let graticule = Graticule::geographic(mapcolor::graticule::GRATICULE_STEP_DEG).projected(&projection);
    let bounds = graticule
        .total_bounds()
        .unwrap_or_else(|| projection.projected_bounds(geo::Rect::new((-180.0, -90.0), (180.0, 90.0))));

    let relief = config
        .relief
        .as_ref()
        .map(|r| relief::load_or_build(r, &projection))
        .transpose()?;

    // ---------------------------------------------------------------------
    // Compose + write
    // ---------------------------------------------------------------------
    let layers = MapLayers {
        regions,
        colors,
        rivers,
        lakes,
        glaciers,
        graticule,
        geographic_lines,
        relief,
    };
    let doc = render::render(&layers, config.fill, bounds, projection.svg_scale());
    let bytes = doc.to_bytes()?;
    write_atomically(&config.output, &bytes)?;

    info!(
        "Wrote {} ({} bytes) in {:.1?}",
        config.output.display(),
        bytes.len(),
        started.elapsed()
    );

    Ok(OutputArtifact {
        path: config.output.clone(),
        bytes_written: bytes.len(),
        regions: graph.node_count(),
        edges: graph.edge_count(),
        colors_used: layers.colors.color_count(),
    })
}
