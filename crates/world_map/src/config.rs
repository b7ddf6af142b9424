use std::fmt;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use mapcolor::{AdjacencyStrategy, FillScheme, Projection};

use crate::pipeline::PipelineConfig;
use crate::relief::{self, ReliefConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProjectionArg {
    /// Eckert II equal-area (ESRI:53014).
    Eckert2,
    /// Plain longitude/latitude.
    Wgs84,
}

impl fmt::Display for ProjectionArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProjectionArg::Eckert2 => "eckert2",
            ProjectionArg::Wgs84 => "wgs84",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FillArg {
    /// One color per continent.
    Continent,
    /// Neighbouring countries always get different colors.
    GraphColoring,
}

impl fmt::Display for FillArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FillArg::Continent => "continent",
            FillArg::GraphColoring => "graph-coloring",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AdjacencyArg {
    /// R-tree bounding box prefilter.
    Indexed,
    /// Test every pair of countries.
    Naive,
}

impl fmt::Display for AdjacencyArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AdjacencyArg::Indexed => "indexed",
            AdjacencyArg::Naive => "naive",
        })
    }
}

/// `world_map` - renders Natural Earth countries, rivers, lakes, glaciers and a
/// shaded relief into a single SVG.
#[derive(Parser, Debug, Clone)]
#[command(name = "world_map", version, about, long_about = None)]
pub struct Config {
    /// Directory searched (recursively) for the Natural Earth datasets.
    #[arg(long, env = "WORLD_MAP_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Where to write the SVG.
    #[arg(long, env = "WORLD_MAP_OUTPUT", default_value = "world-map.svg")]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = ProjectionArg::Eckert2)]
    pub projection: ProjectionArg,

    #[arg(long, value_enum, default_value_t = FillArg::Continent)]
    pub fill: FillArg,

    #[arg(long, value_enum, default_value_t = AdjacencyArg::Indexed)]
    pub adjacency: AdjacencyArg,

    /// Width in pixels of the reprojected relief raster.
    #[arg(long, default_value_t = relief::DEFAULT_WIDTH)]
    pub relief_width: u32,

    /// Leave out the relief background.
    #[arg(long, default_value_t = false)]
    pub no_relief: bool,

    /// Reprojected relief JPEG; relative paths are resolved against --data-dir.
    #[arg(long, default_value = relief::DEFAULT_CACHE)]
    pub relief_cache: PathBuf,

    /// Relief GeoTIFF used when the cache is missing; relative to --data-dir.
    #[arg(long, default_value = relief::DEFAULT_SOURCE)]
    pub relief_source: PathBuf,
}

impl Config {
    pub fn pipeline(&self) -> PipelineConfig {
        let projection = match self.projection {
            ProjectionArg::Eckert2 => Projection::default(),
            ProjectionArg::Wgs84 => Projection::Wgs84,
        };
        let fill = match self.fill {
            FillArg::Continent => FillScheme::Continent,
            FillArg::GraphColoring => FillScheme::GraphColoring,
        };
        let adjacency = match self.adjacency {
            AdjacencyArg::Indexed => AdjacencyStrategy::Indexed,
            AdjacencyArg::Naive => AdjacencyStrategy::Naive,
        };
        let relief = (!self.no_relief).then(|| ReliefConfig {
            cache: self.data_dir.join(&self.relief_cache),
            source: self.data_dir.join(&self.relief_source),
            width: self.relief_width,
        });

        PipelineConfig {
            data_dir: self.data_dir.clone(),
            output: self.output.clone(),
            projection,
            fill,
            adjacency,
            relief,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn declared_default(id: &str) -> (Option<String>, Option<String>) {
        let command = Config::command();
        let arg = command.get_arguments().find(|a| a.get_id() == id).unwrap();
        let default = arg.get_default_values().first().map(|v| v.to_string_lossy().into_owned());
        let env = arg.get_env().map(|v| v.to_string_lossy().into_owned());
        (default, env)
    }

    #[test]
    fn env_backed_paths_declare_their_defaults() {
        assert_eq!(
            declared_default("data_dir"),
            (Some(".".into()), Some("WORLD_MAP_DATA_DIR".into()))
        );
        assert_eq!(
            declared_default("output"),
            (Some("world-map.svg".into()), Some("WORLD_MAP_OUTPUT".into()))
        );
    }

    #[test]
    fn defaults_reproduce_the_classic_map() {
        // Paths are explicit so WORLD_MAP_* in the environment cannot leak in.
        let config = Config::try_parse_from(["world_map", "--data-dir", ".", "--output", "world-map.svg"]).unwrap();
        let pipeline = config.pipeline();

        assert_eq!(pipeline.output, PathBuf::from("world-map.svg"));
        assert_eq!(pipeline.projection, Projection::default());
        assert_eq!(pipeline.fill, FillScheme::Continent);
        assert_eq!(pipeline.adjacency, AdjacencyStrategy::Indexed);

        let relief = pipeline.relief.unwrap();
        assert_eq!(relief.cache, PathBuf::from(".").join("ne_50m_relief.jpg"));
        assert_eq!(relief.source, PathBuf::from(".").join("NE2_50M_SR_W/NE2_50M_SR_W.tif"));
        assert_eq!(relief.width, 10_000);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "world_map",
            "--data-dir",
            "/data/ne",
            "--projection",
            "wgs84",
            "--fill",
            "graph-coloring",
            "--adjacency",
            "naive",
            "--no-relief",
        ])
        .unwrap();
        let pipeline = config.pipeline();

        assert_eq!(pipeline.data_dir, PathBuf::from("/data/ne"));
        assert_eq!(pipeline.projection, Projection::Wgs84);
        assert_eq!(pipeline.fill, FillScheme::GraphColoring);
        assert_eq!(pipeline.adjacency, AdjacencyStrategy::Naive);
        assert!(pipeline.relief.is_none());
    }

    #[test]
    fn absolute_relief_paths_are_kept() {
        let config = Config::try_parse_from(["world_map", "--relief-cache", "/tmp/relief.jpg"]).unwrap();
        assert_eq!(config.pipeline().relief.unwrap().cache, PathBuf::from("/tmp/relief.jpg"));
    }

    #[test]
    fn unknown_fill_is_rejected() {
        assert!(Config::try_parse_from(["world_map", "--fill", "rainbow"]).is_err());
    }
}
