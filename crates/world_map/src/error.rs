use std::path::PathBuf;

use mapcolor::GeometryError;
use thiserror::Error;

/// Anything that stops a render. Every variant is fatal; nothing is retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing input {what}: nothing usable at {}", path.display())]
    MissingInput { what: String, path: PathBuf },

    #[error("shapefile: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("dBase table: {0}")]
    Dbase(#[from] shapefile::dbase::Error),

    #[error("GeoJSON: {0}")]
    GeoJson(#[from] serde_json::Error),

    #[error("zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("relief raster: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{dataset}: record {index}: {reason}")]
    InvalidRecord {
        dataset: String,
        index: usize,
        reason: String,
    },

    #[error("{dataset}: region {name:?} has unknown continent {value:?}")]
    UnknownContinent {
        dataset: String,
        name: String,
        value: String,
    },

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl PipelineError {
    pub(crate) fn invalid(dataset: &str, index: usize, reason: impl Into<String>) -> Self {
        PipelineError::InvalidRecord {
            dataset: dataset.to_owned(),
            index,
            reason: reason.into(),
        }
    }
}
