use thiserror::Error;

use crate::region::RegionId;

/// Raised when a region's geometry cannot take part in a touches test.
///
/// Adjacency is never silently dropped for bad input: a missing edge would let
/// two neighbouring countries share a color.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("region {region} ({name}) has no polygon parts")]
    Empty { region: RegionId, name: String },

    #[error("region {region} ({name}): ring {ring} of part {part} has {len} coordinates, need at least 4")]
    RingTooShort {
        region: RegionId,
        name: String,
        part: usize,
        ring: usize,
        len: usize,
    },

    #[error("region {region} ({name}): part {part} contains a non-finite coordinate")]
    NonFinite {
        region: RegionId,
        name: String,
        part: usize,
    },

    #[error("region {region} ({name}): part {part} encloses zero area")]
    ZeroArea {
        region: RegionId,
        name: String,
        part: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown continent label {0:?}")]
pub struct ParseContinentError(pub String);
