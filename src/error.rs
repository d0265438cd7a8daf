// error.rs

use thiserror::Error;

/// Errors produced while binning, building, serializing, or querying a `.bai` index.
#[derive(Error, Debug)]
pub enum BaiError {
    #[error("invalid region: end ({end}) must be greater than start ({start})")]
    InvalidRegion { start: i64, end: i64 },

    #[error("bin {0} is out of range for the fixed six-level scheme")]
    BinOutOfRange(u32),

    #[error("record for reference {reference_index} has no file source (chunk)")]
    MissingFileSource { reference_index: i32 },

    #[error(
        "records are not coordinate sorted: reference {reference_index}, {current} followed {previous}"
    )]
    NotCoordinateSorted {
        reference_index: i32,
        previous: i32,
        current: i32,
    },

    #[error("cannot build an index over a writer that is not sorted by coordinate")]
    NotSortedByCoordinate,

    #[error("invalid .bai magic bytes")]
    InvalidMagic,

    #[error("operation attempted on a closed index")]
    ClosedIndex,

    #[error("truncated .bai: expected {expected} more bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BaiError>;
