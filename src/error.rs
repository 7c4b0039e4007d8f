//! Error types for archive, codec, collection, and filter operations

use std::io;
use std::path::PathBuf;

/// Errors produced while decoding EDB or TLD byte buffers.
///
/// Decode failures are always recoverable by the caller; they identify
/// malformed input rather than aborting the process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed index record: expected {expected} bytes, got {actual}")]
    MalformedRecord { expected: usize, actual: usize },
    #[error("malformed index image: {reason}")]
    MalformedIndex { reason: &'static str },
    #[error("truncated waveform payload while reading {section}")]
    TruncatedPayload { section: &'static str },
    #[error("pulse count mismatch: index declares {declared}, payload holds {decoded}")]
    PulseCountMismatch { declared: u16, decoded: usize },
    #[error("unexpected record type {found} (expected raster record)")]
    UnexpectedRecordType { found: u8 },
}

/// Errors produced while opening an archive or a collection.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("unable to read index file {path}: {source}")]
    IndexUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("index file {path} is malformed: {reason}")]
    MalformedIndex { path: PathBuf, reason: &'static str },
    #[error("data file {name} referenced by {index} was not found")]
    MissingDataFile { name: String, index: PathBuf },
    #[error("unable to read data file {path}: {source}")]
    DataFileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "raster {raster} appears in multiple archives with differing times \
         ({first} vs {second})"
    )]
    OverlappingTime { raster: u32, first: f64, second: f64 },
}

/// Errors produced while resolving an index record to waveform bytes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolutionError {
    #[error("raster {raster} not found")]
    RasterNotFound { raster: u32 },
    #[error(
        "raster {raster}: declared byte range {offset}+{length} in {file} \
         exceeds the file's {file_len} bytes"
    )]
    OutOfRangeReference {
        raster: u32,
        file: String,
        offset: u64,
        length: u64,
        file_len: u64,
    },
}

/// Errors produced by collection reads that resolve and decode rasters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("scan cancelled")]
    Cancelled,
}

/// Invalid consensus-filter parameters, rejected before any points are
/// processed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("cell_size must be positive, got {0}")]
    NonPositiveCellSize(f64),
    #[error("win_width must be positive, got {0}")]
    NonPositiveWinWidth(f64),
    #[error("min_jury must be at least 1")]
    ZeroMinJury,
}

/// Errors produced while running the consensus filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("coordinate arrays differ in length: x={x}, y={y}, z={z}")]
    LengthMismatch { x: usize, y: usize, z: usize },
    #[error("filter cancelled")]
    Cancelled,
}
