//! Reading, writing, and filtering of airborne lidar waveform archives.
//!
//! An archive pairs an EDB index file with one or more TLD data files
//! holding the raw waveform records. [`Archive`] provides random access to
//! single rasters, [`Collection`] merges archives into one time-ordered
//! dataset, and [`rcf`] filters the derived point clouds with a gridded
//! consensus vote. The byte-level codecs in [`parser`] and [`writer`] are
//! pure transforms usable without any file access.

pub mod archive;
pub mod collection;
pub mod error;
pub mod parser;
pub mod rcf;
pub mod traits;
pub mod types;
pub mod utils;
pub mod writer;

pub use archive::{Archive, ArchiveOptions};
pub use collection::Collection;
pub use error::{
    ConfigError, DecodeError, FilterError, OpenError, ReadError, ResolutionError,
};
pub use rcf::{RcfConfig, RcfFilter, TieBreak, rcf_jury};
pub use types::{EdbHeader, EdbIndex, EdbRecord, Pulse, Raster, RasterEntry};
