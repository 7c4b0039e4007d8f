//! Type definitions for the EDB index and TLD waveform formats

pub mod header;
pub mod index;
pub mod raster;

// Re-export the main types for convenience
pub use header::EdbHeader;
pub use index::{EdbIndex, EdbRecord, RasterEntry};
pub use raster::{Pulse, RASTER_RECORD_TYPE, Raster, TLD_RECORD_HEADER_SIZE};
