//! Encoding of the binary EDB index and TLD waveform formats
//!
//! Exact inverses of the parsers in [`crate::parser`]; pure byte-buffer
//! builders with no file access.

pub mod edb_writer;
pub mod tld_writer;

pub use edb_writer::{encode_edb, encode_index_record};
pub use tld_writer::{encode_pulse, encode_rasters, encode_waveform_payload};
