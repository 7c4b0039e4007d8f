//! Decoding of the binary EDB index and TLD waveform formats
//!
//! All parsers here are pure byte-buffer transforms; file access lives in
//! the archive layer.

pub mod edb_parser;
pub mod tld_parser;

// Re-export the parsing functions
pub use edb_parser::{
    decode_edb, decode_index_record, parse_edb, parse_edb_header, parse_edb_record,
    parse_pascal_string,
};
pub use tld_parser::{decode_waveform_payload, parse_pulse, parse_raster_body, parse_rasters};
