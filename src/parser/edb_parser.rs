//! Parsers for the EDB index format

use winnow::{
    ModalResult, Parser,
    binary::{le_i16, le_u16, le_u32, u8},
    combinator::repeat,
    error::{ContextError, ErrMode},
    token::take,
};

use crate::error::DecodeError;
use crate::types::{EdbHeader, EdbIndex, EdbRecord};

/// Parses the fixed EDB header.
///
/// The header layout is three little-endian u32 values: the byte offset of
/// the file-name table, the record count, and the file count.
pub fn parse_edb_header(input: &mut &[u8]) -> ModalResult<EdbHeader> {
    let files_offset = le_u32.parse_next(input)?;
    let record_count = le_u32.parse_next(input)?;
    let file_count = le_u32.parse_next(input)?;

    Ok(EdbHeader::builder()
        .files_offset(files_offset)
        .record_count(record_count)
        .file_count(file_count)
        .build())
}

/// Parses a single 20-byte index record.
pub fn parse_edb_record(input: &mut &[u8]) -> ModalResult<EdbRecord> {
    let time_seconds = le_u32.parse_next(input)?;
    let time_fraction = le_u32.parse_next(input)?;
    let record_offset = le_u32.parse_next(input)?;
    let record_length = le_u32.parse_next(input)?;
    let file_index = le_i16.parse_next(input)?;
    let pulse_count = u8.parse_next(input)?;
    let digitizer = u8.parse_next(input)?;

    Ok(EdbRecord::builder()
        .time_seconds(time_seconds)
        .time_fraction(time_fraction)
        .record_offset(record_offset)
        .record_length(record_length)
        .file_index(file_index)
        .pulse_count(pulse_count)
        .digitizer(digitizer)
        .build())
}

/// Parses a length-prefixed string from the file-name table.
pub fn parse_pascal_string(input: &mut &[u8]) -> ModalResult<String> {
    let length = le_u16.parse_next(input)?;
    let raw = take(length as usize).parse_next(input)?;
    Ok(String::from_utf8_lossy(raw).into_owned())
}

/// Parses a complete EDB image: header, record block, file-name table.
pub fn parse_edb(input: &mut &[u8]) -> ModalResult<EdbIndex> {
    let header = parse_edb_header(input)?;
    // The file table always sits directly after the record block.
    let expected_offset = EdbHeader::SIZE + EdbRecord::SIZE * header.record_count as usize;
    if header.files_offset as usize != expected_offset {
        return Err(ErrMode::Cut(ContextError::new()));
    }
    let records: Vec<EdbRecord> =
        repeat(header.record_count as usize, parse_edb_record).parse_next(input)?;
    let files: Vec<String> =
        repeat(header.file_count as usize, parse_pascal_string).parse_next(input)?;
    Ok(EdbIndex::new(records, files))
}

/// Decode one index record from exactly [`EdbRecord::SIZE`] bytes.
pub fn decode_index_record(raw: &[u8]) -> Result<EdbRecord, DecodeError> {
    if raw.len() != EdbRecord::SIZE {
        return Err(DecodeError::MalformedRecord {
            expected: EdbRecord::SIZE,
            actual: raw.len(),
        });
    }
    let mut input = raw;
    parse_edb_record
        .parse_next(&mut input)
        .map_err(|_| DecodeError::MalformedRecord {
            expected: EdbRecord::SIZE,
            actual: raw.len(),
        })
}

/// Decode a complete EDB image.
pub fn decode_edb(raw: &[u8]) -> Result<EdbIndex, DecodeError> {
    let mut input = raw;
    parse_edb
        .parse_next(&mut input)
        .map_err(|_| DecodeError::MalformedIndex {
            reason: "header, record block, and file table do not agree",
        })
}
