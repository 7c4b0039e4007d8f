//! Byte-exact encoding of the EDB index format

use crate::types::{EdbIndex, EdbRecord};

/// Encode one index record into its fixed 20-byte form.
pub fn encode_index_record(record: &EdbRecord) -> [u8; EdbRecord::SIZE] {
    let mut buf = [0u8; EdbRecord::SIZE];
    buf[0..4].copy_from_slice(&record.time_seconds.to_le_bytes());
    buf[4..8].copy_from_slice(&record.time_fraction.to_le_bytes());
    buf[8..12].copy_from_slice(&record.record_offset.to_le_bytes());
    buf[12..16].copy_from_slice(&record.record_length.to_le_bytes());
    buf[16..18].copy_from_slice(&record.file_index.to_le_bytes());
    buf[18] = record.pulse_count;
    buf[19] = record.digitizer;
    buf
}

/// Encode a complete EDB image: header, record block, file-name table.
pub fn encode_edb(index: &EdbIndex) -> Vec<u8> {
    let header = index.header();
    let mut buf = Vec::with_capacity(header.files_offset as usize);
    buf.extend_from_slice(&header.files_offset.to_le_bytes());
    buf.extend_from_slice(&header.record_count.to_le_bytes());
    buf.extend_from_slice(&header.file_count.to_le_bytes());
    for record in &index.records {
        buf.extend_from_slice(&encode_index_record(record));
    }
    for name in &index.files {
        buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::edb_parser::tests::sample_edb_bytes;
    use crate::parser::{decode_edb, decode_index_record};

    #[test]
    fn encodes_byte_identical_image() {
        let raw = sample_edb_bytes();
        let index = decode_edb(&raw).unwrap();
        assert_eq!(encode_edb(&index), raw);
    }

    #[test]
    fn single_record_round_trips() {
        let record = EdbRecord::builder()
            .time_seconds(86_390)
            .time_fraction(12_345)
            .record_offset(1024)
            .record_length(64)
            .file_index(2)
            .pulse_count(3)
            .digitizer(1)
            .build();
        let encoded = encode_index_record(&record);
        assert_eq!(decode_index_record(&encoded).unwrap(), record);
    }

    #[test]
    fn from_named_index_encodes_and_decodes() {
        let record = EdbRecord::builder()
            .time_seconds(10)
            .time_fraction(0)
            .record_offset(0)
            .record_length(63)
            .file_index(0)
            .pulse_count(2)
            .digitizer(0)
            .build();
        let index = EdbIndex::from_named(vec![
            (record, "b.tld".to_string()),
            (record, "a.tld".to_string()),
        ]);
        let decoded = decode_edb(&encode_edb(&index)).unwrap();
        assert_eq!(decoded, index);
        assert_eq!(decoded.file_name(decoded.records[0].file_index), Some("b.tld"));
    }
}
