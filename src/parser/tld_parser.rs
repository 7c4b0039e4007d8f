//! Parsers for raster records in TLD data files

use winnow::{
    ModalResult, Parser,
    binary::{le_i16, le_u16, le_u32, u8},
    combinator::repeat,
    token::take,
};

use crate::error::DecodeError;
use crate::types::{Pulse, RASTER_RECORD_TYPE, Raster, TLD_RECORD_HEADER_SIZE};

/// Parses a record's length/type prefix into (type, total record length).
fn parse_record_header(input: &mut &[u8]) -> ModalResult<(u8, usize)> {
    let length_type = le_u32.parse_next(input)?;
    Ok((
        (length_type >> 24) as u8,
        (length_type & 0x00FF_FFFF) as usize,
    ))
}

/// Parses one return-channel waveform: a u16 sample count followed by the
/// samples.
fn parse_rx_waveform(input: &mut &[u8]) -> ModalResult<Vec<u8>> {
    let length = le_u16.parse_next(input)?;
    let raw = take(length as usize).parse_next(input)?;
    Ok(raw.to_vec())
}

/// Parses a single pulse sub-record.
///
/// The 13-byte pulse header packs the waveform count into the top byte of
/// the time-offset word and the threshold flags into the top bits of the
/// range word. It is followed by a u16 length and the waveform block: a u8
/// transmit length plus samples, then one length-prefixed waveform per
/// return channel.
pub fn parse_pulse(input: &mut &[u8]) -> ModalResult<Pulse> {
    let time_offset_waveform_count = le_u32.parse_next(input)?;
    let waveform_count = (time_offset_waveform_count >> 24) as usize;
    let time_fraction = time_offset_waveform_count & 0x00FF_FFFF;
    let bias_tx = u8.parse_next(input)?;
    let bias_rx: [u8; 4] = take(4usize)
        .parse_next(input)?
        .try_into()
        .expect("bias block is 4 bytes");
    let scan_angle_counts = le_i16.parse_next(input)?;
    let range_thresh = le_u16.parse_next(input)?;
    let data_length = le_u16.parse_next(input)?;

    let mut block = take(data_length as usize).parse_next(input)?;
    let tx_length = u8.parse_next(&mut block)?;
    let tx = take(tx_length as usize).parse_next(&mut block)?.to_vec();
    let rx: Vec<Vec<u8>> = repeat(waveform_count, parse_rx_waveform).parse_next(&mut block)?;

    Ok(Pulse::builder()
        .time_fraction(time_fraction)
        .bias_tx(bias_tx)
        .bias_rx(bias_rx)
        .scan_angle_counts(scan_angle_counts)
        .range(range_thresh & 0x3FFF)
        .thresh_tx(range_thresh >> 14 & 1 == 1)
        .thresh_rx(range_thresh >> 15 & 1 == 1)
        .tx(tx)
        .rx(rx)
        .build())
}

/// Parses a raster record body (everything after the length/type prefix).
pub fn parse_raster_body(input: &mut &[u8]) -> ModalResult<Raster> {
    let time_seconds = le_u32.parse_next(input)?;
    let time_fraction = le_u32.parse_next(input)?;
    let raster_number = le_u32.parse_next(input)?;
    let digitizer_pulse_count = le_u16.parse_next(input)?;
    let pulse_count = (digitizer_pulse_count & 0x7FFF) as usize;
    let pulses: Vec<Pulse> = repeat(pulse_count, parse_pulse).parse_next(input)?;

    Ok(Raster::builder()
        .time_seconds(time_seconds)
        .time_fraction(time_fraction)
        .raster_number(raster_number)
        .digitizer((digitizer_pulse_count >> 15) as u8)
        .pulses(pulses)
        .build())
}

/// Parses consecutive records from a TLD buffer until `count` rasters have
/// been collected. Records of other types are skipped by their declared
/// length.
pub fn parse_rasters(input: &mut &[u8], count: usize) -> ModalResult<Vec<Raster>> {
    let mut rasters = Vec::with_capacity(count);
    while rasters.len() < count {
        let (record_type, record_length) = parse_record_header(input)?;
        let body_length = record_length.saturating_sub(TLD_RECORD_HEADER_SIZE);
        let mut body = take(body_length).parse_next(input)?;
        if record_type != RASTER_RECORD_TYPE {
            continue;
        }
        rasters.push(parse_raster_body(&mut body)?);
    }
    Ok(rasters)
}

/// Decode one raster record and verify it against the pulse count declared
/// by its index record.
///
/// The buffer must hold the complete record, length/type prefix included;
/// trailing padding inside the declared record length is ignored.
pub fn decode_waveform_payload(raw: &[u8], pulse_count: u16) -> Result<Raster, DecodeError> {
    let mut input = raw;
    let (record_type, _) =
        parse_record_header(&mut input).map_err(|_| DecodeError::TruncatedPayload {
            section: "record header",
        })?;
    if record_type != RASTER_RECORD_TYPE {
        return Err(DecodeError::UnexpectedRecordType { found: record_type });
    }
    let raster =
        parse_raster_body(&mut input).map_err(|_| DecodeError::TruncatedPayload {
            section: "raster body",
        })?;
    if raster.pulses.len() != pulse_count as usize {
        return Err(DecodeError::PulseCountMismatch {
            declared: pulse_count,
            decoded: raster.pulses.len(),
        });
    }
    Ok(raster)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two-pulse raster record, one return channel per pulse.
    pub(crate) fn sample_record_one() -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&[0x3F, 0x00, 0x00]); // length
        raw.push(0x05); // type

        raw.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]); // time_seconds
        raw.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // time_fraction
        raw.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // raster number
        raw.extend_from_slice(&[0x02, 0x00]); // bitfield: pulse count, digitizer

        // pulse 0
        raw.extend_from_slice(&[0x11, 0x12, 0x03]); // offset time
        raw.push(0x01); // waveform count
        raw.push(0x00); // transmit bias
        raw.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // return biases
        raw.extend_from_slice(&[0x00, 0x00]); // scan angle counts
        raw.extend_from_slice(&[0x00, 0x00]); // bitfield: range, flags
        raw.extend_from_slice(&[0x08, 0x00]); // data length
        raw.push(0x02); // tx length
        raw.extend_from_slice(&[0x30, 0x31]); // tx waveform
        raw.extend_from_slice(&[0x03, 0x00]); // rx 0 len
        raw.extend_from_slice(&[0x40, 0x41, 0x42]); // rx 0 waveform

        // pulse 1
        raw.extend_from_slice(&[0x21, 0x22, 0x03]);
        raw.push(0x01);
        raw.push(0x00);
        raw.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        raw.extend_from_slice(&[0x00, 0x00]);
        raw.extend_from_slice(&[0x00, 0x00]);
        raw.extend_from_slice(&[0x07, 0x00]);
        raw.push(0x02);
        raw.extend_from_slice(&[0x52, 0x52]);
        raw.extend_from_slice(&[0x02, 0x00]);
        raw.extend_from_slice(&[0x61, 0x62]);
        raw
    }

    /// Single-pulse raster record with four return channels.
    pub(crate) fn sample_record_two() -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&[0x38, 0x00, 0x00]);
        raw.push(0x05);

        raw.extend_from_slice(&[0x11, 0x12, 0x13, 0x14]);
        raw.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        raw.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        raw.extend_from_slice(&[0x01, 0x00]);

        raw.extend_from_slice(&[0x11, 0x12, 0x03]);
        raw.push(0x04); // waveform count
        raw.push(0x00);
        raw.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        raw.extend_from_slice(&[0x00, 0x00]);
        raw.extend_from_slice(&[0x00, 0x00]);
        raw.extend_from_slice(&[0x17, 0x00]);
        raw.push(0x02);
        raw.extend_from_slice(&[0x30, 0x31]);
        raw.extend_from_slice(&[0x03, 0x00]);
        raw.extend_from_slice(&[0x40, 0x41, 0x42]);
        raw.extend_from_slice(&[0x03, 0x00]);
        raw.extend_from_slice(&[0x60, 0x61, 0x62]);
        raw.extend_from_slice(&[0x03, 0x00]);
        raw.extend_from_slice(&[0x70, 0x71, 0x72]);
        raw.extend_from_slice(&[0x03, 0x00]);
        raw.extend_from_slice(&[0x80, 0x81, 0x82]);
        raw
    }

    #[test]
    fn decodes_pulses_and_waveforms() {
        let raster = decode_waveform_payload(&sample_record_one(), 2).unwrap();

        assert_eq!(raster.time_seconds, 67_305_985);
        assert_eq!(raster.digitizer, 0);
        assert_eq!(raster.pulses.len(), 2);

        let first = &raster.pulses[0];
        assert_eq!(first.time_fraction, 0x031211);
        assert!((first.time_offset() - 0.321_972_8).abs() < 1e-9);
        assert_eq!(first.tx, vec![0x30, 0x31]);
        assert_eq!(first.rx, vec![vec![0x40, 0x41, 0x42]]);

        let second = &raster.pulses[1];
        assert_eq!(second.tx, vec![0x52, 0x52]);
        assert_eq!(second.rx, vec![vec![0x61, 0x62]]);
    }

    #[test]
    fn decodes_multi_channel_pulse() {
        let raster = decode_waveform_payload(&sample_record_two(), 1).unwrap();
        let pulse = &raster.pulses[0];
        assert_eq!(pulse.waveform_count(), 4);
        assert_eq!(pulse.rx[3], vec![0x80, 0x81, 0x82]);
    }

    #[test]
    fn truncated_record_fails_loudly() {
        let raw = sample_record_one();
        let err = decode_waveform_payload(&raw[..raw.len() - 1], 2).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedPayload {
                section: "raster body"
            }
        );

        let err = decode_waveform_payload(&raw[..3], 2).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedPayload {
                section: "record header"
            }
        );
    }

    #[test]
    fn pulse_count_mismatch_is_reported() {
        let err = decode_waveform_payload(&sample_record_one(), 3).unwrap_err();
        assert_eq!(
            err,
            DecodeError::PulseCountMismatch {
                declared: 3,
                decoded: 2
            }
        );
    }

    #[test]
    fn non_raster_record_type_is_reported() {
        let mut raw = sample_record_one();
        raw[3] = 0x07;
        assert_eq!(
            decode_waveform_payload(&raw, 2).unwrap_err(),
            DecodeError::UnexpectedRecordType { found: 7 }
        );
    }

    #[test]
    fn sequential_scan_reads_consecutive_records() {
        let mut raw = sample_record_one();
        raw.extend_from_slice(&sample_record_two());
        let mut input = raw.as_slice();
        let rasters = parse_rasters(&mut input, 2).unwrap();
        assert_eq!(rasters.len(), 2);
        assert_eq!(rasters[0].pulses.len(), 2);
        assert_eq!(rasters[1].pulses.len(), 1);
    }

    #[test]
    fn sequential_scan_tolerates_record_padding() {
        // Inflate the first record's declared length to cover garbage bytes
        // appended after its pulses.
        let mut first = sample_record_one();
        first[0] += 4;
        first.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        let mut raw = first;
        raw.extend_from_slice(&sample_record_two());

        let mut input = raw.as_slice();
        let rasters = parse_rasters(&mut input, 2).unwrap();
        assert_eq!(rasters.len(), 2);
        assert_eq!(rasters[0].pulses[1].rx, vec![vec![0x61, 0x62]]);
        assert_eq!(rasters[1].pulses[0].waveform_count(), 4);
    }

    #[test]
    fn sequential_scan_skips_non_raster_records() {
        let mut raw = Vec::new();
        // An 8-byte type-3 filler record.
        raw.extend_from_slice(&[0x08, 0x00, 0x00, 0x03]);
        raw.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        raw.extend_from_slice(&sample_record_one());

        let mut input = raw.as_slice();
        let rasters = parse_rasters(&mut input, 1).unwrap();
        assert_eq!(rasters.len(), 1);
        assert_eq!(rasters[0].pulses.len(), 2);
    }
}
