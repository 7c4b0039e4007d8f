//! Byte-exact encoding of raster records for TLD data files

use crate::types::{Pulse, RASTER_RECORD_TYPE, Raster, TLD_RECORD_HEADER_SIZE};

/// Encode the waveform block of a pulse: transmit waveform with a u8 length
/// prefix, then each return channel with a u16 length prefix.
fn encode_waveform_block(pulse: &Pulse) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.push(pulse.tx.len() as u8);
    buf.extend_from_slice(&pulse.tx);
    for rx in &pulse.rx {
        buf.extend_from_slice(&(rx.len() as u16).to_le_bytes());
        buf.extend_from_slice(rx);
    }
    buf
}

/// Encode one pulse sub-record. The waveform count is capped at four
/// channels, matching the width of the bias block.
pub fn encode_pulse(pulse: &Pulse) -> Vec<u8> {
    let waveform_count = pulse.rx.len().min(4) as u32;
    let time_offset_waveform_count = (waveform_count << 24) | (pulse.time_fraction & 0x00FF_FFFF);
    let range_thresh = (pulse.thresh_rx as u16) << 15
        | (pulse.thresh_tx as u16) << 14
        | (pulse.range & 0x3FFF);

    let block = encode_waveform_block(pulse);
    let mut buf = Vec::with_capacity(13 + 2 + block.len());
    buf.extend_from_slice(&time_offset_waveform_count.to_le_bytes());
    buf.push(pulse.bias_tx);
    buf.extend_from_slice(&pulse.bias_rx);
    buf.extend_from_slice(&pulse.scan_angle_counts.to_le_bytes());
    buf.extend_from_slice(&range_thresh.to_le_bytes());
    buf.extend_from_slice(&(block.len() as u16).to_le_bytes());
    buf.extend_from_slice(&block);
    buf
}

/// Encode a complete raster record, length/type prefix included.
///
/// The record length field is 24 bits wide; a raster that would exceed it
/// cannot be represented in the format.
pub fn encode_waveform_payload(raster: &Raster) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&raster.time_seconds.to_le_bytes());
    body.extend_from_slice(&raster.time_fraction.to_le_bytes());
    body.extend_from_slice(&raster.raster_number.to_le_bytes());
    let digitizer_pulse_count =
        (raster.digitizer as u16 & 1) << 15 | (raster.pulses.len() as u16 & 0x7FFF);
    body.extend_from_slice(&digitizer_pulse_count.to_le_bytes());
    for pulse in &raster.pulses {
        body.extend_from_slice(&encode_pulse(pulse));
    }

    let record_length = body.len() + TLD_RECORD_HEADER_SIZE;
    debug_assert!(record_length <= 0x00FF_FFFF);
    let length_type = (RASTER_RECORD_TYPE as u32) << 24 | record_length as u32 & 0x00FF_FFFF;

    let mut buf = Vec::with_capacity(record_length);
    buf.extend_from_slice(&length_type.to_le_bytes());
    buf.extend_from_slice(&body);
    buf
}

/// Encode a series of rasters as they would appear concatenated in a file.
pub fn encode_rasters(rasters: &[Raster]) -> Vec<u8> {
    rasters.iter().flat_map(encode_waveform_payload).collect()
}
