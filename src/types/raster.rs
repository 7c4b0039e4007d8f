//! Types for raster records and their pulse waveforms

use bon::Builder;

use crate::utils::time::{TIME_FRACTION_SECONDS, scan_counts_to_degrees, time_int_to_soe};

/// Record type tag for raster records in a TLD data file. Other types are
/// opaque filler and are skipped by length when scanning.
pub const RASTER_RECORD_TYPE: u8 = 5;

/// Size of the length/type prefix on every TLD record.
pub const TLD_RECORD_HEADER_SIZE: usize = 4;

/// One channel's digitized waveform data within a raster.
///
/// Integer fields hold the exact on-disk values; fractional-second and
/// scan-angle conversions are derived views. `tx` is the transmit waveform,
/// `rx` holds up to four return channels.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct Pulse {
    /// Offset from the raster time, in fractional counts (24 bits).
    pub time_fraction: u32,
    pub bias_tx: u8,
    pub bias_rx: [u8; 4],
    pub scan_angle_counts: i16,
    /// Nanoseconds from transmit start to return start (14 bits).
    pub range: u16,
    pub thresh_tx: bool,
    pub thresh_rx: bool,
    pub tx: Vec<u8>,
    pub rx: Vec<Vec<u8>>,
}

impl Pulse {
    /// Offset from the raster time, in seconds.
    pub fn time_offset(&self) -> f64 {
        self.time_fraction as f64 * TIME_FRACTION_SECONDS
    }

    /// Scan angle in degrees.
    pub fn scan_angle(&self) -> f64 {
        scan_counts_to_degrees(self.scan_angle_counts)
    }

    /// Number of return channels carried by this pulse.
    pub fn waveform_count(&self) -> usize {
        self.rx.len()
    }
}

/// One laser-firing event: a raster of pulse waveforms.
///
/// The raster number stored in a TLD file is a cyclic hardware counter;
/// archive reads replace it with the dataset-unique number assigned by the
/// index.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct Raster {
    pub time_seconds: u32,
    pub time_fraction: u32,
    pub raster_number: u32,
    pub digitizer: u8,
    pub pulses: Vec<Pulse>,
}

impl Raster {
    /// Raster time as floating-point seconds.
    pub fn time(&self) -> f64 {
        time_int_to_soe(self.time_seconds, self.time_fraction)
    }

    /// Absolute time of a pulse, in seconds.
    pub fn pulse_time(&self, pulse: &Pulse) -> f64 {
        self.time() + pulse.time_offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_time_offset_uses_fraction_unit() {
        let pulse = Pulse::builder()
            .time_fraction(201_233)
            .bias_tx(0)
            .bias_rx([0; 4])
            .scan_angle_counts(0)
            .range(0)
            .thresh_tx(false)
            .thresh_rx(false)
            .tx(vec![])
            .rx(vec![])
            .build();
        assert!((pulse.time_offset() - 0.3219728).abs() < 1e-12);
    }

    #[test]
    fn raster_time_combines_seconds_and_fraction() {
        let raster = Raster::builder()
            .time_seconds(65_537)
            .time_fraction(65_538)
            .raster_number(1)
            .digitizer(0)
            .pulses(vec![])
            .build();
        assert!((raster.time() - 65_537.104_860_8).abs() < 1e-9);
    }
}
