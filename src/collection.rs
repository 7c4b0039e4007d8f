//! A unified chronological view over one or more waveform archives

use itertools::Itertools;
use log::debug;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet, hash_map::Entry};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::archive::Archive;
use crate::error::{OpenError, ReadError};
use crate::types::{Pulse, Raster, RasterEntry};

/// Position of a raster entry inside one of a collection's archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlotRef {
    archive: usize,
    index: usize,
}

/// A collection of waveform archives presented as one time-ordered dataset.
///
/// The merged index is built once at open time and is immutable afterwards,
/// so lookups may be issued from multiple threads without locking.
pub struct Collection {
    archives: Vec<Archive>,
    /// Sorted by unwrapped time, raster number as tie-break.
    by_time: Vec<SlotRef>,
    /// Sorted by raster number.
    by_number: Vec<SlotRef>,
}

impl Collection {
    /// Merge the given archives into one collection.
    ///
    /// Two archives claiming the same raster number at differing times is an
    /// error; an exact duplicate (same number and time) keeps the entry from
    /// the earlier archive in the argument list.
    pub fn open(archives: Vec<Archive>) -> Result<Collection, OpenError> {
        let mut seen: HashMap<u32, f64> = HashMap::new();
        let mut dropped: HashSet<(usize, usize)> = HashSet::new();
        for (ai, archive) in archives.iter().enumerate() {
            for (ei, entry) in archive.entries().iter().enumerate() {
                match seen.entry(entry.raster_number) {
                    Entry::Occupied(previous) => {
                        if *previous.get() != entry.time {
                            return Err(OpenError::OverlappingTime {
                                raster: entry.raster_number,
                                first: *previous.get(),
                                second: entry.time,
                            });
                        }
                        dropped.insert((ai, ei));
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(entry.time);
                    }
                }
            }
        }

        // Each archive's entries are already chronological, so a k-way merge
        // yields the global time ordering.
        let dropped = &dropped;
        let by_time: Vec<SlotRef> = archives
            .iter()
            .enumerate()
            .map(|(ai, archive)| {
                archive
                    .entries()
                    .iter()
                    .enumerate()
                    .filter(move |(ei, _)| !dropped.contains(&(ai, *ei)))
                    .map(move |(ei, entry)| {
                        (
                            entry.time_unwrapped,
                            entry.raster_number,
                            SlotRef {
                                archive: ai,
                                index: ei,
                            },
                        )
                    })
            })
            .kmerge_by(|a, b| a.0 < b.0 || (a.0 == b.0 && a.1 <= b.1))
            .map(|(_, _, slot)| slot)
            .collect();

        let mut by_number = by_time.clone();
        by_number.sort_by_key(|slot| archives[slot.archive].entries()[slot.index].raster_number);

        debug!(
            "collection opened: {} rasters from {} archives",
            by_time.len(),
            archives.len()
        );
        Ok(Collection {
            archives,
            by_time,
            by_number,
        })
    }

    /// Total number of rasters in the merged index.
    pub fn record_count(&self) -> usize {
        self.by_time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_time.is_empty()
    }

    fn entry(&self, slot: SlotRef) -> &RasterEntry {
        &self.archives[slot.archive].entries()[slot.index]
    }

    fn decode_slot(&self, slot: SlotRef) -> Result<(RasterEntry, Raster), ReadError> {
        let entry = self.entry(slot);
        self.archives[slot.archive].read_raster_decoded(entry.raster_number)
    }

    fn slots_by_time(&self, start: f64, stop: f64) -> &[SlotRef] {
        let lo = self
            .by_time
            .partition_point(|&slot| self.entry(slot).time_unwrapped < start);
        let hi = self
            .by_time
            .partition_point(|&slot| self.entry(slot).time_unwrapped <= stop);
        &self.by_time[lo.min(hi)..hi]
    }

    fn slots_by_number(&self, start: u32, count: usize) -> &[SlotRef] {
        let lo = self
            .by_number
            .partition_point(|&slot| self.entry(slot).raster_number < start);
        let hi = (lo + count).min(self.by_number.len());
        &self.by_number[lo..hi]
    }

    /// Retrieve and decode up to `count` rasters starting at the first
    /// raster number >= `start`, in ascending number order. A count beyond
    /// the available records is clamped, not an error.
    pub fn get_rasters_by_number(
        &self,
        start: u32,
        count: usize,
    ) -> Result<Vec<(RasterEntry, Raster)>, ReadError> {
        self.slots_by_number(start, count)
            .par_iter()
            .map(|&slot| self.decode_slot(slot))
            .collect()
    }

    /// Retrieve and decode all rasters with start <= time <= stop.
    ///
    /// Times are compared on the unwrapped axis, so ranges past 86400
    /// address records recorded after a midnight wraparound. An empty range
    /// yields an empty vector, not an error.
    pub fn get_rasters_by_time(
        &self,
        start: f64,
        stop: f64,
    ) -> Result<Vec<(RasterEntry, Raster)>, ReadError> {
        self.slots_by_time(start, stop)
            .par_iter()
            .map(|&slot| self.decode_slot(slot))
            .collect()
    }

    /// Cancellable form of [`get_rasters_by_time`]: the flag is checked
    /// between rasters and a raised flag aborts the scan with
    /// [`ReadError::Cancelled`].
    ///
    /// [`get_rasters_by_time`]: Collection::get_rasters_by_time
    pub fn get_rasters_by_time_with(
        &self,
        start: f64,
        stop: f64,
        cancel: &AtomicBool,
    ) -> Result<Vec<(RasterEntry, Raster)>, ReadError> {
        let slots = self.slots_by_time(start, stop);
        let mut results = Vec::with_capacity(slots.len());
        for &slot in slots {
            if cancel.load(Ordering::Relaxed) {
                return Err(ReadError::Cancelled);
            }
            results.push(self.decode_slot(slot)?);
        }
        Ok(results)
    }

    /// Entry of the nearest raster at or before the given time, raster
    /// number ascending as the tie-break among equal times. `None` on an
    /// empty collection or a time before the first record.
    pub fn lookup_raster_by_time(&self, seconds: f64) -> Option<&RasterEntry> {
        let idx = self
            .by_time
            .partition_point(|&slot| self.entry(slot).time_unwrapped <= seconds);
        if idx == 0 {
            return None;
        }
        let mut best = idx - 1;
        let time = self.entry(self.by_time[best]).time_unwrapped;
        while best > 0 && self.entry(self.by_time[best - 1]).time_unwrapped == time {
            best -= 1;
        }
        Some(self.entry(self.by_time[best]))
    }
}

/// One pulse flattened out of its raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseRef<'a> {
    pub raster_number: u32,
    /// 1-based position of the pulse within its raster.
    pub pulse_number: usize,
    pub pulse: &'a Pulse,
}

/// One return channel flattened out of its pulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformRef<'a> {
    pub raster_number: u32,
    pub pulse_number: usize,
    /// 1-based channel number.
    pub channel: usize,
    pub bias: u8,
    pub samples: &'a [u8],
}

/// Flatten a sequence of rasters to a sequence of pulses.
pub fn rasters_to_pulses(rasters: &[Raster]) -> Vec<PulseRef<'_>> {
    rasters
        .iter()
        .flat_map(|raster| {
            raster.pulses.iter().enumerate().map(|(i, pulse)| PulseRef {
                raster_number: raster.raster_number,
                pulse_number: i + 1,
                pulse,
            })
        })
        .collect()
}

/// Flatten a sequence of pulses to their per-channel waveforms.
pub fn pulses_to_waveforms<'a>(pulses: &[PulseRef<'a>]) -> Vec<WaveformRef<'a>> {
    pulses
        .iter()
        .flat_map(|p| {
            p.pulse.rx.iter().enumerate().map(|(i, samples)| WaveformRef {
                raster_number: p.raster_number,
                pulse_number: p.pulse_number,
                channel: i + 1,
                bias: p.pulse.bias_rx[i],
                samples,
            })
        })
        .collect()
}

/// Flip the tx and rx waveforms in place.
///
/// Raw waveforms are inverted: high sample values indicate a low response.
/// Flipping makes low responses low and high responses high.
pub fn waveforms_flip(rasters: &mut [Raster]) {
    for raster in rasters {
        for pulse in &mut raster.pulses {
            for sample in &mut pulse.tx {
                *sample = 255 - *sample;
            }
            for rx in &mut pulse.rx {
                for sample in rx {
                    *sample = 255 - *sample;
                }
            }
        }
    }
}

/// Clean up transmit waveforms in place by overwriting samples from the
/// 1-based position `pos` onward with each waveform's first sample value.
pub fn tx_clean(rasters: &mut [Raster], pos: usize) {
    for raster in rasters {
        for pulse in &mut raster.pulses {
            if pulse.tx.is_empty() || pos < 1 {
                continue;
            }
            let first = pulse.tx[0];
            for sample in pulse.tx.iter_mut().skip(pos - 1) {
                *sample = first;
            }
        }
    }
}
