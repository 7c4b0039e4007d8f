//! Random access to one EDB index and its referenced TLD data files

use bon::Builder;
use log::{debug, info};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{OpenError, ReadError, ResolutionError};
use crate::parser::{decode_edb, decode_waveform_payload};
use crate::types::{EdbIndex, Raster, RasterEntry};
use crate::utils::file_utils::{locate_data_file, read_binary_file_mmap};
use crate::utils::time::SECONDS_PER_DAY;

fn default_first_raster() -> u32 {
    1
}

/// Options recognized when opening an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct ArchiveOptions {
    /// Raster number assigned to the first record. Archives composed into
    /// one collection are given disjoint ranges this way.
    #[builder(default = 1)]
    #[serde(default = "default_first_raster")]
    pub first_raster_number: u32,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            first_raster_number: 1,
        }
    }
}

/// An opened waveform archive: one decoded EDB index bound to memory maps
/// of every TLD file it references.
///
/// The maps are immutable shared byte slices held for the archive's
/// lifetime, so concurrent reads need no locking; all handles are released
/// when the archive is dropped.
pub struct Archive {
    edb_path: PathBuf,
    index: EdbIndex,
    first_raster_number: u32,
    entries: Vec<RasterEntry>,
    tld_maps: Vec<Mmap>,
}

impl Archive {
    /// Open an archive with default options.
    pub fn open(
        edb_path: impl AsRef<Path>,
        tld_search_paths: &[PathBuf],
    ) -> Result<Archive, OpenError> {
        Self::open_with(edb_path, tld_search_paths, ArchiveOptions::default())
    }

    /// Open an archive from an EDB index file.
    ///
    /// The whole index is decoded up front and every referenced TLD file is
    /// located (in the index's directory, its `eaarl` subdirectory, then the
    /// given search paths) and memory-mapped. Raster numbers are assigned
    /// from record positions, starting at the configured first number.
    /// Record times must be non-decreasing apart from a single midnight
    /// wraparound; entries past the wrap are indexed a day later so the
    /// sequence stays chronological.
    pub fn open_with(
        edb_path: impl AsRef<Path>,
        tld_search_paths: &[PathBuf],
        options: ArchiveOptions,
    ) -> Result<Archive, OpenError> {
        let edb_path = edb_path.as_ref().to_path_buf();
        let raw = read_binary_file_mmap(&edb_path).map_err(|source| OpenError::IndexUnreadable {
            path: edb_path.clone(),
            source,
        })?;
        let index = decode_edb(&raw).map_err(|_| OpenError::MalformedIndex {
            path: edb_path.clone(),
            reason: "index image failed to decode",
        })?;

        let entries = Self::build_entries(&index, &edb_path, options.first_raster_number)?;

        let base_dir = edb_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let mut tld_maps = Vec::with_capacity(index.files.len());
        for name in &index.files {
            let path = locate_data_file(name, &base_dir, tld_search_paths).ok_or_else(|| {
                OpenError::MissingDataFile {
                    name: name.clone(),
                    index: edb_path.clone(),
                }
            })?;
            debug!("mapping data file {}", path.display());
            let map = read_binary_file_mmap(&path)
                .map_err(|source| OpenError::DataFileUnreadable { path, source })?;
            tld_maps.push(map);
        }

        info!(
            "opened archive {}: {} rasters across {} data files",
            edb_path.display(),
            entries.len(),
            tld_maps.len()
        );
        Ok(Archive {
            edb_path,
            index,
            first_raster_number: options.first_raster_number,
            entries,
            tld_maps,
        })
    }

    fn build_entries(
        index: &EdbIndex,
        edb_path: &Path,
        first_raster_number: u32,
    ) -> Result<Vec<RasterEntry>, OpenError> {
        let mut entries = Vec::with_capacity(index.len());
        let mut wraps = 0u32;
        let mut previous = f64::NEG_INFINITY;
        for (i, record) in index.records.iter().enumerate() {
            if index.file_name(record.file_index).is_none() {
                return Err(OpenError::MalformedIndex {
                    path: edb_path.to_path_buf(),
                    reason: "record references a file outside the file table",
                });
            }
            let time = record.time();
            if time < previous {
                wraps += 1;
                if wraps > 1 {
                    return Err(OpenError::MalformedIndex {
                        path: edb_path.to_path_buf(),
                        reason: "record times decrease more than once",
                    });
                }
            }
            previous = time;
            entries.push(RasterEntry {
                raster_number: first_raster_number + i as u32,
                time,
                time_unwrapped: time + wraps as f64 * SECONDS_PER_DAY,
                record: *record,
            });
        }
        Ok(entries)
    }

    /// Path of the EDB file this archive was opened from.
    pub fn edb_path(&self) -> &Path {
        &self.edb_path
    }

    /// The decoded index.
    pub fn index(&self) -> &EdbIndex {
        &self.index
    }

    /// Number of rasters in the archive.
    pub fn record_count(&self) -> usize {
        self.entries.len()
    }

    /// All raster entries in index order.
    pub fn entries(&self) -> &[RasterEntry] {
        &self.entries
    }

    /// Entry for a raster number, if present.
    pub fn entry(&self, raster_number: u32) -> Option<&RasterEntry> {
        if raster_number < self.first_raster_number {
            return None;
        }
        self.entries
            .get((raster_number - self.first_raster_number) as usize)
    }

    /// Resolve a raster number to its entry and raw record bytes.
    ///
    /// Performs a bounded read of exactly the declared byte range. A range
    /// extending past the data file (a truncated or corrupt archive) fails
    /// with the offending record's identity rather than returning short
    /// data.
    pub fn read_raster(
        &self,
        raster_number: u32,
    ) -> Result<(&RasterEntry, &[u8]), ResolutionError> {
        let entry = self
            .entry(raster_number)
            .ok_or(ResolutionError::RasterNotFound {
                raster: raster_number,
            })?;
        let map = &self.tld_maps[entry.record.file_index as usize - 1];
        let offset = entry.record.record_offset as usize;
        let length = entry.record.record_length as usize;
        if offset + length > map.len() {
            return Err(ResolutionError::OutOfRangeReference {
                raster: raster_number,
                file: self
                    .index
                    .file_name(entry.record.file_index)
                    .unwrap_or("?")
                    .to_string(),
                offset: offset as u64,
                length: length as u64,
                file_len: map.len() as u64,
            });
        }
        Ok((entry, &map[offset..offset + length]))
    }

    /// Resolve and decode a raster, verifying the payload against the pulse
    /// count declared by the index. The cyclic raster number from the data
    /// file is replaced with the index-assigned one.
    pub fn read_raster_decoded(
        &self,
        raster_number: u32,
    ) -> Result<(RasterEntry, Raster), ReadError> {
        let (entry, raw) = self.read_raster(raster_number)?;
        let mut raster = decode_waveform_payload(raw, entry.record.pulse_count as u16)?;
        raster.raster_number = entry.raster_number;
        Ok((*entry, raster))
    }
}
