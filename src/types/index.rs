//! Index records mapping rasters to byte ranges in waveform data files

use bon::Builder;
use itertools::Itertools;

use crate::types::header::EdbHeader;
use crate::utils::time::time_int_to_soe;

/// One fixed-width record in an EDB index file.
///
/// `file_index` is 1-based into the index's file-name table. Time is stored
/// exactly as on disk: integer seconds plus an integer fractional count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct EdbRecord {
    pub time_seconds: u32,
    pub time_fraction: u32,
    pub record_offset: u32,
    pub record_length: u32,
    pub file_index: i16,
    pub pulse_count: u8,
    pub digitizer: u8,
}

impl EdbRecord {
    /// Encoded size in bytes.
    pub const SIZE: usize = 20;

    /// Record time as floating-point seconds.
    pub fn time(&self) -> f64 {
        time_int_to_soe(self.time_seconds, self.time_fraction)
    }
}

/// A fully decoded EDB index: the record block plus the file-name table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdbIndex {
    pub records: Vec<EdbRecord>,
    pub files: Vec<String>,
}

impl EdbIndex {
    pub fn new(records: Vec<EdbRecord>, files: Vec<String>) -> Self {
        Self { records, files }
    }

    /// Build an index from records paired with the name of the data file
    /// each one references. The file table is the sorted set of unique
    /// names and each record's `file_index` is rewritten to match.
    pub fn from_named(records: Vec<(EdbRecord, String)>) -> Self {
        let files: Vec<String> = records
            .iter()
            .map(|(_, name)| name.clone())
            .sorted()
            .dedup()
            .collect();
        let records = records
            .into_iter()
            .map(|(mut record, name)| {
                let position = files
                    .iter()
                    .position(|f| *f == name)
                    .expect("name present in file table");
                record.file_index = position as i16 + 1;
                record
            })
            .collect();
        Self { records, files }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve a record's 1-based `file_index` to a file name.
    pub fn file_name(&self, file_index: i16) -> Option<&str> {
        if file_index < 1 {
            return None;
        }
        self.files.get(file_index as usize - 1).map(String::as_str)
    }

    /// Header describing this index when encoded.
    pub fn header(&self) -> EdbHeader {
        EdbHeader::builder()
            .files_offset((EdbHeader::SIZE + EdbRecord::SIZE * self.records.len()) as u32)
            .record_count(self.records.len() as u32)
            .file_count(self.files.len() as u32)
            .build()
    }
}

/// One raster's entry in an opened archive: the index record plus the
/// raster number assigned from its position in the EDB file and the
/// wrap-corrected time used for chronological ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterEntry {
    pub raster_number: u32,
    /// Seconds as stored in the index record.
    pub time: f64,
    /// Seconds with a day's worth added for records past the midnight
    /// wraparound, so the sequence is monotonic.
    pub time_unwrapped: f64,
    pub record: EdbRecord,
}
