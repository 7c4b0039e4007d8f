use bon::Builder;

/// Fixed header at the start of an EDB index file.
///
/// `files_offset` locates the file-name table, which always sits directly
/// after the record block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct EdbHeader {
    pub files_offset: u32,
    pub record_count: u32,
    pub file_count: u32,
}

impl EdbHeader {
    /// Encoded size in bytes.
    pub const SIZE: usize = 12;
}
