use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Read a binary file using memory mapping for improved performance
/// This is more efficient for large files as it doesn't load the entire file into RAM
pub fn read_binary_file_mmap(path: impl AsRef<Path>) -> io::Result<Mmap> {
    let file = File::open(path)?;
    // Safety: The file is not modified while the mmap is active
    unsafe { Mmap::map(&file) }.map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// Locate a data file referenced by an index.
///
/// Candidates are checked in order: the index file's own directory, its
/// `eaarl` subdirectory (some datasets were organized that way), then each
/// search path and its `eaarl` subdirectory.
pub fn locate_data_file(name: &str, base_dir: &Path, search_paths: &[PathBuf]) -> Option<PathBuf> {
    let mut candidates = vec![base_dir.join(name), base_dir.join("eaarl").join(name)];
    for path in search_paths {
        candidates.push(path.join(name));
        candidates.push(path.join("eaarl").join(name));
    }
    candidates.into_iter().find(|c| c.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn locate_prefers_base_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.tld"), b"x").unwrap();
        let found = locate_data_file("a.tld", dir.path(), &[]).unwrap();
        assert_eq!(found, dir.path().join("a.tld"));
    }

    #[test]
    fn locate_falls_back_to_eaarl_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("eaarl")).unwrap();
        fs::write(dir.path().join("eaarl").join("a.tld"), b"x").unwrap();
        let found = locate_data_file("a.tld", dir.path(), &[]).unwrap();
        assert_eq!(found, dir.path().join("eaarl").join("a.tld"));
    }

    #[test]
    fn locate_searches_extra_paths() {
        let base = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        fs::write(other.path().join("a.tld"), b"x").unwrap();
        let paths = vec![other.path().to_path_buf()];
        let found = locate_data_file("a.tld", base.path(), &paths).unwrap();
        assert_eq!(found, other.path().join("a.tld"));
        assert!(locate_data_file("missing.tld", base.path(), &paths).is_none());
    }
}
