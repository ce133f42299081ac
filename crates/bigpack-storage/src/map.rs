//! Loading the two index files

use crate::error::{Result, StorageError};
use crate::slice::read_slice;
use bigpack_format::page::page_offset;
use bigpack_format::{IndexPage, PAGE_SIZE, TopIndex};
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Load the whole map2 file into memory.
///
/// # Errors
///
/// Returns `StorageError::IndexLoad` if the file cannot be read.
pub fn load_top_index(path: &Path) -> Result<TopIndex> {
    let data = std::fs::read(path).map_err(|e| StorageError::index_load(path, e))?;
    let top = TopIndex::from_bytes(data);
    if top.trailing_bytes() != 0 {
        warn!(
            "{} has {} trailing bytes, ignoring partial entry",
            path.display(),
            top.trailing_bytes()
        );
    }
    if top.is_empty() {
        warn!("{} holds no pages, every lookup will miss", path.display());
    }
    debug!("Loaded top index {:?}: {} pages", path, top.len());
    Ok(top)
}

/// Read one 8 KiB page of the map file.
///
/// A page past the end of the file comes back empty and a final page may be
/// short; neither is an error here; the top-index check rejects them.
///
/// # Errors
///
/// Returns `StorageError::Io` if the file cannot be opened or read.
pub fn load_page(path: &Path, page_index: usize) -> Result<IndexPage> {
    let mut file = File::open(path)?;
    let data = read_slice(&mut file, page_offset(page_index), PAGE_SIZE)?;
    Ok(IndexPage::from_bytes(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigpack_format::{Fingerprint, PageEntry};
    use tempfile::TempDir;

    #[test]
    fn test_load_top_index_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_top_index(&dir.path().join("BigPack.map2")).unwrap_err();
        assert!(matches!(err, StorageError::IndexLoad { .. }));
    }

    #[test]
    fn test_load_top_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("BigPack.map2");
        let mut data = vec![1u8; 10];
        data.extend_from_slice(&[2u8; 10]);
        data.push(9);
        std::fs::write(&path, data).unwrap();

        let top = load_top_index(&path).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top.page_fingerprint(1), Some(Fingerprint::from_bytes([2; 10])));
    }

    #[test]
    fn test_load_page_full_short_and_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("BigPack.map");
        let mut data = Vec::new();
        for i in 0..600u16 {
            let [hi, lo] = i.to_be_bytes();
            let fingerprint = Fingerprint::from_bytes([hi, lo, 0, 0, 0, 0, 0, 0, 0, 0]);
            let entry = PageEntry::new(fingerprint, u64::from(i) + 64);
            data.extend_from_slice(&entry.to_bytes().unwrap());
        }
        std::fs::write(&path, data).unwrap();

        let first = load_page(&path, 0).unwrap();
        assert_eq!(first.len(), 512);
        let second = load_page(&path, 1).unwrap();
        assert_eq!(second.len(), 88);
        assert_eq!(second.entry(0).map(|e| e.offset), Some(512 + 64));
        assert!(load_page(&path, 2).unwrap().is_empty());
    }

    #[test]
    fn test_load_page_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_page(&dir.path().join("nope"), 0),
            Err(StorageError::Io(_))
        ));
    }
}
