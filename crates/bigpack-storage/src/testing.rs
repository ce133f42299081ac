//! Archive fixture writer.
//!
//! Lays out the three archive files the way the packer and indexer do, for
//! tests and benchmarks:
//!
//! - the data file starts with a banner, records are appended after it
//! - identical content is stored once and shared between paths
//! - map entries are sorted by path fingerprint; when a path is added twice
//!   the later version wins
//! - map2 holds the first fingerprint of every 512-entry map page
//! - deleting a path sets the deleted flag on its record in place

use crate::error::Result;
use bigpack_format::{
    DATA_FILE, ENTRIES_PER_PAGE, Fingerprint, MAP_FILE, MAP2_FILE, PageEntry, RecordFlags,
    RecordPrefix, TopIndex,
};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;

/// Banner written at the start of the data file
pub const DEFAULT_BANNER: &[u8] = b"BigPack archive\n";

struct Pending {
    key: String,
    stored: Vec<u8>,
    fingerprint: Fingerprint,
    flags: RecordFlags,
}

/// The three files of an archive, in memory
#[derive(Debug, Clone, Default)]
pub struct ArchiveFiles {
    /// Data file contents
    pub data: Vec<u8>,
    /// Map file contents
    pub map: Vec<u8>,
    /// Map2 file contents
    pub map2: Vec<u8>,
    /// Record offset of every key
    pub offsets: BTreeMap<String, u64>,
}

impl ArchiveFiles {
    /// Sorted map entries
    pub fn entries(&self) -> Vec<PageEntry> {
        self.map
            .chunks_exact(bigpack_format::PAGE_ENTRY_SIZE)
            .filter_map(|chunk| PageEntry::parse(chunk).ok())
            .collect()
    }

    /// Number of map pages
    pub fn pages(&self) -> usize {
        TopIndex::from_bytes(self.map2.clone()).len()
    }

    /// Write the files into `dir` under the default names
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        std::fs::write(dir.join(DATA_FILE), &self.data)?;
        std::fs::write(dir.join(MAP_FILE), &self.map)?;
        std::fs::write(dir.join(MAP2_FILE), &self.map2)?;
        Ok(())
    }
}

/// Builds an archive from (path, payload, flags) entries
pub struct ArchiveBuilder {
    banner: Vec<u8>,
    pending: Vec<Pending>,
    deleted: Vec<String>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            banner: DEFAULT_BANNER.to_vec(),
            pending: Vec::new(),
            deleted: Vec::new(),
        }
    }

    /// Replace the data file banner
    #[must_use]
    pub fn with_banner(mut self, banner: &[u8]) -> Self {
        self.banner = banner.to_vec();
        self
    }

    /// Add an uncompressed file under the normalized key `key`
    pub fn add(&mut self, key: &str, payload: &[u8]) -> &mut Self {
        self.add_record(key, payload.to_vec(), Fingerprint::of(payload), RecordFlags::default())
    }

    /// Add a file stored raw-DEFLATE compressed.
    ///
    /// The content fingerprint is taken over the uncompressed bytes.
    pub fn add_compressed(&mut self, key: &str, payload: &[u8]) -> Result<&mut Self> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload)?;
        let stored = encoder.finish()?;
        Ok(self.add_record(
            key,
            stored,
            Fingerprint::of(payload),
            RecordFlags::new(RecordFlags::COMPRESSED),
        ))
    }

    /// Add a record with explicit stored bytes, fingerprint and flags
    pub fn add_record(
        &mut self,
        key: &str,
        stored: Vec<u8>,
        fingerprint: Fingerprint,
        flags: RecordFlags,
    ) -> &mut Self {
        self.pending.push(Pending {
            key: key.to_string(),
            stored,
            fingerprint,
            flags,
        });
        self
    }

    /// Mark the record currently mapped for `key` as deleted
    pub fn delete(&mut self, key: &str) -> &mut Self {
        self.deleted.push(key.to_string());
        self
    }

    /// Lay out the three files
    pub fn build(&self) -> Result<ArchiveFiles> {
        let mut data = self.banner.clone();
        let mut offsets = BTreeMap::new();
        let mut index: BTreeMap<Fingerprint, u64> = BTreeMap::new();
        let mut stored_at: HashMap<(Fingerprint, u8), u64> = HashMap::new();

        for pending in &self.pending {
            let dedup_key = (pending.fingerprint, pending.flags.value());
            let offset = if let Some(offset) = stored_at.get(&dedup_key) {
                *offset
            } else {
                let offset = data.len() as u64;
                let prefix =
                    RecordPrefix::new(pending.stored.len() as u64, pending.fingerprint, pending.flags)?;
                data.extend_from_slice(&prefix.to_bytes()?);
                data.extend_from_slice(&pending.stored);
                stored_at.insert(dedup_key, offset);
                offset
            };
            index.insert(Fingerprint::from_path(&pending.key), offset);
            offsets.insert(pending.key.clone(), offset);
        }

        for key in &self.deleted {
            if let Some(offset) = offsets.get(key) {
                // flags are the last prefix byte
                let flags_at = *offset as usize + bigpack_format::RECORD_PREFIX_SIZE - 1;
                data[flags_at] |= RecordFlags::DELETED;
            }
        }

        let entries: Vec<PageEntry> = index
            .into_iter()
            .map(|(fingerprint, offset)| PageEntry::new(fingerprint, offset))
            .collect();
        let mut map = Vec::with_capacity(entries.len() * bigpack_format::PAGE_ENTRY_SIZE);
        for entry in &entries {
            map.extend_from_slice(&entry.to_bytes()?);
        }
        let map2 = TopIndex::from_fingerprints(
            entries
                .chunks(ENTRIES_PER_PAGE)
                .map(|page| page[0].fingerprint),
        )
        .as_bytes()
        .to_vec();

        Ok(ArchiveFiles {
            data,
            map,
            map2,
            offsets,
        })
    }

    /// Lay out the files and write them into `dir` under the default names
    pub fn write_to(&self, dir: &Path) -> Result<ArchiveFiles> {
        let files = self.build()?;
        files.write_to(dir)?;
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_starts_after_banner() {
        let mut builder = ArchiveBuilder::new().with_banner(b"BANNER");
        builder.add("index.html", b"hello world");
        let files = builder.build().unwrap();

        assert_eq!(&files.data[..6], b"BANNER");
        assert_eq!(files.offsets["index.html"], 6);
        assert_eq!(files.data.len(), 6 + 16 + 11);
        assert_eq!(files.map.len(), 16);
        assert_eq!(files.map2, Fingerprint::from_path("index.html").as_bytes().to_vec());
    }

    #[test]
    fn test_identical_content_stored_once() {
        let mut builder = ArchiveBuilder::new();
        builder.add("a.txt", b"same");
        builder.add("b.txt", b"same");
        let files = builder.build().unwrap();

        assert_eq!(files.offsets["a.txt"], files.offsets["b.txt"]);
        assert_eq!(files.entries().len(), 2);
    }

    #[test]
    fn test_later_version_wins() {
        let mut builder = ArchiveBuilder::new();
        builder.add("page.html", b"old");
        builder.add("page.html", b"new");
        let files = builder.build().unwrap();

        let entries = files.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].offset, files.offsets["page.html"]);
        let offset = entries[0].offset as usize;
        assert_eq!(&files.data[offset + 16..offset + 19], b"new");
    }

    #[test]
    fn test_map2_every_512th_entry() {
        let mut builder = ArchiveBuilder::new();
        for i in 0..1500 {
            builder.add(&format!("file-{i}"), format!("{i}").as_bytes());
        }
        let files = builder.build().unwrap();
        let entries = files.entries();

        assert_eq!(files.pages(), 3);
        let top = TopIndex::from_bytes(files.map2.clone());
        for page in 0..3 {
            assert_eq!(
                top.page_fingerprint(page),
                Some(entries[page * ENTRIES_PER_PAGE].fingerprint)
            );
        }
        assert!(entries.windows(2).all(|w| w[0].fingerprint < w[1].fingerprint));
    }

    #[test]
    fn test_delete_sets_flag() {
        let mut builder = ArchiveBuilder::new();
        builder.add("gone.html", b"bye");
        builder.delete("gone.html");
        let files = builder.build().unwrap();

        let offset = files.offsets["gone.html"] as usize;
        let prefix = RecordPrefix::parse(&files.data[offset..]).unwrap();
        assert!(prefix.flags.is_deleted());
    }
}
