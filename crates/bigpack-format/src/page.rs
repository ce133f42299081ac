//! Map file pages (secondary index)
//!
//! The map file is a sorted run of 16-byte entries:
//!
//! ```text
//! [fingerprint: 10 bytes][data offset: 6 bytes, little-endian]
//! ```
//!
//! It is read in fixed 8 KiB pages of 512 entries. A page read near the end
//! of the file may be short; only whole entries are searched.

use crate::error::{FormatError, FormatResult};
use crate::fingerprint::{FINGERPRINT_SIZE, Fingerprint};
use crate::le::{self, U48_SIZE};
use crate::search::bisect;
use binrw::{BinRead, BinReaderExt, BinResult, BinWrite, BinWriterExt, Endian};
use std::io::Cursor;

/// Size of one map page in bytes
pub const PAGE_SIZE: usize = 8192;

/// Size of one map entry in bytes
pub const PAGE_ENTRY_SIZE: usize = FINGERPRINT_SIZE + U48_SIZE;

/// Number of entries in a full page
pub const ENTRIES_PER_PAGE: usize = PAGE_SIZE / PAGE_ENTRY_SIZE;

/// Byte offset of a page within the map file
pub fn page_offset(page_index: usize) -> u64 {
    page_index as u64 * PAGE_SIZE as u64
}

/// Custom binrw parser for the 6-byte data offset
fn parse_offset<R: std::io::Read + std::io::Seek>(
    reader: &mut R,
    _endian: Endian,
    _args: (),
) -> BinResult<u64> {
    let bytes: [u8; U48_SIZE] = reader.read_le()?;
    Ok(le::read_u48(bytes))
}

/// Custom binrw writer for the 6-byte data offset
fn write_offset<W: std::io::Write + std::io::Seek>(
    offset: &u64,
    writer: &mut W,
    _endian: Endian,
    _args: (),
) -> BinResult<()> {
    let bytes = le::write_u48(*offset).map_err(|e| binrw::Error::AssertFail {
        pos: 0,
        message: e.to_string(),
    })?;
    writer.write_le(&bytes)?;
    Ok(())
}

/// One map entry: path fingerprint and the record offset in the data file
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct PageEntry {
    /// Path fingerprint
    pub fingerprint: Fingerprint,
    /// Record offset in the data file (48 bits)
    #[br(parse_with = parse_offset)]
    #[bw(write_with = write_offset)]
    pub offset: u64,
}

impl PageEntry {
    /// Create a new entry
    pub const fn new(fingerprint: Fingerprint, offset: u64) -> Self {
        Self {
            fingerprint,
            offset,
        }
    }

    /// Decode an entry from the front of `bytes`
    pub fn parse(bytes: &[u8]) -> FormatResult<Self> {
        if bytes.len() < PAGE_ENTRY_SIZE {
            return Err(FormatError::TooShort {
                what: "map entry",
                needed: PAGE_ENTRY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut cursor = Cursor::new(&bytes[..PAGE_ENTRY_SIZE]);
        Ok(cursor.read_le()?)
    }

    /// Encode the entry
    pub fn to_bytes(&self) -> FormatResult<[u8; PAGE_ENTRY_SIZE]> {
        let mut out = [0u8; PAGE_ENTRY_SIZE];
        let mut cursor = Cursor::new(&mut out[..]);
        cursor.write_le(self)?;
        Ok(out)
    }
}

/// One page of the map file, as read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPage {
    data: Vec<u8>,
    count: usize,
}

impl IndexPage {
    /// Wrap raw page bytes
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let count = data.len() / PAGE_ENTRY_SIZE;
        Self { data, count }
    }

    /// Number of whole entries in the page
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Whether the page holds no whole entry
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Raw page bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The first 10 bytes of the page, read as a fingerprint.
    ///
    /// This is what the top index records for the page. `None` when the page
    /// read came back shorter than one fingerprint.
    pub fn first_fingerprint(&self) -> Option<Fingerprint> {
        Fingerprint::from_slice(&self.data)
    }

    fn key_at(&self, index: usize) -> &[u8] {
        let start = index * PAGE_ENTRY_SIZE;
        &self.data[start..start + FINGERPRINT_SIZE]
    }

    /// Decode the entry at `index`
    pub fn entry(&self, index: usize) -> Option<PageEntry> {
        if index >= self.count {
            return None;
        }
        let start = index * PAGE_ENTRY_SIZE;
        PageEntry::parse(&self.data[start..start + PAGE_ENTRY_SIZE]).ok()
    }

    /// Iterate over all whole entries
    pub fn entries(&self) -> impl Iterator<Item = PageEntry> + '_ {
        (0..self.count).filter_map(|i| self.entry(i))
    }

    /// Exact search for `fingerprint`, returning its data offset
    pub fn offset_of(&self, fingerprint: &Fingerprint) -> Option<u64> {
        let key = fingerprint.as_bytes().as_slice();
        bisect(self.count, |pos| key.cmp(self.key_at(pos)))
            .exact()
            .and_then(|pos| self.entry(pos))
            .map(|entry| entry.offset)
    }
}
