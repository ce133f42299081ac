//! Reading records from the data file
//!
//! A record is read in at most two steps. The first read fetches a fixed
//! 16 KiB window, which holds the prefix and, for most files, the whole
//! payload. Larger payloads take one more read sized exactly to the
//! remainder.

use crate::error::{Result, StorageError};
use crate::slice::{read_slice, read_up_to};
use bigpack_format::le::to_usize;
use bigpack_format::{Fingerprint, RECORD_PREFIX_SIZE, RecordFlags, RecordPrefix};
use bytes::{Bytes, BytesMut};
use flate2::read::DeflateDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Size of the first read at a record offset
pub const READ_WINDOW: usize = 16 * 1024;

/// Offsets below this never hold a record; the data file starts with a
/// banner.
pub const MIN_RECORD_OFFSET: u64 = 2;

/// A record as stored: payload bytes plus the prefix fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Payload, still compressed if the record is compressed; empty for
    /// tombstones
    pub payload: Bytes,
    /// Content fingerprint from the prefix
    pub fingerprint: Fingerprint,
    /// Record flags
    pub flags: RecordFlags,
}

impl Record {
    /// Record is a tombstone
    pub const fn is_deleted(&self) -> bool {
        self.flags.is_deleted()
    }
}

/// Content of a live record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    /// Payload as stored
    pub payload: Bytes,
    /// Content fingerprint, served as the `ETag`
    pub fingerprint: Fingerprint,
    /// Payload is raw-DEFLATE compressed at rest
    pub compressed: bool,
}

impl Content {
    /// Payload with at-rest compression removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Inflate` if the compressed stream is corrupt.
    pub fn inflate(&self) -> Result<Bytes> {
        if !self.compressed {
            return Ok(self.payload.clone());
        }
        let mut out = Vec::with_capacity(self.payload.len() * 2);
        DeflateDecoder::new(&self.payload[..])
            .read_to_end(&mut out)
            .map_err(StorageError::Inflate)?;
        Ok(Bytes::from(out))
    }

    /// Hex content fingerprint
    pub fn etag(&self) -> String {
        self.fingerprint.to_hex()
    }
}

impl From<Record> for Content {
    fn from(record: Record) -> Self {
        Self {
            compressed: record.flags.is_compressed(),
            payload: record.payload,
            fingerprint: record.fingerprint,
        }
    }
}

/// Reads records from the data file.
///
/// Every read opens its own file handle, so concurrent lookups share
/// nothing.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Create a store reading from the data file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Data file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record at `offset`.
    ///
    /// # Errors
    ///
    /// - `StorageError::InvalidOffset` for reserved offsets
    /// - `StorageError::TruncatedRecord` if the file ends inside the prefix
    ///   or the payload
    /// - `StorageError::Io` for read failures
    pub fn read_at(&self, offset: u64) -> Result<Record> {
        if offset < MIN_RECORD_OFFSET {
            return Err(StorageError::InvalidOffset(offset));
        }

        let mut file = File::open(&self.path)?;
        let window = read_slice(&mut file, offset, READ_WINDOW)?;
        if window.len() < RECORD_PREFIX_SIZE {
            return Err(StorageError::TruncatedRecord {
                offset,
                expected: RECORD_PREFIX_SIZE as u64,
                actual: window.len() as u64,
            });
        }

        let prefix = RecordPrefix::parse(&window)?;
        if prefix.flags.is_deleted() {
            debug!("Record at {} is deleted", offset);
            return Ok(Record {
                payload: Bytes::new(),
                fingerprint: prefix.fingerprint,
                flags: prefix.flags,
            });
        }

        let size = prefix.size();
        let in_window = (window.len() - RECORD_PREFIX_SIZE) as u64;
        let mut window = Bytes::from(window);

        let payload = if size <= in_window {
            window.slice(RECORD_PREFIX_SIZE..RECORD_PREFIX_SIZE + to_usize(size, "record size")?)
        } else {
            let remaining = size - in_window;
            debug!(
                "Record at {} spans {} bytes past the read window",
                offset, remaining
            );
            let rest = read_up_to(&mut file, remaining)?;
            if (rest.len() as u64) < remaining {
                return Err(StorageError::TruncatedRecord {
                    offset,
                    expected: RECORD_PREFIX_SIZE as u64 + size,
                    actual: RECORD_PREFIX_SIZE as u64 + in_window + rest.len() as u64,
                });
            }
            let head = window.split_off(RECORD_PREFIX_SIZE);
            let mut payload = BytesMut::with_capacity(to_usize(size, "record size")?);
            payload.extend_from_slice(&head);
            payload.extend_from_slice(&rest);
            payload.freeze()
        };

        Ok(Record {
            payload,
            fingerprint: prefix.fingerprint,
            flags: prefix.flags,
        })
    }
}
