//! Error types for archive access

use bigpack_format::FormatError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while reading an archive.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error while reading an archive file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An archive file could not be opened or read while loading an index
    /// generation.
    #[error("failed to load {}: {source}", path.display())]
    IndexLoad {
        /// File being loaded
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Record ends before its declared size.
    #[error("truncated record at offset {offset}: expected {expected} bytes, got {actual}")]
    TruncatedRecord {
        /// Record offset in the data file
        offset: u64,
        /// Bytes the record declares (prefix included)
        expected: u64,
        /// Bytes actually available
        actual: u64,
    },

    /// Map entry points at a reserved offset.
    #[error("invalid record offset {0}")]
    InvalidOffset(u64),

    /// Compressed payload could not be inflated.
    #[error("failed to inflate payload: {0}")]
    Inflate(#[source] std::io::Error),

    /// Layout decode error.
    #[error("format error: {0}")]
    Format(#[from] FormatError),
}

impl StorageError {
    pub(crate) fn index_load(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IndexLoad {
            path: path.into(),
            source,
        }
    }
}
