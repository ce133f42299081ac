//! Error types for the BigPack server.
//!
//! All errors use thiserror for consistent error handling across the codebase.

use bigpack_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Archive directory does not exist
    #[error("archive directory not found: {}", path.display())]
    MissingArchiveDir {
        /// Configured directory
        path: PathBuf,
    },

    /// One of the archive files is missing
    #[error("archive file not found: {}", path.display())]
    MissingArchiveFile {
        /// Expected file path
        path: PathBuf,
    },

    /// MIME types file could not be read
    #[error("Failed to read MIME types from {}: {source}", path.display())]
    MimeTypes {
        /// Path to the mime.types file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Server runtime errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind HTTP server
    #[error("Failed to bind HTTP server to {addr}: {source}")]
    HttpBindFailed {
        /// Address that failed to bind
        addr: std::net::SocketAddr,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Archive could not be opened
    #[error("Archive error: {0}")]
    Archive(#[from] StorageError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// PID file could not be written
    #[error("Failed to write PID file {}: {source}", path.display())]
    PidFile {
        /// PID file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Server shutdown error
    #[error("Server shutdown error: {0}")]
    Shutdown(String),
}
