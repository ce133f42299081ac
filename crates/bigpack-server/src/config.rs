//! Server configuration management.
//!
//! This module handles loading and validating server configuration from CLI
//! arguments and environment variables, and checks that the archive is in
//! place before the server starts.
//!
//! # Configuration Sources
//!
//! Configuration can be provided via:
//! - CLI arguments (`--bind`, `--archive-dir`, etc.)
//! - Environment variables (`BIGPACK_BIND`, `BIGPACK_ARCHIVE_DIR`, etc.)
//! - Default values
//!
//! # Example
//!
//! ```no_run
//! use bigpack_server::ServerConfig;
//!
//! let config = ServerConfig::from_args();
//! config.validate().expect("Invalid configuration");
//!
//! println!("Serving {:?} on {}", config.archive_dir, config.bind);
//! ```

use crate::error::ConfigError;
use bigpack_storage::ArchiveConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default `Cache-Control` max-age: 7 days
pub const DEFAULT_CACHE_MAX_AGE: u64 = 7 * 24 * 60 * 60;

/// Server configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bigpack-server",
    about = "Serve files from a BigPack archive over HTTP",
    version
)]
pub struct ServerConfig {
    /// HTTP bind address
    #[arg(long, env = "BIGPACK_BIND", default_value = "127.0.0.1:8081")]
    pub bind: SocketAddr,

    /// Directory holding BigPack.data, BigPack.map and BigPack.map2
    #[arg(long, env = "BIGPACK_ARCHIVE_DIR", default_value = ".")]
    pub archive_dir: PathBuf,

    /// Write the process id to this file while running
    #[arg(long, env = "BIGPACK_PID_FILE")]
    pub pid_file: Option<PathBuf>,

    /// MIME types file in /etc/mime.types format
    #[arg(long, env = "BIGPACK_MIME_TYPES")]
    pub mime_types: Option<PathBuf>,

    /// Cache-Control max-age in seconds
    #[arg(long, env = "BIGPACK_CACHE_MAX_AGE", default_value_t = DEFAULT_CACHE_MAX_AGE)]
    pub cache_max_age: u64,

    /// Number of index pages to cache (0 disables the cache)
    #[arg(long, env = "BIGPACK_PAGE_CACHE", default_value_t = 0)]
    pub page_cache: usize,

    /// Do not reload the index when its files are found out of sync
    #[arg(long, env = "BIGPACK_NO_AUTO_RELOAD")]
    pub no_auto_reload: bool,
}

impl ServerConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Configuration for a server on `bind` serving `archive_dir`, with
    /// every other setting at its default.
    pub fn new(bind: SocketAddr, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind,
            archive_dir: archive_dir.into(),
            pid_file: None,
            mime_types: None,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            page_cache: 0,
            no_auto_reload: false,
        }
    }

    /// Archive access settings derived from this configuration.
    #[must_use]
    pub fn archive_config(&self) -> ArchiveConfig {
        ArchiveConfig::new(&self.archive_dir)
            .with_page_cache(self.page_cache)
            .with_reload_on_out_of_sync(!self.no_auto_reload)
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The archive directory doesn't exist
    /// - Any of the three archive files is missing
    /// - A MIME types file is configured but doesn't exist
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.archive_dir.is_dir() {
            return Err(ConfigError::MissingArchiveDir {
                path: self.archive_dir.clone(),
            });
        }

        for path in self.archive_config().paths() {
            if !path.is_file() {
                return Err(ConfigError::MissingArchiveFile { path });
            }
        }

        if let Some(mime_types) = &self.mime_types
            && !mime_types.is_file()
        {
            return Err(ConfigError::MimeTypes {
                path: mime_types.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }

        Ok(())
    }
}
