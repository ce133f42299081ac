//! Server state management and orchestration.
//!
//! Holds the open archive and request counters shared by every handler,
//! and runs the HTTP listener until a shutdown signal arrives.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::http::response::ServingAdapter;
use crate::mime::MimeTable;
use bigpack_storage::ArchiveIndex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Shared application state for the HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    /// Open archive (reloaded in place)
    archive: Arc<ArchiveIndex>,

    /// Response rendering
    adapter: ServingAdapter,

    /// Server start time (for status)
    started_at: Instant,

    /// File requests served
    requests: AtomicU64,
}

impl AppState {
    /// Create new application state from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the archive or the MIME types file cannot be
    /// loaded.
    pub fn new(config: &ServerConfig) -> Result<Self, ServerError> {
        tracing::info!("Opening archive in {:?}", config.archive_dir);

        let archive = ArchiveIndex::open(config.archive_config())?;

        let mime = match &config.mime_types {
            Some(path) => MimeTable::from_file(path)?,
            None => MimeTable::builtin(),
        };

        Ok(Self::with_archive(
            archive,
            ServingAdapter::new(mime, config.cache_max_age),
        ))
    }

    /// Create state around an already open archive.
    pub fn with_archive(archive: ArchiveIndex, adapter: ServingAdapter) -> Self {
        Self {
            archive: Arc::new(archive),
            adapter,
            started_at: Instant::now(),
            requests: AtomicU64::new(0),
        }
    }

    /// Get the open archive.
    #[must_use]
    pub const fn archive(&self) -> &Arc<ArchiveIndex> {
        &self.archive
    }

    /// Get the response renderer.
    #[must_use]
    pub const fn adapter(&self) -> &ServingAdapter {
        &self.adapter
    }

    /// Count one served request, returning the new total.
    pub fn count_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Requests served so far.
    #[must_use]
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Get server uptime.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Reload the archive index on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns the reload error; the previous index stays in service.
    pub async fn reload(&self) -> Result<u64, ServerError> {
        let archive = Arc::clone(&self.archive);
        tokio::task::spawn_blocking(move || archive.reload())
            .await
            .map_err(|e| ServerError::Shutdown(format!("reload task failed: {e}")))?
            .map_err(ServerError::from)
    }
}

/// PID file removed when dropped.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Write the current process id to `path`.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::PidFile` if the file cannot be written.
    pub fn create(path: &Path) -> Result<Self, ServerError> {
        std::fs::write(path, format!("{}\n", std::process::id())).map_err(|source| {
            ServerError::PidFile {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::debug!("Wrote PID file {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Path of the PID file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!("Failed to remove PID file {:?}: {}", self.path, e);
        }
    }
}

/// Server orchestration.
pub struct Server {
    /// Shared application state
    state: Arc<AppState>,
    /// Server configuration
    config: ServerConfig,
}

impl Server {
    /// Create new server with configuration.
    ///
    /// Opens the archive and prepares shared state.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the archive cannot be opened.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let state = AppState::new(&config)?;

        tracing::info!(
            "Server initialized: index generation {}, {} pages",
            state.archive().stats().generation,
            state.archive().stats().pages
        );

        Ok(Self {
            state: Arc::new(state),
            config,
        })
    }

    /// Get shared application state.
    #[must_use]
    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Run the HTTP server until Ctrl-C or SIGTERM.
    ///
    /// On Unix, SIGHUP reloads the archive index.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if binding fails or the PID file cannot be
    /// written.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting BigPack server");

        let _pid_file = self
            .config
            .pid_file
            .as_deref()
            .map(PidFile::create)
            .transpose()?;

        #[cfg(unix)]
        let reloader = tokio::spawn(reload_on_hangup(Arc::clone(&self.state)));

        let result =
            crate::http::start_server(self.config.bind, Arc::clone(&self.state), shutdown_signal())
                .await;

        #[cfg(unix)]
        reloader.abort();

        tracing::info!("Server stopped");
        result
    }
}

/// Resolve when Ctrl-C or (on Unix) SIGTERM is received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping server");
}

#[cfg(unix)]
async fn reload_on_hangup(state: Arc<AppState>) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            tracing::error!("Failed to listen for SIGHUP: {e}");
            return;
        }
    };

    while hangup.recv().await.is_some() {
        tracing::info!("SIGHUP received, reloading index");
        match state.reload().await {
            Ok(generation) => tracing::info!("Reload complete: generation {generation}"),
            Err(e) => tracing::error!("Reload failed: {e}"),
        }
    }
}
