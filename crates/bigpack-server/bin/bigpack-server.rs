//! BigPack server binary entry point.
//!
//! This is a thin wrapper around the bigpack-server library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Validates the archive location
//! 4. Starts the server
//!
//! For library usage, see the bigpack-server crate documentation.

use anyhow::Result;
use bigpack_server::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("BigPack server starting...");

    // Parse configuration from CLI args
    let config = ServerConfig::from_args();

    tracing::info!(
        "Configuration loaded: bind={}, archive={:?}, page_cache={}",
        config.bind,
        config.archive_dir,
        config.page_cache
    );

    config.validate()?;

    let server = Server::new(config)?;
    server.run().await?;

    Ok(())
}
