//! HTTP server for BigPack archives.
//!
//! Serves every file of a BigPack archive at its path, answering from the
//! in-memory top index, one 8 KiB map page read and one or two data file
//! reads per request.
//!
//! # Architecture
//!
//! - `server`: shared state, PID file, signal handling
//! - `config`: configuration loading and validation
//! - `mime`: extension to content type mapping
//! - `http`: router, handlers and response rendering
//!
//! # Example
//!
//! ```no_run
//! use bigpack_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     tracing_subscriber::fmt::init();
//!
//!     let config = ServerConfig::from_args();
//!     config.validate()?;
//!
//!     let server = Server::new(config)?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Endpoints
//!
//! - `GET /status`: uptime, index generation and request counters
//! - `GET /reload`: rebuild the top index from disk
//! - `GET /{path}`: archive content; directories resolve to `index.html`
//!
//! Sending `SIGHUP` reloads the index as well.

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

pub mod config;
pub mod error;
pub mod http;
pub mod mime;
pub mod server;

pub use config::ServerConfig;
pub use error::{ConfigError, ServerError};
pub use http::response::ServingAdapter;
pub use mime::MimeTable;
pub use server::{AppState, PidFile, Server};
