//! File access for BigPack archives.
//!
//! This crate reads the three archive files and answers path lookups:
//!
//! - **Top index** (`BigPack.map2`): loaded into memory once per generation
//! - **Map pages** (`BigPack.map`): read 8 KiB at a time per lookup,
//!   optionally kept in a bounded LRU cache
//! - **Records** (`BigPack.data`): read with a 16 KiB window plus, for large
//!   payloads, one exact follow-up read
//!
//! [`ArchiveIndex`] composes these into a single lookup returning a
//! [`ContentResult`], and publishes reloaded top indexes atomically.
//!
//! # Example
//!
//! ```rust,no_run
//! use bigpack_storage::{ArchiveConfig, ArchiveIndex, ContentResult};
//!
//! # fn example() -> bigpack_storage::Result<()> {
//! let archive = ArchiveIndex::open(ArchiveConfig::new("/srv/site"))?;
//! match archive.lookup("/")? {
//!     ContentResult::Ok(content) => println!("{} bytes, etag {}", content.payload.len(), content.etag()),
//!     other => println!("{other:?}"),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod archive;
pub mod cache;
pub mod config;
pub mod error;
pub mod map;
pub mod record;
pub mod slice;
pub mod testing;

pub use archive::{ArchiveIndex, ArchiveStats, ContentResult, Generation};
pub use config::ArchiveConfig;
pub use error::{Result, StorageError};
pub use record::{Content, READ_WINDOW, Record, RecordStore};
