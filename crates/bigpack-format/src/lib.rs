//! Binary layouts and index search for BigPack archives.
//!
//! A BigPack archive is three flat files:
//!
//! - **Data file** (`BigPack.data`): self-describing records, each a 16-byte
//!   prefix followed by the payload
//! - **Map file** (`BigPack.map`): the secondary index, sorted
//!   `[fingerprint][offset]` entries read in fixed 8 KiB pages
//! - **Map2 file** (`BigPack.map2`): the primary index, the first fingerprint
//!   of every map page, held entirely in memory
//!
//! This crate holds the I/O-free half of the system: fingerprinting, the
//! page and top-index layouts, the record prefix, and the binary search
//! shared by both index levels. Reading the files is the job of
//! `bigpack-storage`.
//!
//! ```text
//! Lookup flow:
//! path -> normalize -> Fingerprint -> TopIndex (page) -> IndexPage (offset) -> record
//! ```
//!
//! # Example
//!
//! ```rust
//! use bigpack_format::{Fingerprint, path};
//!
//! let fingerprint = Fingerprint::from_path(&path::normalize("/"));
//! assert_eq!(fingerprint, Fingerprint::from_path("index.html"));
//! assert_eq!(fingerprint.to_hex().len(), 20);
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod error;
pub mod fingerprint;
pub mod le;
pub mod page;
pub mod path;
pub mod record;
pub mod search;
pub mod top;

pub use error::{FormatError, FormatResult};
pub use fingerprint::{FINGERPRINT_SIZE, Fingerprint};
pub use page::{ENTRIES_PER_PAGE, IndexPage, PAGE_ENTRY_SIZE, PAGE_SIZE, PageEntry};
pub use record::{MAX_RECORD_SIZE, RECORD_PREFIX_SIZE, RecordFlags, RecordPrefix};
pub use search::{Probe, bisect};
pub use top::{LookupOutcome, TopIndex};

/// Default file name of the data (blob) file.
pub const DATA_FILE: &str = "BigPack.data";

/// Default file name of the secondary (paged) index.
pub const MAP_FILE: &str = "BigPack.map";

/// Default file name of the primary (in-memory) index.
pub const MAP2_FILE: &str = "BigPack.map2";
