//! Path lookups over an open archive.
//!
//! [`ArchiveIndex`] ties the three files together: the in-memory top index
//! picks a map page, the page yields a record offset, and the record store
//! reads the record.
//!
//! The top index lives in an immutable [`Generation`]. Lookups take a
//! reference to the current generation once and use it throughout, and
//! [`ArchiveIndex::reload`] builds a complete new generation before swapping
//! it in, so a lookup sees either the old index or the new one in full.
//! Reloads are serialized; lookups never wait on one.
//!
//! An out-of-sync lookup triggers at most one automatic reload. If the new
//! generation is still out of sync, automatic reloads stay off until an
//! explicit reload or until the map2 file changes on disk, and the condition
//! is logged once for the whole episode.

use crate::cache::PageCache;
use crate::config::ArchiveConfig;
use crate::error::{Result, StorageError};
use crate::map::{load_page, load_top_index};
use crate::record::{Content, RecordStore};
use bigpack_format::{Fingerprint, IndexPage, LookupOutcome, TopIndex, path};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, error, info, warn};

/// Result of looking up a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentResult {
    /// No index entry for the path
    NotFound,
    /// The two index files disagree
    OutOfSync,
    /// The record exists but was deleted
    Gone,
    /// Live content
    Ok(Content),
}

/// One loaded top index
#[derive(Debug)]
pub struct Generation {
    id: u64,
    top: TopIndex,
    loaded_at: SystemTime,
    loaded: Instant,
    map2_stamp: Option<FileStamp>,
}

/// Size and modification time of a file, to notice it being rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

impl FileStamp {
    fn of(path: &Path) -> Option<Self> {
        let metadata = std::fs::metadata(path).ok()?;
        Some(Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

impl Generation {
    fn new(id: u64, top: TopIndex, map2_stamp: Option<FileStamp>) -> Self {
        Self {
            id,
            top,
            loaded_at: SystemTime::now(),
            loaded: Instant::now(),
            map2_stamp,
        }
    }

    /// Generation number, starting at 1 for the initial load
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The top index of this generation
    pub const fn top(&self) -> &TopIndex {
        &self.top
    }

    /// Wall-clock time of the load
    pub const fn loaded_at(&self) -> SystemTime {
        self.loaded_at
    }

    /// Time since the load
    pub fn age(&self) -> Duration {
        self.loaded.elapsed()
    }
}

/// Snapshot of the archive state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveStats {
    /// Current generation number
    pub generation: u64,
    /// Pages described by the current top index
    pub pages: usize,
    /// Time since the current generation was loaded
    pub age: Duration,
    /// Pages held in the page cache
    pub cached_pages: usize,
}

/// An open archive
pub struct ArchiveIndex {
    config: ArchiveConfig,
    records: RecordStore,
    current: RwLock<Arc<Generation>>,
    reload_lock: Mutex<u64>,
    cache: Option<PageCache>,
    out_of_sync_reported: AtomicBool,
    auto_reload_held: AtomicBool,
}

impl std::fmt::Debug for ArchiveIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveIndex")
            .field("config", &self.config)
            .field("generation", &self.current().id())
            .finish_non_exhaustive()
    }
}

impl ArchiveIndex {
    /// Open the archive described by `config` and load the first generation.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::IndexLoad` if any of the three files is
    /// missing or unreadable.
    pub fn open(config: ArchiveConfig) -> Result<Self> {
        for path in config.paths() {
            std::fs::metadata(&path).map_err(|e| StorageError::index_load(&path, e))?;
        }

        let map2_stamp = FileStamp::of(&config.map2_path());
        let top = load_top_index(&config.map2_path())?;
        info!(
            "Opened archive {:?}: {} index pages",
            config.root,
            top.len()
        );

        let cache = PageCache::new(config.page_cache_pages);
        if let Some(cache) = &cache {
            debug!("Page cache enabled: {} pages", cache.capacity());
        }

        Ok(Self {
            records: RecordStore::new(config.data_path()),
            current: RwLock::new(Arc::new(Generation::new(1, top, map2_stamp))),
            reload_lock: Mutex::new(1),
            cache,
            out_of_sync_reported: AtomicBool::new(false),
            auto_reload_held: AtomicBool::new(false),
            config,
        })
    }

    /// Configuration the archive was opened with
    pub const fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// The generation new lookups will use
    pub fn current(&self) -> Arc<Generation> {
        Arc::clone(&*self.current.read())
    }

    /// Current state for status reporting
    pub fn stats(&self) -> ArchiveStats {
        let generation = self.current();
        ArchiveStats {
            generation: generation.id(),
            pages: generation.top().len(),
            age: generation.age(),
            cached_pages: self.cache.as_ref().map_or(0, PageCache::len),
        }
    }

    /// Rebuild the top index from the map2 file and publish it.
    ///
    /// Returns the new generation number. On failure the current generation
    /// stays in service. A successful reload re-enables automatic
    /// out-of-sync recovery and its error report.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::IndexLoad` if the map2 file cannot be read.
    pub fn reload(&self) -> Result<u64> {
        let mut last = self.reload_lock.lock();
        let id = self.rebuild(&mut last)?;
        self.auto_reload_held.store(false, Ordering::Relaxed);
        self.out_of_sync_reported.store(false, Ordering::Relaxed);
        Ok(id)
    }

    fn rebuild(&self, last: &mut u64) -> Result<u64> {
        let map2_path = self.config.map2_path();
        let map2_stamp = FileStamp::of(&map2_path);
        let top = load_top_index(&map2_path)?;
        let id = *last + 1;
        let pages = top.len();
        let generation = Arc::new(Generation::new(id, top, map2_stamp));

        *self.current.write() = generation;
        *last = id;
        if let Some(cache) = &self.cache {
            cache.clear();
        }
        info!("Loaded index generation {}: {} pages", id, pages);
        Ok(id)
    }

    /// Whether an out-of-sync lookup against `generation` may reload
    fn may_auto_reload(&self, generation: &Generation) -> bool {
        if !self.config.reload_on_out_of_sync {
            return false;
        }
        if !self.auto_reload_held.load(Ordering::Relaxed) {
            return true;
        }
        FileStamp::of(&self.config.map2_path()) != generation.map2_stamp
    }

    /// Reload unless another caller already replaced `seen`
    fn reload_after(&self, seen: &Generation) -> Result<Arc<Generation>> {
        let mut last = self.reload_lock.lock();
        if *last == seen.id() {
            self.rebuild(&mut last)?;
        } else {
            debug!(
                "Generation {} already replaced by {}",
                seen.id(),
                *last
            );
        }
        Ok(self.current())
    }

    fn page(&self, generation: &Generation, page_index: usize) -> Result<Arc<IndexPage>> {
        if let Some(cache) = &self.cache
            && let Some(page) = cache.get(generation.id(), page_index)
        {
            return Ok(page);
        }
        let page = Arc::new(load_page(&self.config.map_path(), page_index)?);
        if let Some(cache) = &self.cache
            && !page.is_empty()
        {
            cache.insert(generation.id(), page_index, Arc::clone(&page));
        }
        Ok(page)
    }

    fn resolve_in(&self, generation: &Generation, fingerprint: &Fingerprint) -> Result<LookupOutcome> {
        generation
            .top()
            .lookup(fingerprint, |page_index| self.page(generation, page_index))
    }

    /// Resolve a fingerprint to its record offset.
    ///
    /// With `reload_on_out_of_sync` set, an out-of-sync result triggers one
    /// reload and one retry against the new generation. A retry that is
    /// still out of sync holds further automatic reloads until
    /// [`reload`](Self::reload) is called or the map2 file changes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the map file cannot be read, or
    /// `StorageError::IndexLoad` if the recovery reload fails.
    pub fn resolve(&self, fingerprint: &Fingerprint) -> Result<LookupOutcome> {
        let generation = self.current();
        let outcome = self.resolve_in(&generation, fingerprint)?;
        if !outcome.is_out_of_sync() {
            return Ok(outcome);
        }
        if !self.may_auto_reload(&generation) {
            return Ok(self.report(&generation, outcome));
        }

        warn!(
            "Index generation {} out of sync for {}, reloading",
            generation.id(),
            fingerprint
        );
        let generation = self.reload_after(&generation)?;
        let outcome = self.resolve_in(&generation, fingerprint)?;
        if outcome.is_out_of_sync() {
            self.auto_reload_held.store(true, Ordering::Relaxed);
            return Ok(self.report(&generation, outcome));
        }

        info!("Index generation {} back in sync", generation.id());
        self.auto_reload_held.store(false, Ordering::Relaxed);
        self.out_of_sync_reported.store(false, Ordering::Relaxed);
        Ok(outcome)
    }

    /// Log an out-of-sync outcome, once until the next recovery
    fn report(&self, generation: &Generation, outcome: LookupOutcome) -> LookupOutcome {
        if let LookupOutcome::OutOfSync {
            page,
            expected,
            actual,
        } = &outcome
            && !self.out_of_sync_reported.swap(true, Ordering::Relaxed)
        {
            error!(
                "Index files out of sync in generation {}: page {} starts with {}, map2 expects {}",
                generation.id(),
                page,
                actual.map_or_else(|| "nothing".to_string(), |f| f.to_hex()),
                expected
            );
        }
        outcome
    }

    /// Look up content by fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error for I/O failures and truncated records.
    pub fn lookup_fingerprint(&self, fingerprint: &Fingerprint) -> Result<ContentResult> {
        let offset = match self.resolve(fingerprint)? {
            LookupOutcome::Found(offset) => offset,
            LookupOutcome::NotFound => return Ok(ContentResult::NotFound),
            LookupOutcome::OutOfSync { .. } => return Ok(ContentResult::OutOfSync),
        };

        let record = self.records.read_at(offset)?;
        if record.is_deleted() {
            return Ok(ContentResult::Gone);
        }
        Ok(ContentResult::Ok(Content::from(record)))
    }

    /// Look up content by request path.
    ///
    /// The path is normalized first: the leading `/` is dropped and
    /// directory paths resolve to their `index.html`.
    ///
    /// # Errors
    ///
    /// Returns an error for I/O failures and truncated records.
    pub fn lookup(&self, request_path: &str) -> Result<ContentResult> {
        let key = path::normalize(request_path);
        let fingerprint = Fingerprint::from_path(&key);
        debug!("Lookup {} -> {} ({})", request_path, key, fingerprint);
        self.lookup_fingerprint(&fingerprint)
    }
}
