//! LRU cache of map pages.
//!
//! Pages are keyed by index generation as well as page number, so a page
//! validated against one top index is never served to a lookup running
//! against another. The archive also clears the cache whenever it publishes
//! a new generation.

use bigpack_format::IndexPage;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

type PageKey = (u64, usize);

/// Bounded cache of recently used map pages
pub struct PageCache {
    pages: Mutex<LruCache<PageKey, Arc<IndexPage>>>,
}

impl PageCache {
    /// Create a cache holding up to `capacity` pages, or `None` for a
    /// capacity of zero.
    pub fn new(capacity: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            pages: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Cached page for `page` in `generation`
    pub fn get(&self, generation: u64, page: usize) -> Option<Arc<IndexPage>> {
        self.pages.lock().get(&(generation, page)).cloned()
    }

    /// Store a page
    pub fn insert(&self, generation: u64, page: usize, data: Arc<IndexPage>) {
        self.pages.lock().put((generation, page), data);
    }

    /// Drop every cached page
    pub fn clear(&self) {
        self.pages.lock().clear();
    }

    /// Number of cached pages
    pub fn len(&self) -> usize {
        self.pages.lock().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of pages held
    pub fn capacity(&self) -> usize {
        self.pages.lock().cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(byte: u8) -> Arc<IndexPage> {
        Arc::new(IndexPage::from_bytes(vec![byte; 16]))
    }

    #[test]
    fn test_zero_capacity_disables() {
        assert!(PageCache::new(0).is_none());
    }

    #[test]
    fn test_get_and_evict() {
        let cache = PageCache::new(2).unwrap();
        cache.insert(1, 0, page(0));
        cache.insert(1, 1, page(1));
        assert!(cache.get(1, 0).is_some());

        // page 1 is now least recently used
        cache.insert(1, 2, page(2));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(1, 1).is_none());
        assert!(cache.get(1, 0).is_some());
        assert!(cache.get(1, 2).is_some());
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn test_generations_are_separate() {
        let cache = PageCache::new(4).unwrap();
        cache.insert(1, 0, page(1));
        assert!(cache.get(2, 0).is_none());

        cache.clear();
        assert!(cache.is_empty());
    }
}
