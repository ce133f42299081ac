//! Primary (top) index.
//!
//! The map2 file is a dense run of 10-byte fingerprints, one per map page,
//! each the first fingerprint stored in that page. It is small enough to keep
//! in memory (one entry per 512 map entries) and is used to pick the single
//! page a key could live in.
//!
//! The two index files are produced together. If one is regenerated without
//! the other they disagree about page boundaries, so every lookup compares
//! the loaded page's leading fingerprint with the one recorded here before
//! trusting the page. A disagreement is reported as
//! [`LookupOutcome::OutOfSync`], never as a wrong offset.

use crate::fingerprint::{FINGERPRINT_SIZE, Fingerprint};
use crate::page::IndexPage;
use crate::search::bisect;
use std::borrow::Borrow;

/// Result of resolving a fingerprint through both index levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Key present; record offset in the data file
    Found(u64),
    /// Key absent from the index
    NotFound,
    /// Map page does not start with the fingerprint map2 records for it
    OutOfSync {
        /// Page that failed the check
        page: usize,
        /// Leading fingerprint recorded in map2
        expected: Fingerprint,
        /// Leading fingerprint of the loaded page, `None` if the page was
        /// missing or shorter than one fingerprint
        actual: Option<Fingerprint>,
    },
}

impl LookupOutcome {
    /// Record offset when the key was found
    pub const fn offset(&self) -> Option<u64> {
        match self {
            Self::Found(offset) => Some(*offset),
            _ => None,
        }
    }

    /// Whether the index files disagreed
    pub const fn is_out_of_sync(&self) -> bool {
        matches!(self, Self::OutOfSync { .. })
    }
}

/// In-memory primary index, loaded once per generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopIndex {
    data: Vec<u8>,
    count: usize,
}

impl TopIndex {
    /// Wrap the raw contents of a map2 file.
    ///
    /// Trailing bytes that do not form a whole fingerprint are ignored; see
    /// [`TopIndex::trailing_bytes`].
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let count = data.len() / FINGERPRINT_SIZE;
        Self { data, count }
    }

    /// Build from a list of page-leading fingerprints
    pub fn from_fingerprints<I>(fingerprints: I) -> Self
    where
        I: IntoIterator<Item = Fingerprint>,
    {
        let mut data = Vec::new();
        for fingerprint in fingerprints {
            data.extend_from_slice(fingerprint.as_bytes());
        }
        Self::from_bytes(data)
    }

    /// Number of map pages described
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Whether the index describes no pages
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bytes at the end of the file that do not form a whole entry
    pub const fn trailing_bytes(&self) -> usize {
        self.data.len() - self.count * FINGERPRINT_SIZE
    }

    /// Raw map2 bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn key_at(&self, index: usize) -> &[u8] {
        let start = index * FINGERPRINT_SIZE;
        &self.data[start..start + FINGERPRINT_SIZE]
    }

    /// Leading fingerprint recorded for `page`
    pub fn page_fingerprint(&self, page: usize) -> Option<Fingerprint> {
        if page >= self.count {
            return None;
        }
        Fingerprint::from_slice(self.key_at(page))
    }

    /// Candidate page for `fingerprint`.
    ///
    /// Returns the page whose leading fingerprint is the greatest one not
    /// above the key, or page 0 when the key sorts before every page. `None`
    /// only for an empty index.
    pub fn approx_page_index(&self, fingerprint: &Fingerprint) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let key = fingerprint.as_bytes().as_slice();
        Some(bisect(self.count, |pos| key.cmp(self.key_at(pos))).position())
    }

    /// Check `page` against the fingerprint recorded for `page_index`, then
    /// search it for `fingerprint`.
    ///
    /// `page_index` always comes from `approx_page_index`, so it is in range.
    fn resolve(
        &self,
        page_index: usize,
        page: &IndexPage,
        fingerprint: &Fingerprint,
    ) -> LookupOutcome {
        let Some(expected) = self.page_fingerprint(page_index) else {
            return LookupOutcome::NotFound;
        };
        let actual = page.first_fingerprint();
        if actual != Some(expected) {
            return LookupOutcome::OutOfSync {
                page: page_index,
                expected,
                actual,
            };
        }
        match page.offset_of(fingerprint) {
            Some(offset) => LookupOutcome::Found(offset),
            None => LookupOutcome::NotFound,
        }
    }

    /// Resolve `fingerprint` through both levels, loading the candidate page
    /// with `load_page`.
    ///
    /// # Errors
    ///
    /// Propagates whatever error `load_page` returns.
    pub fn lookup<F, P, E>(&self, fingerprint: &Fingerprint, load_page: F) -> Result<LookupOutcome, E>
    where
        F: FnOnce(usize) -> Result<P, E>,
        P: Borrow<IndexPage>,
    {
        let Some(page_index) = self.approx_page_index(fingerprint) else {
            return Ok(LookupOutcome::NotFound);
        };
        let page = load_page(page_index)?;
        Ok(self.resolve(page_index, page.borrow(), fingerprint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{ENTRIES_PER_PAGE, PageEntry};
    use std::convert::Infallible;

    fn fingerprint(n: u32) -> Fingerprint {
        let [a, b, c, d] = n.to_be_bytes();
        Fingerprint::from_bytes([a, b, c, d, 0, 0, 0, 0, 0, 1])
    }

    /// Build map pages holding fingerprints `0, 3, 6, ...` and the matching
    /// top index.
    fn build(total: u32) -> (TopIndex, Vec<IndexPage>) {
        let entries: Vec<PageEntry> = (0..total)
            .map(|i| PageEntry::new(fingerprint(i * 3), 100 + u64::from(i)))
            .collect();
        let pages: Vec<IndexPage> = entries
            .chunks(ENTRIES_PER_PAGE)
            .map(|chunk| {
                let mut data = Vec::new();
                for entry in chunk {
                    data.extend_from_slice(&entry.to_bytes().unwrap());
                }
                IndexPage::from_bytes(data)
            })
            .collect();
        let top = TopIndex::from_fingerprints(
            pages.iter().map(|p| p.first_fingerprint().unwrap()),
        );
        (top, pages)
    }

    fn lookup(top: &TopIndex, pages: &[IndexPage], key: &Fingerprint) -> LookupOutcome {
        top.lookup(key, |index| Ok::<_, Infallible>(pages[index].clone()))
            .unwrap()
    }

    #[test]
    fn test_every_key_found_across_pages() {
        let (top, pages) = build(2000);
        assert_eq!(top.len(), 4);

        for i in 0..2000u32 {
            assert_eq!(
                lookup(&top, &pages, &fingerprint(i * 3)),
                LookupOutcome::Found(100 + u64::from(i)),
                "entry {i}"
            );
        }
    }

    #[test]
    fn test_absent_keys_not_found() {
        let (top, pages) = build(1500);
        for i in 0..1500u32 {
            assert_eq!(lookup(&top, &pages, &fingerprint(i * 3 + 1)), LookupOutcome::NotFound);
        }
        assert_eq!(
            lookup(&top, &pages, &fingerprint(u32::MAX)),
            LookupOutcome::NotFound
        );
    }

    #[test]
    fn test_key_below_first_page() {
        let (top, pages) = build(10);
        let below = Fingerprint::from_bytes([0; 10]);
        assert_eq!(top.approx_page_index(&below), Some(0));
        assert_eq!(lookup(&top, &pages, &below), LookupOutcome::NotFound);
    }

    #[test]
    fn test_approx_page_index_picks_greatest_leading_key() {
        let (top, _) = build(2048);
        let first_of_page_2 = 2 * ENTRIES_PER_PAGE as u32 * 3;
        assert_eq!(top.approx_page_index(&fingerprint(first_of_page_2)), Some(2));
        assert_eq!(top.approx_page_index(&fingerprint(first_of_page_2 - 1)), Some(1));
        assert_eq!(top.approx_page_index(&fingerprint(first_of_page_2 + 1)), Some(2));
    }

    #[test]
    fn test_mismatched_page_is_out_of_sync() {
        let (_, pages) = build(1024);
        // sorts between the real leading keys of pages 0 and 1
        let bogus = fingerprint(ENTRIES_PER_PAGE as u32 * 3 - 1);
        let top = TopIndex::from_fingerprints([pages[0].first_fingerprint().unwrap(), bogus]);

        let key = fingerprint(ENTRIES_PER_PAGE as u32 * 3 + 3);
        let outcome = lookup(&top, &pages, &key);
        assert_eq!(
            outcome,
            LookupOutcome::OutOfSync {
                page: 1,
                expected: bogus,
                actual: pages[1].first_fingerprint(),
            }
        );
        assert!(outcome.is_out_of_sync());
        assert_eq!(outcome.offset(), None);
    }

    #[test]
    fn test_empty_page_is_out_of_sync() {
        let top = TopIndex::from_fingerprints([fingerprint(0)]);
        let outcome = top.resolve(0, &IndexPage::from_bytes(Vec::new()), &fingerprint(0));
        assert!(matches!(
            outcome,
            LookupOutcome::OutOfSync { page: 0, actual: None, .. }
        ));
    }

    #[test]
    fn test_lookup_with_shared_pages() {
        let (top, pages) = build(1500);
        let shared: Vec<std::sync::Arc<IndexPage>> =
            pages.into_iter().map(std::sync::Arc::new).collect();
        for i in [0, 511, 512, 1499] {
            let outcome = top
                .lookup(&fingerprint(i * 3), |index| {
                    Ok::<_, Infallible>(std::sync::Arc::clone(&shared[index]))
                })
                .unwrap();
            assert_eq!(outcome, LookupOutcome::Found(100 + u64::from(i)));
        }
    }

    #[test]
    fn test_empty_index() {
        let top = TopIndex::from_bytes(Vec::new());
        assert!(top.is_empty());
        assert_eq!(top.approx_page_index(&fingerprint(1)), None);
        let outcome = top
            .lookup(&fingerprint(1), |_| -> Result<IndexPage, Infallible> {
                unreachable!("no page to load")
            })
            .unwrap();
        assert_eq!(outcome, LookupOutcome::NotFound);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut data = fingerprint(5).as_bytes().to_vec();
        data.extend_from_slice(&[1, 2, 3]);
        let top = TopIndex::from_bytes(data);
        assert_eq!(top.len(), 1);
        assert_eq!(top.trailing_bytes(), 3);
        assert_eq!(top.page_fingerprint(0), Some(fingerprint(5)));
        assert_eq!(top.page_fingerprint(1), None);
    }

    #[test]
    fn test_load_error_propagates() {
        let (top, _) = build(10);
        let result = top.lookup(&fingerprint(3), |_| Err::<IndexPage, _>("disk gone"));
        assert_eq!(result, Err("disk gone"));
    }
}
