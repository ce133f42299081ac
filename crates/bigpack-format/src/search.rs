//! Bisection shared by both index levels.
//!
//! The map page search and the map2 page selection walk the same half-open
//! window `[from, to)`. They differ only in what they do when the key is not
//! present: a page search reports "not found", the top-index search keeps the
//! position it converged on as the candidate page. [`bisect`] returns both
//! facts and lets the caller decide.

use std::cmp::Ordering;

/// Result of a bisection over a sorted sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Key equals the entry at this position
    Exact(usize),
    /// Search converged without a match; position of the last probe.
    ///
    /// When the key is greater than the first entry this is the greatest
    /// entry below the key. When the key sorts before every entry it is `0`.
    Converged(usize),
}

impl Probe {
    /// Position regardless of exactness
    pub const fn position(self) -> usize {
        match self {
            Self::Exact(pos) | Self::Converged(pos) => pos,
        }
    }

    /// Position of an exact match, if any
    pub const fn exact(self) -> Option<usize> {
        match self {
            Self::Exact(pos) => Some(pos),
            Self::Converged(_) => None,
        }
    }
}

/// Bisect `len` sorted entries.
///
/// `compare(pos)` returns the ordering of the search key relative to the
/// entry at `pos`. The loop stops on an exact match, or as soon as the probe
/// lands on the lower bound of the window, which bounds the work at
/// `ceil(log2(len)) + 1` comparisons. An empty sequence converges at `0`
/// without calling `compare`.
pub fn bisect<F>(len: usize, mut compare: F) -> Probe
where
    F: FnMut(usize) -> Ordering,
{
    let mut from = 0;
    let mut to = len;
    if to == 0 {
        return Probe::Converged(0);
    }
    loop {
        let pos = from + (to - from) / 2;
        let ordering = compare(pos);
        if ordering == Ordering::Equal {
            return Probe::Exact(pos);
        }
        if pos == from {
            return Probe::Converged(pos);
        }
        if ordering == Ordering::Greater {
            from = pos;
        } else {
            to = pos;
        }
        if from == to {
            return Probe::Converged(pos);
        }
    }
}
