//! Fixed-capacity ring log
//!
//! FIFO of closed buckets. Once full, every insertion evicts the oldest
//! entry. Lookups are by age, where age 0 is the newest entry.

use heapless::Deque;

/// Ring log of `N` entries
#[derive(Debug, Clone)]
pub struct RingLog<T, const N: usize> {
    entries: Deque<T, N>,
}

impl<T, const N: usize> Default for RingLog<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> RingLog<T, N> {
    /// Create an empty ring log
    pub const fn new() -> Self {
        Self {
            entries: Deque::new(),
        }
    }

    /// Append an entry, returning the evicted oldest one if full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.entries.is_full() {
            self.entries.pop_front()
        } else {
            None
        };

        // Cannot fail: a slot was freed above if the deque was full
        let _ = self.entries.push_back(item);

        evicted
    }

    /// Entry by age (0 = newest, `len() - 1` = oldest)
    pub fn peek(&self, age: usize) -> Option<&T> {
        self.iter_newest_first().nth(age)
    }

    /// Iterate newest to oldest
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().rev()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries are retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
