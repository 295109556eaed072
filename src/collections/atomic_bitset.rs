//! A word-packed atomic bit set.
//!
//! Dense alternative to one `AtomicBool` per node for membership flags written
//! concurrently by traversal tasks.

use core::sync::atomic::{AtomicU64, Ordering};

use super::paged::assert_in_bounds;

/// A fixed-size set of bits backed by `AtomicU64` words.
#[derive(Debug)]
pub struct AtomicBitSet {
    bits: u64,
    words: Vec<AtomicU64>,
}

impl AtomicBitSet {
    /// Creates a set of `bits` cleared bits.
    pub fn new(bits: u64) -> Self {
        let words = (0..bits.div_ceil(64)).map(|_| AtomicU64::new(0)).collect();
        Self { bits, words }
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> u64 {
        self.bits
    }

    /// Returns `true` if the set has no bits at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Clears all bits.
    pub fn clear_all(&self) {
        for word in &self.words {
            word.store(0, Ordering::Relaxed);
        }
    }

    /// Returns whether `bit` is set.
    ///
    /// # Panics
    /// Panics if `bit >= len()`.
    #[track_caller]
    pub fn get(&self, bit: u64) -> bool {
        assert_in_bounds(bit, self.bits);
        let (word, mask) = word_mask(bit);
        (self.words[word].load(Ordering::Acquire) & mask) != 0
    }

    /// Sets `bit` and returns `true` iff this call observed it cleared.
    ///
    /// # Panics
    /// Panics if `bit >= len()`.
    #[track_caller]
    pub fn test_and_set(&self, bit: u64) -> bool {
        assert_in_bounds(bit, self.bits);
        let (word, mask) = word_mask(bit);
        (self.words[word].fetch_or(mask, Ordering::AcqRel) & mask) == 0
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u64 {
        self.words
            .iter()
            .map(|word| u64::from(word.load(Ordering::Acquire).count_ones()))
            .sum()
    }
}

#[inline(always)]
fn word_mask(bit: u64) -> (usize, u64) {
    ((bit >> 6) as usize, 1u64 << (bit & 63))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_once_semantics() {
        let set = AtomicBitSet::new(130);
        assert_eq!(set.len(), 130);
        assert!(set.test_and_set(129));
        assert!(!set.test_and_set(129));
        assert!(set.get(129));
        assert!(!set.get(64));
        assert_eq!(set.count_ones(), 1);
        set.clear_all();
        assert_eq!(set.count_ones(), 0);
    }

    #[test]
    fn concurrent_first_visit_is_unique() {
        let set = AtomicBitSet::new(1_000);
        let winners = AtomicU64::new(0);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for bit in 0..1_000 {
                        if set.test_and_set(bit) {
                            winners.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });
        assert_eq!(winners.load(Ordering::Relaxed), 1_000);
    }
}
