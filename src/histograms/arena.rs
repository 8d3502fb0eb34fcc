//! Reusable per-worker scratch memory for histogram tensors.
//!
//! One arena per scoring worker, retained across calls. Growth doubles
//! the requested size and discards the old contents instead of copying
//! them: every call re-zeroes the region it reads, so a copy would be
//! wasted bandwidth.

use crate::score::ScoreError;

/// Growable word buffer backing histogram tensors.
///
/// Word-granular (8-byte) storage keeps every bin span naturally aligned
/// for both the `u64` sample count and the `f64` channels.
#[derive(Debug, Default)]
pub struct ScratchArena {
    words: Vec<u64>,
}

impl ScratchArena {
    pub fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Current capacity in words.
    #[inline]
    pub fn capacity_words(&self) -> usize {
        self.words.len()
    }

    /// Hands out a span of exactly `len` words.
    ///
    /// Contents are unspecified; callers zero what they will read before
    /// writing. Fails with [`ScoreError::OutOfMemory`] if the allocator
    /// refuses, or [`ScoreError::AllocationImpossible`] if the doubled
    /// size overflows.
    pub fn request(&mut self, len: usize) -> Result<&mut [u64], ScoreError> {
        if self.words.len() < len {
            let target = len
                .checked_mul(2)
                .ok_or(ScoreError::AllocationImpossible("scratch growth size"))?;
            let bytes = target
                .checked_mul(std::mem::size_of::<u64>())
                .ok_or(ScoreError::AllocationImpossible("scratch byte size"))?;

            // Drop the old buffer before growing; contents never survive
            // a growth, so there is nothing to copy.
            self.words = Vec::new();
            let mut fresh: Vec<u64> = Vec::new();
            fresh
                .try_reserve_exact(target)
                .map_err(|_| ScoreError::OutOfMemory { bytes })?;
            fresh.resize(target, 0);
            self.words = fresh;
        }
        Ok(&mut self.words[..len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_by_doubling() {
        let mut arena = ScratchArena::new();
        assert_eq!(arena.capacity_words(), 0);

        arena.request(10).unwrap();
        assert_eq!(arena.capacity_words(), 20);

        // Within capacity: no growth.
        arena.request(15).unwrap();
        assert_eq!(arena.capacity_words(), 20);

        arena.request(21).unwrap();
        assert_eq!(arena.capacity_words(), 42);
    }

    #[test]
    fn request_len_is_exact() {
        let mut arena = ScratchArena::new();
        let span = arena.request(7).unwrap();
        assert_eq!(span.len(), 7);
    }

    #[test]
    fn growth_overflow_is_reported() {
        let mut arena = ScratchArena::new();
        let err = arena.request(usize::MAX / 2 + 1).unwrap_err();
        assert!(matches!(err, ScoreError::AllocationImpossible(_)));
    }
}
