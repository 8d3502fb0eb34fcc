//! Common utilities used across the crate.

use rayon::prelude::*;

/// Whether parallel execution is allowed.
///
/// Components don't manage thread pools - they just respect this flag
/// and use the rayon pool they were called under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if rayon pool has multiple threads)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map with per-thread initialization.
    ///
    /// The `init` closure runs once per worker thread (in parallel mode)
    /// or once total (in sequential mode); its value is reused across
    /// items on the same thread. This is how scoring workers keep one
    /// scratch arena each.
    #[inline]
    pub fn maybe_par_map_init<T, B, I, INIT, S, F>(self, iter: I, init: INIT, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        INIT: Fn() -> S + Sync + Send,
        F: Fn(&mut S, T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map_init(init, f).collect()
        } else {
            let mut state = init();
            iter.into_iter().map(|t| f(&mut state, t)).collect()
        }
    }
}
