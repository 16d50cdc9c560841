//! Sequential Prefetcher.
//!
//! Hints the next `distance` elements after each access, `stride` bytes
//! apart. No learning and no history; this is the strategy for dense,
//! array-like traversals.

use super::{HintSink, PrefetchStrategy, Prefetcher};
use crate::config::stride_or_line;

/// Sequential Prefetcher state.
#[derive(Debug, Clone)]
pub struct SequentialPrefetcher {
    /// Number of elements to prefetch ahead.
    distance: usize,
    /// Element size in bytes.
    stride: u64,
}

impl SequentialPrefetcher {
    /// Creates a new Sequential prefetcher.
    ///
    /// # Arguments
    ///
    /// * `distance` - The number of elements to prefetch ahead.
    /// * `stride` - The element size in bytes.
    pub const fn new(distance: usize, stride: u64) -> Self {
        Self {
            distance: if distance == 0 { 1 } else { distance },
            stride: stride_or_line(stride),
        }
    }

    /// Number of elements prefetched ahead.
    pub const fn distance(&self) -> usize {
        self.distance
    }

    /// Element size in bytes.
    pub const fn stride(&self) -> u64 {
        self.stride
    }
}

impl Default for SequentialPrefetcher {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl Prefetcher for SequentialPrefetcher {
    /// Hints `base + i * stride` for `i` in `1..=distance` for each base.
    #[inline]
    fn prefetch(&mut self, addrs: &[u64], count: usize, sink: &mut dyn HintSink) {
        for &base in addrs.iter().take(count) {
            for k in 1..=self.distance as u64 {
                sink.hint(base.wrapping_add(self.stride.wrapping_mul(k)));
            }
        }
    }

    fn configure(&mut self, distance: usize, stride: u64) {
        *self = Self::new(distance, stride);
    }

    fn reset(&mut self) {}

    fn strategy(&self) -> PrefetchStrategy {
        PrefetchStrategy::Sequential
    }
}
