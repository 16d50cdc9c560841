//! Strided Prefetcher.
//!
//! Keeps the last `window` addresses in arrival order. Once the window is
//! full, the deltas between consecutive addresses are compared: if they are
//! all equal and positive, that delta becomes the detected stride. A window
//! with any disagreement leaves the previous detection untouched, so the
//! detector never adopts a stride from noise and never forgets one because of
//! a single irregular access.
//!
//! # Performance
//!
//! - **Time Complexity:** `observe()` is O(W) for window size W (8 by default).
//! - **Space Complexity:** O(W).
//! - **Best Case:** Regular array-of-struct walks and column scans.
//! - **Worst Case:** Random access; hints degrade to the configured stride.

use std::collections::VecDeque;

use super::{HintSink, PrefetchStrategy, Prefetcher};
use crate::common::constants::STRIDE_WINDOW;
use crate::config::stride_or_line;

/// Strided Prefetcher state.
#[derive(Debug, Clone)]
pub struct StridedPrefetcher {
    /// Number of strides to prefetch ahead.
    distance: usize,
    /// Fallback element size when no stride has been detected.
    stride: u64,
    /// Number of addresses compared per detection.
    window: usize,
    /// Most recent addresses, oldest first.
    recent: VecDeque<u64>,
    /// Last stride seen consistently across a full window; 0 = none.
    detected: u64,
}

impl StridedPrefetcher {
    /// Creates a new Strided prefetcher.
    ///
    /// # Arguments
    ///
    /// * `distance` - The number of strides to prefetch ahead.
    /// * `stride` - The fallback element size in bytes.
    /// * `window` - Number of recent addresses inspected (at least 2).
    pub fn new(distance: usize, stride: u64, window: usize) -> Self {
        let window = window.max(2);
        Self {
            distance: distance.max(1),
            stride: stride_or_line(stride),
            window,
            recent: VecDeque::with_capacity(window + 1),
            detected: 0,
        }
    }

    /// Number of strides prefetched ahead.
    pub const fn distance(&self) -> usize {
        self.distance
    }

    /// Fallback element size in bytes.
    pub const fn stride(&self) -> u64 {
        self.stride
    }

    /// Number of addresses in a detection window.
    pub const fn window(&self) -> usize {
        self.window
    }

    /// The detected stride, if one has been established.
    pub const fn detected_stride(&self) -> Option<u64> {
        if self.detected == 0 {
            None
        } else {
            Some(self.detected)
        }
    }

    /// Stride used for the next hints: detected, else configured.
    pub const fn effective_stride(&self) -> u64 {
        if self.detected == 0 {
            self.stride
        } else {
            self.detected
        }
    }

    /// Records an access and updates stride detection.
    pub fn observe(&mut self, addr: u64) {
        self.recent.push_back(addr);
        if self.recent.len() > self.window {
            let _ = self.recent.pop_front();
        }
        if self.recent.len() < self.window {
            return;
        }

        let mut deltas = self
            .recent
            .iter()
            .zip(self.recent.iter().skip(1))
            .map(|(&prev, &next)| next.wrapping_sub(prev) as i64);

        let Some(first) = deltas.next() else {
            return;
        };
        if first > 0 && deltas.all(|d| d == first) {
            self.detected = first as u64;
        }
    }
}

impl Default for StridedPrefetcher {
    fn default() -> Self {
        Self::new(1, 0, STRIDE_WINDOW)
    }
}

impl Prefetcher for StridedPrefetcher {
    /// Observes each base, then hints `base + i * effective_stride` for `i` in `1..=distance`.
    fn prefetch(&mut self, addrs: &[u64], count: usize, sink: &mut dyn HintSink) {
        for &base in addrs.iter().take(count) {
            self.observe(base);
            let step = self.effective_stride();
            for k in 1..=self.distance as u64 {
                sink.hint(base.wrapping_add(step.wrapping_mul(k)));
            }
        }
    }

    fn configure(&mut self, distance: usize, stride: u64) {
        self.distance = distance.max(1);
        self.stride = stride_or_line(stride);
    }

    fn reset(&mut self) {
        self.recent.clear();
        self.detected = 0;
    }

    fn strategy(&self) -> PrefetchStrategy {
        PrefetchStrategy::Strided
    }
}
