//! IMA (indirect memory access) Prefetcher.
//!
//! Learns "address A is followed by address B" relationships that stride
//! detection cannot express, such as linked structures and adjacency lists.
//! Each base address keeps a bounded list of observed successors; the oldest
//! successor is evicted once the bound is exceeded.
//!
//! # Performance
//!
//! - **Time Complexity:** `learn_pointer_chain()` O(1) amortized; `prefetch()` O(min(L, D)) per base.
//! - **Space Complexity:** O(K * L) for K learned bases and chain bound L.

use std::collections::{HashMap, VecDeque};

use super::{HintSink, PrefetchStrategy, Prefetcher};
use crate::common::constants::MAX_CHAIN_LENGTH;
use crate::config::stride_or_line;

/// IMA Prefetcher state.
#[derive(Debug, Clone)]
pub struct ImaPrefetcher {
    /// Maximum successors hinted per base.
    distance: usize,
    /// Fallback offset (next line) for bases with no learned chain.
    stride: u64,
    /// Maximum successors remembered per base.
    max_chain: usize,
    /// Learned successors, oldest first.
    chains: HashMap<u64, VecDeque<u64>>,
}

impl ImaPrefetcher {
    /// Creates a new IMA prefetcher.
    ///
    /// # Arguments
    ///
    /// * `distance` - Maximum successors hinted per base.
    /// * `stride` - Fallback offset in bytes (normally one cache line).
    /// * `max_chain` - Successors remembered per base address.
    pub fn new(distance: usize, stride: u64, max_chain: usize) -> Self {
        Self {
            distance: distance.max(1),
            stride: stride_or_line(stride),
            max_chain: max_chain.max(1),
            chains: HashMap::new(),
        }
    }

    /// Maximum successors hinted per base.
    pub const fn distance(&self) -> usize {
        self.distance
    }

    /// Fallback offset in bytes.
    pub const fn stride(&self) -> u64 {
        self.stride
    }

    /// Successors remembered per base address.
    pub const fn max_chain(&self) -> usize {
        self.max_chain
    }

    /// Records that an access to `from` was followed by an access to `to`.
    pub fn learn_pointer_chain(&mut self, from: u64, to: u64) {
        let chain = self.chains.entry(from).or_default();
        if chain.len() >= self.max_chain {
            let _ = chain.pop_front();
        }
        chain.push_back(to);
    }

    /// Learned successors of `addr`, oldest first.
    pub fn successors(&self, addr: u64) -> impl Iterator<Item = u64> + '_ {
        self.chains.get(&addr).into_iter().flatten().copied()
    }

    /// Number of base addresses with learned successors.
    pub fn learned_bases(&self) -> usize {
        self.chains.len()
    }
}

impl Default for ImaPrefetcher {
    fn default() -> Self {
        Self::new(1, 0, MAX_CHAIN_LENGTH)
    }
}

impl Prefetcher for ImaPrefetcher {
    /// Hints up to `distance` learned successors per base, or the next line
    /// when the base has none.
    fn prefetch(&mut self, addrs: &[u64], count: usize, sink: &mut dyn HintSink) {
        for &base in addrs.iter().take(count) {
            match self.chains.get(&base) {
                Some(chain) if !chain.is_empty() => {
                    for &target in chain.iter().take(self.distance) {
                        sink.hint(target);
                    }
                }
                _ => sink.hint(base.wrapping_add(self.stride)),
            }
        }
    }

    fn configure(&mut self, distance: usize, stride: u64) {
        self.distance = distance.max(1);
        self.stride = stride_or_line(stride);
    }

    fn reset(&mut self) {
        self.chains.clear();
    }

    fn strategy(&self) -> PrefetchStrategy {
        PrefetchStrategy::Ima
    }
}
