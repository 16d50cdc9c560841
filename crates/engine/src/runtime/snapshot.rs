//! Published strategy state and the consumer-side handle.
//!
//! The controller never mutates a strategy a consumer might be using. Each
//! switch builds a new [`StrategySnapshot`] and publishes it with a single
//! atomic pointer swap, so a reader sees either the old phase, distance and
//! degree together or the new ones together.
//!
//! Consumers hold a [`PrefetchHandle`]. It keeps a private working copy of
//! the strategy (predictive state such as the stride window is per consumer)
//! and picks up a new snapshot only when [`PrefetchHandle::refresh`] is
//! called, typically once per traversal step rather than once per address.

use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};

use crate::monitor::ExecutionPhase;
use crate::prefetch::{AnyPrefetcher, HardwareHints, HintSink, ImaPrefetcher, PrefetchStrategy, Prefetcher};

/// Distance, degree and stride that are always published together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchSettings {
    /// Elements to prefetch ahead.
    pub distance: usize,
    /// Hint bases used per `prefetch` call.
    pub degree: usize,
    /// Element size in bytes.
    pub stride: u64,
}

/// One committed controller decision. Immutable once published.
#[derive(Debug, Clone)]
pub struct StrategySnapshot {
    phase: ExecutionPhase,
    settings: PrefetchSettings,
    prefetcher: AnyPrefetcher,
    generation: u64,
}

impl StrategySnapshot {
    /// Builds a snapshot around an already configured and reset `prefetcher`.
    pub(crate) fn new(
        phase: ExecutionPhase,
        degree: usize,
        prefetcher: AnyPrefetcher,
        generation: u64,
    ) -> Self {
        Self {
            phase,
            settings: PrefetchSettings {
                distance: prefetcher.distance(),
                degree: degree.max(1),
                stride: prefetcher.stride(),
            },
            prefetcher,
            generation,
        }
    }

    /// Phase this snapshot was selected for.
    pub const fn phase(&self) -> ExecutionPhase {
        self.phase
    }

    /// Distance, degree and stride.
    pub const fn settings(&self) -> PrefetchSettings {
        self.settings
    }

    /// Active strategy tag.
    pub fn strategy(&self) -> PrefetchStrategy {
        self.prefetcher.strategy()
    }

    /// The freshly reset strategy consumers start from.
    pub const fn prefetcher(&self) -> &AnyPrefetcher {
        &self.prefetcher
    }

    /// Number of switches committed before this snapshot; 0 for the initial one.
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Consumer-side view of the active strategy.
///
/// Never blocks and never fails. `Send`, so it can be moved to the thread
/// running the instrumented computation.
#[derive(Debug)]
pub struct PrefetchHandle {
    published: Arc<ArcSwap<StrategySnapshot>>,
    current: Arc<StrategySnapshot>,
    local: AnyPrefetcher,
}

impl PrefetchHandle {
    pub(crate) fn new(published: Arc<ArcSwap<StrategySnapshot>>) -> Self {
        let current = published.load_full();
        let local = current.prefetcher.clone();
        Self {
            published,
            current,
            local,
        }
    }

    /// Adopts the latest published snapshot. Returns `true` if it changed.
    ///
    /// On change the working strategy is replaced by a copy of the new
    /// snapshot's, so predictions from the previous phase are dropped.
    pub fn refresh(&mut self) -> bool {
        let latest = self.published.load();
        if Arc::ptr_eq(&*latest, &self.current) {
            return false;
        }
        self.current = Guard::into_inner(latest);
        self.local = self.current.prefetcher.clone();
        true
    }

    /// The snapshot this handle is currently working from.
    pub fn snapshot(&self) -> &StrategySnapshot {
        &self.current
    }

    /// Phase of the current snapshot.
    pub fn phase(&self) -> ExecutionPhase {
        self.current.phase
    }

    /// The working strategy, including state learned by this handle.
    pub const fn prefetcher(&self) -> &AnyPrefetcher {
        &self.local
    }

    /// Issues CPU prefetch hints for up to `count` bases from `addrs`, capped
    /// at the snapshot's degree.
    #[inline]
    pub fn prefetch(&mut self, addrs: &[u64], count: usize) {
        self.prefetch_into(addrs, count, &mut HardwareHints);
    }

    /// Like [`prefetch`](Self::prefetch), sending hints to `sink`.
    #[inline]
    pub fn prefetch_into(&mut self, addrs: &[u64], count: usize, sink: &mut dyn HintSink) {
        let count = count.min(self.current.settings.degree);
        self.local.prefetch(addrs, count, sink);
    }

    /// The working IMA strategy, for `learn_pointer_chain` training.
    ///
    /// `None` unless the current snapshot selected IMA. Learned chains live
    /// until the next snapshot change.
    pub const fn ima_mut(&mut self) -> Option<&mut ImaPrefetcher> {
        self.local.as_ima_mut()
    }
}
