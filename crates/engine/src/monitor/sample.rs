//! Performance samples and windowed phase metrics.
//!
//! A [`PerformanceSample`] is one immutable reading of the counters. Every
//! derived rate floors its denominator at 1, so a sample with zero
//! instructions or zero cycles still yields finite, non-negative rates.
//!
//! A [`PhaseMetrics`] is the cache/branch/prefetch efficiency view of one or
//! more samples. Hit rates use `hits / (hits + misses + 1)` so the all-zero
//! case reads as 0 rather than NaN.

use crate::common::constants::NANOS_PER_MILLI;

use super::classifier::ExecutionPhase;
use super::counters::RawCounters;

/// Divides `num` by `den`, treating a zero denominator as 1.
#[inline]
fn guarded_ratio(num: u64, den: u64) -> f64 {
    num as f64 / den.max(1) as f64
}

/// `hits / (hits + misses + 1)`.
#[inline]
fn hit_rate(hits: u64, misses: u64) -> f64 {
    hits as f64 / (hits as f64 + misses as f64 + 1.0)
}

/// A single point-in-time counter reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSample {
    timestamp_ns: u64,
    counters: RawCounters,
    phase: Option<ExecutionPhase>,
}

impl PerformanceSample {
    /// Builds a sample taken `timestamp_ns` after the sampler's epoch.
    pub const fn new(timestamp_ns: u64, counters: RawCounters) -> Self {
        Self {
            timestamp_ns,
            counters,
            phase: None,
        }
    }

    /// Returns a copy of this sample labelled with `phase`.
    #[must_use]
    pub const fn with_phase(self, phase: ExecutionPhase) -> Self {
        Self {
            phase: Some(phase),
            ..self
        }
    }

    /// Monotonic timestamp in nanoseconds.
    pub const fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    /// Monotonic timestamp in milliseconds.
    pub const fn timestamp_ms(&self) -> u64 {
        self.timestamp_ns / NANOS_PER_MILLI
    }

    /// The raw counts behind this sample.
    pub const fn counters(&self) -> &RawCounters {
        &self.counters
    }

    /// Classified phase, if the sample has been labelled.
    pub const fn phase(&self) -> Option<ExecutionPhase> {
        self.phase
    }

    /// Instructions per cycle.
    pub fn ipc(&self) -> f64 {
        guarded_ratio(self.counters.instructions, self.counters.cycles)
    }

    /// L1 misses per instruction.
    pub fn l1_miss_rate(&self) -> f64 {
        guarded_ratio(self.counters.l1_misses, self.counters.instructions)
    }

    /// L2 misses per instruction.
    pub fn l2_miss_rate(&self) -> f64 {
        guarded_ratio(self.counters.l2_misses, self.counters.instructions)
    }

    /// L3 misses per instruction.
    pub fn l3_miss_rate(&self) -> f64 {
        guarded_ratio(self.counters.l3_misses, self.counters.instructions)
    }

    /// Branch mispredictions per instruction.
    pub fn branch_miss_rate(&self) -> f64 {
        guarded_ratio(self.counters.branch_misses, self.counters.instructions)
    }

    /// Efficiency metrics for this single sample.
    pub fn metrics(&self) -> PhaseMetrics {
        let c = &self.counters;
        PhaseMetrics {
            timestamp_ms: self.timestamp_ms(),
            l1_hit_rate: hit_rate(c.l1_hits, c.l1_misses),
            l2_hit_rate: hit_rate(c.l2_hits, c.l2_misses),
            l3_hit_rate: hit_rate(c.l3_hits, c.l3_misses),
            instructions_per_cycle: self.ipc(),
            branch_accuracy: (1.0 - c.branch_misses as f64 / (c.branches as f64 + 1.0)).max(0.0),
            prefetch_useful_rate: c.prefetch_hits as f64 / (c.prefetch_attempts as f64 + 1.0),
        }
    }
}

/// Averaged efficiency metrics over a window of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseMetrics {
    /// Timestamp of the newest contributing sample, in milliseconds.
    pub timestamp_ms: u64,
    /// L1 hit rate.
    pub l1_hit_rate: f64,
    /// L2 hit rate.
    pub l2_hit_rate: f64,
    /// L3 hit rate.
    pub l3_hit_rate: f64,
    /// Instructions per cycle.
    pub instructions_per_cycle: f64,
    /// Fraction of branches predicted correctly.
    pub branch_accuracy: f64,
    /// Fraction of prefetches that were useful.
    pub prefetch_useful_rate: f64,
}

impl PhaseMetrics {
    /// Element-wise mean of `window`; `None` if the window is empty.
    ///
    /// The timestamp is taken from the last (newest) entry.
    pub fn average<'a, I>(window: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut sum = Self::default();
        let mut count = 0usize;
        for m in window {
            sum.timestamp_ms = m.timestamp_ms;
            sum.l1_hit_rate += m.l1_hit_rate;
            sum.l2_hit_rate += m.l2_hit_rate;
            sum.l3_hit_rate += m.l3_hit_rate;
            sum.instructions_per_cycle += m.instructions_per_cycle;
            sum.branch_accuracy += m.branch_accuracy;
            sum.prefetch_useful_rate += m.prefetch_useful_rate;
            count += 1;
        }
        if count == 0 {
            return None;
        }

        let n = count as f64;
        Some(Self {
            timestamp_ms: sum.timestamp_ms,
            l1_hit_rate: sum.l1_hit_rate / n,
            l2_hit_rate: sum.l2_hit_rate / n,
            l3_hit_rate: sum.l3_hit_rate / n,
            instructions_per_cycle: sum.instructions_per_cycle / n,
            branch_accuracy: sum.branch_accuracy / n,
            prefetch_useful_rate: sum.prefetch_useful_rate / n,
        })
    }
}
