//! Bounded history window.
//!
//! A fixed-capacity FIFO. Appending to a full buffer evicts exactly the
//! oldest entry, so the length never exceeds the capacity.

use std::collections::VecDeque;

use crate::monitor::{FeatureVector, PerformanceSample, PerformanceSampler, PhaseMetrics};

/// Fixed-capacity, insertion-ordered buffer.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> HistoryBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `entry`, returning the evicted oldest entry if the buffer was full.
    pub fn push(&mut self, entry: T) -> Option<T> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        self.entries.iter()
    }

    /// The newest `count` entries, oldest first. Fewer if the buffer is shorter.
    pub fn recent(&self, count: usize) -> impl ExactSizeIterator<Item = &T> + '_ {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.range(skip..)
    }

    /// The most recently appended entry.
    pub fn newest(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Removes every entry; capacity is unchanged.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// One sampling step as retained by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    /// The raw sample.
    pub sample: PerformanceSample,
    /// Classifier input derived from the sample.
    pub features: FeatureVector,
    /// Efficiency view of the sample.
    pub metrics: PhaseMetrics,
}

impl HistoryEntry {
    /// Derives features and metrics from `sample`.
    pub fn from_sample(sample: PerformanceSample) -> Self {
        Self {
            features: PerformanceSampler::extract_features(&sample),
            metrics: sample.metrics(),
            sample,
        }
    }
}

impl From<PerformanceSample> for HistoryEntry {
    fn from(sample: PerformanceSample) -> Self {
        Self::from_sample(sample)
    }
}

/// Element-wise mean of the feature vectors in `window`; `None` when empty.
pub fn average_features<'a, I>(window: I) -> Option<FeatureVector>
where
    I: IntoIterator<Item = &'a HistoryEntry>,
{
    let mut sum = FeatureVector::default();
    let mut count = 0usize;
    for entry in window {
        for (acc, value) in sum.iter_mut().zip(entry.features) {
            *acc += value;
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let n = count as f64;
    for acc in &mut sum {
        *acc /= n;
    }
    Some(sum)
}
