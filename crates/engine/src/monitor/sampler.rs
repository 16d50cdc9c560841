//! Performance sampler.
//!
//! Wraps a [`CounterSource`] and turns each raw reading into a timestamped
//! [`PerformanceSample`]. The sampler owns the source, so whatever OS handles
//! the source holds are released when the sampler is dropped.

use std::fmt;
use std::time::{Duration, Instant};

use crate::common::constants::FEATURE_COUNT;
use crate::common::error::MonitorError;

use super::classifier::{ExecutionPhase, PhaseClassifier};
use super::counters::CounterSource;
use super::sample::PerformanceSample;

/// Classifier input: `[l3_miss_rate, ipc, branch_miss_rate, l1_misses, l2_misses, instructions, cycles]`.
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Reads a counter source and produces samples.
pub struct PerformanceSampler {
    source: Box<dyn CounterSource>,
    epoch: Instant,
    initialized: bool,
}

impl PerformanceSampler {
    /// Creates a sampler over `source`. The source is not touched until
    /// [`initialize`](Self::initialize).
    pub fn new(source: Box<dyn CounterSource>) -> Self {
        Self {
            source,
            epoch: Instant::now(),
            initialized: false,
        }
    }

    /// Initializes the underlying source for the given cadence.
    ///
    /// Idempotent once it has succeeded.
    ///
    /// # Errors
    ///
    /// Propagates the source's failure; the sampler then produces no samples.
    pub fn initialize(&mut self, interval: Duration) -> Result<(), MonitorError> {
        if self.initialized {
            return Ok(());
        }
        self.source.initialize(interval)?;
        self.initialized = true;
        Ok(())
    }

    /// Whether [`initialize`](Self::initialize) has succeeded.
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Reads the counter source exactly once.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::NotInitialized` before a successful
    /// `initialize`, or the source's read error.
    pub fn sample(&mut self) -> Result<PerformanceSample, MonitorError> {
        if !self.initialized {
            return Err(MonitorError::NotInitialized);
        }
        let counters = self.source.read_counters()?;
        let timestamp_ns = u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX);
        Ok(PerformanceSample::new(timestamp_ns, counters))
    }

    /// Reads one sample and labels it with the classifier's verdict.
    ///
    /// # Errors
    ///
    /// Same as [`sample`](Self::sample).
    pub fn sample_classified(&mut self) -> Result<PerformanceSample, MonitorError> {
        let sample = self.sample()?;
        let phase = Self::classify(&sample);
        Ok(sample.with_phase(phase))
    }

    /// Builds the classifier feature vector for `sample`.
    ///
    /// The element order is part of the classifier contract.
    pub fn extract_features(sample: &PerformanceSample) -> FeatureVector {
        let c = sample.counters();
        [
            sample.l3_miss_rate(),
            sample.ipc(),
            sample.branch_miss_rate(),
            c.l1_misses as f64,
            c.l2_misses as f64,
            c.instructions as f64,
            c.cycles as f64,
        ]
    }

    /// Classifies a single sample.
    pub fn classify(sample: &PerformanceSample) -> ExecutionPhase {
        PhaseClassifier::classify(&Self::extract_features(sample))
    }
}

impl fmt::Debug for PerformanceSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceSampler")
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}
