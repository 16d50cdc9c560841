//! Hardware telemetry and phase classification.
//!
//! This module turns raw performance counters into a phase label. It provides:
//! 1. **Counter Source:** The boundary to whatever reads the hardware counters.
//! 2. **Samples:** Point-in-time readings with division-safe derived rates.
//! 3. **Sampler:** Wraps a counter source and extracts classifier features.
//! 4. **Classifier:** A fixed decision tree from features to `ExecutionPhase`.
//! 5. **Perf:** A Linux `perf_event_open` counter source.

/// Fixed decision-tree phase classifier.
pub mod classifier;

/// Counter-source capability and raw counts.
pub mod counters;

/// Linux `perf_event_open` counter source.
#[cfg(target_os = "linux")]
pub mod perf;

/// Performance samples and windowed metrics.
pub mod sample;

/// Counter sampling and feature extraction.
pub mod sampler;

pub use classifier::{ExecutionPhase, FEATURE_NAMES, PhaseClassifier};
pub use counters::{CounterSource, NullCounterSource, RawCounters};
#[cfg(target_os = "linux")]
pub use perf::PerfCounterSource;
pub use sample::{PerformanceSample, PhaseMetrics};
pub use sampler::{FeatureVector, PerformanceSampler};

/// The best counter source for this platform.
///
/// `PerfCounterSource` on Linux, [`NullCounterSource`] elsewhere.
pub fn platform_counter_source() -> Box<dyn CounterSource> {
    #[cfg(target_os = "linux")]
    {
        Box::new(PerfCounterSource::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(NullCounterSource)
    }
}
