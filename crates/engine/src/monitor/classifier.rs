//! Execution-phase classifier.
//!
//! A fixed binary decision tree over three counter-derived features. The tree
//! was trained offline and is shipped as code: there are no mutable
//! thresholds, and changing the tree is a deployment event.
//!
//! # Performance
//!
//! - **Time Complexity:** O(1), at most four comparisons per call.
//! - **Space Complexity:** O(1), no state.

use std::fmt;

use crate::common::constants::FEATURE_COUNT;

/// Names of the feature-vector elements, in classifier order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "l3_miss_rate",
    "ipc",
    "branch_miss_rate",
    "l1_misses",
    "l2_misses",
    "instructions",
    "cycles",
];

/// Coarse classification of the current memory-access behavior.
///
/// This is a label only; the variants carry no meaningful order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionPhase {
    /// Not yet classified, or telemetry unavailable.
    #[default]
    Unknown,
    /// High cache locality.
    DenseSequential,
    /// Low locality, responsive to prefetching.
    SparseRandom,
    /// Dependent accesses, resistant to prefetching.
    PointerChasing,
}

impl ExecutionPhase {
    /// Every variant, `Unknown` first.
    pub const ALL: [Self; 4] = [
        Self::Unknown,
        Self::DenseSequential,
        Self::SparseRandom,
        Self::PointerChasing,
    ];

    /// Diagnostic name of the phase.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::DenseSequential => "DENSE_SEQUENTIAL",
            Self::SparseRandom => "SPARSE_RANDOM",
            Self::PointerChasing => "POINTER_CHASING",
        }
    }

    /// Position of the phase in [`ExecutionPhase::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::DenseSequential => 1,
            Self::SparseRandom => 2,
            Self::PointerChasing => 3,
        }
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The trained phase classifier.
///
/// Stateless; `classify` is a pure function of its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseClassifier;

impl PhaseClassifier {
    /// Classifies a feature vector.
    ///
    /// Expects the layout produced by
    /// [`PerformanceSampler::extract_features`](super::PerformanceSampler::extract_features).
    /// Vectors shorter than [`FEATURE_COUNT`] classify as `Unknown`. Only
    /// `l3_miss_rate`, `ipc` and `branch_miss_rate` are branched on; the other
    /// elements are carried for future trees.
    ///
    /// # Examples
    ///
    /// ```
    /// use morpheus_core::monitor::{ExecutionPhase, PhaseClassifier};
    ///
    /// let dense = [0.002, 1.9, 0.015, 800.0, 300.0, 950_000.0, 500_000.0];
    /// assert_eq!(PhaseClassifier::classify(&dense), ExecutionPhase::DenseSequential);
    /// assert_eq!(PhaseClassifier::classify(&dense[..3]), ExecutionPhase::Unknown);
    /// ```
    pub fn classify(features: &[f64]) -> ExecutionPhase {
        use ExecutionPhase::{DenseSequential, PointerChasing, SparseRandom};

        if features.len() < FEATURE_COUNT {
            return ExecutionPhase::Unknown;
        }

        let l3_miss_rate = features[0];
        let ipc = features[1];
        let branch_miss_rate = features[2];

        if l3_miss_rate <= 0.008 {
            if ipc <= 1.218 {
                if branch_miss_rate <= 0.043 {
                    SparseRandom
                } else if l3_miss_rate <= 0.004 {
                    DenseSequential
                } else {
                    PointerChasing
                }
            } else if l3_miss_rate <= 0.003 || branch_miss_rate <= 0.035 {
                DenseSequential
            } else {
                PointerChasing
            }
        } else if ipc <= 1.044 {
            if branch_miss_rate <= 0.052 {
                SparseRandom
            } else {
                PointerChasing
            }
        } else if l3_miss_rate <= 0.015 {
            PointerChasing
        } else {
            SparseRandom
        }
    }
}
