//! Phase Classifier Tests.
//!
//! Pins the fixed decision tree: golden vectors, every leaf, threshold
//! boundaries and malformed input.

use morpheus_core::monitor::{ExecutionPhase, PhaseClassifier, FEATURE_NAMES};
use proptest::prelude::*;
use rstest::rstest;

use ExecutionPhase::{DenseSequential, PointerChasing, SparseRandom};

// ══════════════════════════════════════════════════════════
// 1. Golden vectors
// ══════════════════════════════════════════════════════════

#[rstest]
#[case([0.002, 1.9, 0.015, 800.0, 300.0, 950_000.0, 500_000.0], DenseSequential)]
#[case([0.025, 0.8, 0.028, 4500.0, 2500.0, 1_100_000.0, 1_400_000.0], SparseRandom)]
#[case([0.012, 0.95, 0.075, 1800.0, 900.0, 1_000_000.0, 1_050_000.0], PointerChasing)]
fn golden_vectors(#[case] features: [f64; 7], #[case] expected: ExecutionPhase) {
    assert_eq!(PhaseClassifier::classify(&features), expected);
}

// ══════════════════════════════════════════════════════════
// 2. Every leaf of the tree
// ══════════════════════════════════════════════════════════

#[rstest]
// low l3, low ipc
#[case(0.005, 1.0, 0.040, SparseRandom)]
#[case(0.003, 1.0, 0.050, DenseSequential)]
#[case(0.006, 1.0, 0.050, PointerChasing)]
// low l3, high ipc
#[case(0.002, 2.0, 0.090, DenseSequential)]
#[case(0.006, 2.0, 0.030, DenseSequential)]
#[case(0.006, 2.0, 0.040, PointerChasing)]
// high l3, low ipc
#[case(0.020, 0.9, 0.050, SparseRandom)]
#[case(0.020, 0.9, 0.060, PointerChasing)]
// high l3, high ipc
#[case(0.012, 1.5, 0.010, PointerChasing)]
#[case(0.030, 1.5, 0.010, SparseRandom)]
fn every_leaf(
    #[case] l3: f64,
    #[case] ipc: f64,
    #[case] branch: f64,
    #[case] expected: ExecutionPhase,
) {
    let features = [l3, ipc, branch, 0.0, 0.0, 0.0, 0.0];
    assert_eq!(PhaseClassifier::classify(&features), expected);
}

/// Thresholds are inclusive on the left branch.
#[test]
fn thresholds_are_inclusive() {
    let at_root = [0.008, 1.218, 0.043, 0.0, 0.0, 0.0, 0.0];
    assert_eq!(PhaseClassifier::classify(&at_root), SparseRandom);
}

// ══════════════════════════════════════════════════════════
// 3. Malformed input
// ══════════════════════════════════════════════════════════

#[test]
fn empty_vector_is_unknown() {
    assert_eq!(PhaseClassifier::classify(&[]), ExecutionPhase::Unknown);
}

#[test]
fn feature_names_follow_vector_layout() {
    assert_eq!(FEATURE_NAMES[0], "l3_miss_rate");
    assert_eq!(FEATURE_NAMES[1], "ipc");
    assert_eq!(FEATURE_NAMES[2], "branch_miss_rate");
    assert_eq!(FEATURE_NAMES[6], "cycles");
}

#[test]
fn phase_names() {
    assert_eq!(DenseSequential.to_string(), "DENSE_SEQUENTIAL");
    assert_eq!(ExecutionPhase::default(), ExecutionPhase::Unknown);
}

proptest! {
    #[test]
    fn short_vectors_are_unknown(features in prop::collection::vec(any::<f64>(), 0..7)) {
        prop_assert_eq!(PhaseClassifier::classify(&features), ExecutionPhase::Unknown);
    }

    #[test]
    fn full_vectors_never_classify_unknown(
        l3 in 0.0f64..1.0,
        ipc in 0.0f64..8.0,
        branch in 0.0f64..1.0,
    ) {
        let phase = PhaseClassifier::classify(&[l3, ipc, branch, 0.0, 0.0, 0.0, 0.0]);
        prop_assert_ne!(phase, ExecutionPhase::Unknown);
    }
}
