//! Phase Policy Tests.

use morpheus_core::monitor::ExecutionPhase;
use morpheus_core::prefetch::PrefetchStrategy;
use morpheus_core::runtime::{PhasePolicy, StrategyPlan};
use rstest::rstest;

#[rstest]
#[case(ExecutionPhase::DenseSequential, PrefetchStrategy::Sequential, 256, 4)]
#[case(ExecutionPhase::SparseRandom, PrefetchStrategy::Strided, 128, 2)]
#[case(ExecutionPhase::PointerChasing, PrefetchStrategy::Ima, 64, 1)]
fn table(
    #[case] phase: ExecutionPhase,
    #[case] strategy: PrefetchStrategy,
    #[case] distance: usize,
    #[case] degree: usize,
) {
    assert_eq!(
        PhasePolicy::plan_for(phase),
        Some(StrategyPlan {
            strategy,
            distance,
            degree
        })
    );
}

#[test]
fn unknown_has_no_plan() {
    assert_eq!(PhasePolicy::plan_for(ExecutionPhase::Unknown), None);
}
