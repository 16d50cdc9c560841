//! Phase to strategy policy.
//!
//! Fixed table, not learned:
//!
//! | Phase            | Strategy   | Distance | Degree |
//! |------------------|------------|----------|--------|
//! | `DenseSequential`| Sequential | 256      | 4      |
//! | `SparseRandom`   | Strided    | 128      | 2      |
//! | `PointerChasing` | IMA        | 64       | 1      |
//!
//! `Unknown` has no plan; the controller keeps whatever is active.

use crate::monitor::ExecutionPhase;
use crate::prefetch::PrefetchStrategy;

/// What the controller installs for a detected phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyPlan {
    /// Strategy to activate.
    pub strategy: PrefetchStrategy,
    /// Elements to prefetch ahead.
    pub distance: usize,
    /// Hint bases used per `prefetch` call.
    pub degree: usize,
}

/// The phase to strategy table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhasePolicy;

impl PhasePolicy {
    /// Plan for `phase`, or `None` for `Unknown`.
    pub const fn plan_for(phase: ExecutionPhase) -> Option<StrategyPlan> {
        match phase {
            ExecutionPhase::Unknown => None,
            ExecutionPhase::DenseSequential => Some(StrategyPlan {
                strategy: PrefetchStrategy::Sequential,
                distance: 256,
                degree: 4,
            }),
            ExecutionPhase::SparseRandom => Some(StrategyPlan {
                strategy: PrefetchStrategy::Strided,
                distance: 128,
                degree: 2,
            }),
            ExecutionPhase::PointerChasing => Some(StrategyPlan {
                strategy: PrefetchStrategy::Ima,
                distance: 64,
                degree: 1,
            }),
        }
    }
}
