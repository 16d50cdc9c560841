//! Adaptive runtime: the controller, its background loop and the state it
//! publishes to consumers.

/// `AdaptiveController` and adaptation ticks.
pub mod controller;

/// Bounded history window.
pub mod history;

/// Phase to strategy table.
pub mod policy;

/// Published snapshots and consumer handles.
pub mod snapshot;

/// Background sampling/adaptation loop.
pub mod worker;

pub use self::controller::{AdaptiveController, TickOutcome};
pub use self::history::{HistoryBuffer, HistoryEntry};
pub use self::policy::{PhasePolicy, StrategyPlan};
pub use self::snapshot::{PrefetchHandle, PrefetchSettings, StrategySnapshot};
