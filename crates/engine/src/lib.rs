//! Telemetry-driven adaptive software prefetching.
//!
//! This crate samples hardware performance counters while a computation runs,
//! classifies its memory-access behavior, and swaps the active prefetch
//! strategy to match:
//! 1. **Monitor:** Counter sources, samples with division-safe rates, and the fixed phase classifier.
//! 2. **Prefetch:** Sequential, strided and pointer-chain strategies behind one contract.
//! 3. **Runtime:** The adaptive controller, its background loop, and lock-free published snapshots.
//! 4. **Config / Stats:** JSON-loadable settings and activity counters.
//!
//! ```no_run
//! use morpheus_core::{AdaptiveController, Config};
//! use morpheus_core::monitor::platform_counter_source;
//! use morpheus_core::prefetch::SequentialPrefetcher;
//!
//! let mut controller = AdaptiveController::new(
//!     platform_counter_source(),
//!     SequentialPrefetcher::default(),
//!     Config::default(),
//! )?;
//! let _ = controller.start();
//!
//! let data = vec![0u64; 1 << 20];
//! let mut handle = controller.handle();
//! for chunk in data.chunks(64) {
//!     let _ = handle.refresh();
//!     let base = morpheus_core::prefetch::addr_of(chunk);
//!     handle.prefetch(&[base], 1);
//! }
//! controller.stop();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Common types and constants (errors, cache geometry, feature layout).
pub mod common;
/// Controller configuration (defaults, JSON loading, validation).
pub mod config;
/// Counter sources, samples, sampler and phase classifier.
pub mod monitor;
/// Prefetch strategies and hint sinks.
pub mod prefetch;
/// Adaptive controller, history, policy and published snapshots.
pub mod runtime;
/// Controller activity statistics.
pub mod stats;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// Telemetry and configuration errors.
pub use crate::common::error::{ConfigError, MonitorError};
/// Phase label produced by the classifier.
pub use crate::monitor::ExecutionPhase;
/// The controller; construct with `AdaptiveController::new`.
pub use crate::runtime::AdaptiveController;
