//! Common types and constants shared by the monitor, prefetch and runtime layers.
//!
//! This module provides:
//! 1. **Constants:** Cache geometry, feature-vector layout, and controller tunables.
//! 2. **Error Handling:** Telemetry and configuration error types.

/// Common constants used throughout the engine.
pub mod constants;

/// Error types for telemetry and configuration.
pub mod error;

pub use constants::{CACHE_LINE_BYTES, FEATURE_COUNT};
pub use error::{ConfigError, MonitorError};
