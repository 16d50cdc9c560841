//! Error definitions.
//!
//! Only two places in the engine can fail in a caller-visible way:
//! 1. **Telemetry setup:** the counter source cannot be initialized or read.
//! 2. **Configuration:** intervals, bounds or JSON input are invalid.
//!
//! Nothing on the consumer's prefetch path returns an error.

use thiserror::Error;

/// Failure to obtain hardware telemetry.
///
/// The controller treats every variant as "monitoring unavailable" and keeps
/// running with adaptation disabled.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The platform has no usable counter source.
    #[error("hardware performance counters are not supported on this platform")]
    Unsupported,

    /// Every requested counter failed to open (typically insufficient privilege).
    #[error("no performance counter events could be opened")]
    NoEventsOpened,

    /// A read was attempted before `initialize` succeeded.
    #[error("counter source has not been initialized")]
    NotInitialized,

    /// An operating-system call on a counter handle failed.
    #[error("{what} failed")]
    Io {
        /// The operation that failed.
        what: &'static str,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

impl MonitorError {
    /// Captures `errno` for the operation named by `what`.
    pub(crate) fn last_os_error(what: &'static str) -> Self {
        Self::Io {
            what,
            source: std::io::Error::last_os_error(),
        }
    }
}

/// Invalid controller configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An interval was configured as zero milliseconds.
    #[error("{field} must be at least 1 ms")]
    ZeroInterval {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The adaptation cadence must be strictly coarser than the sampling cadence.
    #[error(
        "adaptation_interval_ms ({adaptation_ms}) must be greater than sampling_interval_ms ({sampling_ms})"
    )]
    AdaptationNotCoarser {
        /// Configured sampling interval.
        sampling_ms: u64,
        /// Configured adaptation interval.
        adaptation_ms: u64,
    },

    /// The history buffer must hold at least one entry.
    #[error("history_size must be greater than zero")]
    ZeroHistory,

    /// A predictor bound was configured too small to be meaningful.
    #[error("{field} must be at least {min}")]
    BoundTooSmall {
        /// Name of the offending field.
        field: &'static str,
        /// Smallest accepted value.
        min: usize,
    },

    /// The JSON document could not be parsed.
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}
