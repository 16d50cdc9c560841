//! Counter-source boundary.
//!
//! The engine does not care how counters are physically read. Anything that
//! can hand back a [`RawCounters`] snapshot implements [`CounterSource`]:
//! the Linux perf backend, a replay of recorded traces, or a test mock.

use std::fmt;
use std::time::Duration;

use crate::common::error::MonitorError;

/// Raw hardware event counts for one sampling interval.
///
/// Counts are those accumulated since the previous read of the same source.
/// Events a source cannot observe are left at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawCounters {
    /// Instructions retired.
    pub instructions: u64,
    /// Core clock cycles.
    pub cycles: u64,
    /// L1 data cache hits.
    pub l1_hits: u64,
    /// L1 data cache misses.
    pub l1_misses: u64,
    /// L2 (or last-level read) hits.
    pub l2_hits: u64,
    /// L2 (or last-level read) misses.
    pub l2_misses: u64,
    /// L3 hits.
    pub l3_hits: u64,
    /// L3 misses.
    pub l3_misses: u64,
    /// Branch instructions retired.
    pub branches: u64,
    /// Mispredicted branches.
    pub branch_misses: u64,
    /// Prefetch requests observed by the cache.
    pub prefetch_attempts: u64,
    /// Prefetch requests that turned out useful.
    pub prefetch_hits: u64,
}

/// Something that can read hardware performance counters.
///
/// From the controller's point of view a source is stateless: `initialize`
/// is called once, then `read_counters` once per sampling tick.
pub trait CounterSource: Send {
    /// Prepares the counters for a sampling cadence of `interval`.
    ///
    /// # Errors
    ///
    /// Returns an error when the counters cannot be opened (missing privilege,
    /// unsupported platform). Calling again after success is a no-op.
    fn initialize(&mut self, interval: Duration) -> Result<(), MonitorError>;

    /// Reads the counts accumulated since the previous call.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::NotInitialized` if `initialize` has not
    /// succeeded, or an I/O error from the backend.
    fn read_counters(&mut self) -> Result<RawCounters, MonitorError>;
}

impl fmt::Debug for dyn CounterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CounterSource")
    }
}

/// A counter source for platforms without performance counters.
///
/// Initialization always fails, so a controller built on it runs with
/// adaptation disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCounterSource;

impl CounterSource for NullCounterSource {
    fn initialize(&mut self, _interval: Duration) -> Result<(), MonitorError> {
        Err(MonitorError::Unsupported)
    }

    fn read_counters(&mut self) -> Result<RawCounters, MonitorError> {
        Err(MonitorError::NotInitialized)
    }
}

impl<S: CounterSource + ?Sized> CounterSource for Box<S> {
    fn initialize(&mut self, interval: Duration) -> Result<(), MonitorError> {
        (**self).initialize(interval)
    }

    fn read_counters(&mut self) -> Result<RawCounters, MonitorError> {
        (**self).read_counters()
    }
}
