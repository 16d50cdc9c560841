//! Linux `perf_event_open` counter source.
//!
//! Opens one counting (non-sampling) event per hardware counter for the
//! calling thread on any CPU. Events the kernel or PMU refuses are skipped and
//! read as zero; initialization only fails when nothing could be opened.
//!
//! The kernel counters are cumulative. Each `read_counters` call returns the
//! difference from the previous call, so samples describe one interval.

use std::time::Duration;

use crate::common::error::MonitorError;

use super::counters::{CounterSource, RawCounters};

/// `PERF_TYPE_HARDWARE`.
const TYPE_HARDWARE: u32 = 0;
/// `PERF_TYPE_HW_CACHE`.
const TYPE_HW_CACHE: u32 = 3;

/// `PERF_ATTR_SIZE_VER0`: the attribute prefix this module fills in.
const ATTR_SIZE_VER0: u32 = 64;

/// `attr.disabled`: start stopped, enabled explicitly after reset.
const FLAG_DISABLED: u64 = 1 << 0;
/// `attr.exclude_kernel`: count user space only (works under paranoid >= 2).
const FLAG_EXCLUDE_KERNEL: u64 = 1 << 5;
/// `attr.exclude_hv`.
const FLAG_EXCLUDE_HV: u64 = 1 << 6;

/// `_IO('$', 0)`.
const IOC_ENABLE: u64 = 0x2400;
/// `_IO('$', 1)`.
const IOC_DISABLE: u64 = 0x2401;
/// `_IO('$', 3)`.
const IOC_RESET: u64 = 0x2403;

/// Builds a `PERF_TYPE_HW_CACHE` config word.
const fn cache_config(id: u64, op: u64, result: u64) -> u64 {
    id | (op << 8) | (result << 16)
}

const CACHE_L1D: u64 = 0;
const CACHE_LL: u64 = 2;
const OP_READ: u64 = 0;
const OP_PREFETCH: u64 = 2;
const RESULT_ACCESS: u64 = 0;
const RESULT_MISS: u64 = 1;

/// First 64 bytes of `struct perf_event_attr`.
#[repr(C)]
#[derive(Default)]
struct PerfEventAttr {
    kind: u32,
    size: u32,
    config: u64,
    sample_period: u64,
    sample_type: u64,
    read_format: u64,
    flags: u64,
    wakeup_events: u32,
    bp_type: u32,
    config1: u64,
}

/// Number of events opened per source.
const EVENT_COUNT: usize = 12;

/// The events opened by [`PerfCounterSource`], in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Instructions,
    Cycles,
    Branches,
    BranchMisses,
    L1dReadAccess,
    L1dReadMiss,
    LlReadAccess,
    LlReadMiss,
    CacheReferences,
    CacheMisses,
    L1dPrefetchAccess,
    L1dPrefetchMiss,
}

impl Event {
    const ALL: [Self; EVENT_COUNT] = [
        Self::Instructions,
        Self::Cycles,
        Self::Branches,
        Self::BranchMisses,
        Self::L1dReadAccess,
        Self::L1dReadMiss,
        Self::LlReadAccess,
        Self::LlReadMiss,
        Self::CacheReferences,
        Self::CacheMisses,
        Self::L1dPrefetchAccess,
        Self::L1dPrefetchMiss,
    ];

    /// `(type, config)` pair for the kernel.
    const fn encoding(self) -> (u32, u64) {
        match self {
            Self::Cycles => (TYPE_HARDWARE, 0),
            Self::Instructions => (TYPE_HARDWARE, 1),
            Self::CacheReferences => (TYPE_HARDWARE, 2),
            Self::CacheMisses => (TYPE_HARDWARE, 3),
            Self::Branches => (TYPE_HARDWARE, 4),
            Self::BranchMisses => (TYPE_HARDWARE, 5),
            Self::L1dReadAccess => (TYPE_HW_CACHE, cache_config(CACHE_L1D, OP_READ, RESULT_ACCESS)),
            Self::L1dReadMiss => (TYPE_HW_CACHE, cache_config(CACHE_L1D, OP_READ, RESULT_MISS)),
            Self::LlReadAccess => (TYPE_HW_CACHE, cache_config(CACHE_LL, OP_READ, RESULT_ACCESS)),
            Self::LlReadMiss => (TYPE_HW_CACHE, cache_config(CACHE_LL, OP_READ, RESULT_MISS)),
            Self::L1dPrefetchAccess => {
                (TYPE_HW_CACHE, cache_config(CACHE_L1D, OP_PREFETCH, RESULT_ACCESS))
            }
            Self::L1dPrefetchMiss => {
                (TYPE_HW_CACHE, cache_config(CACHE_L1D, OP_PREFETCH, RESULT_MISS))
            }
        }
    }
}

/// An open perf event file descriptor. Closed on drop.
#[derive(Debug)]
struct EventFd(libc::c_int);

impl EventFd {
    fn open(event: Event) -> Result<Self, MonitorError> {
        let (kind, config) = event.encoding();
        let attr = PerfEventAttr {
            kind,
            size: ATTR_SIZE_VER0,
            config,
            flags: FLAG_DISABLED | FLAG_EXCLUDE_KERNEL | FLAG_EXCLUDE_HV,
            ..PerfEventAttr::default()
        };

        // SAFETY: `attr` is a properly sized and initialized VER0 attribute
        // that outlives the call; pid 0 / cpu -1 / group -1 / flags 0 are
        // valid arguments for per-thread counting.
        let ret = unsafe {
            libc::syscall(
                libc::SYS_perf_event_open,
                std::ptr::from_ref(&attr),
                0 as libc::pid_t,
                -1 as libc::c_int,
                -1 as libc::c_int,
                0 as libc::c_ulong,
            )
        };
        if ret < 0 {
            return Err(MonitorError::last_os_error("perf_event_open"));
        }
        Ok(Self(ret as libc::c_int))
    }

    fn ioctl(&self, request: u64, what: &'static str) -> Result<(), MonitorError> {
        // SAFETY: `self.0` is an open perf event fd and the requests used take
        // no argument.
        let ret = unsafe { libc::ioctl(self.0, request as _, 0) };
        if ret == -1 {
            return Err(MonitorError::last_os_error(what));
        }
        Ok(())
    }

    fn read_value(&self) -> Result<u64, MonitorError> {
        let mut value: u64 = 0;
        // SAFETY: reads at most 8 bytes into a live, aligned u64.
        let n = unsafe {
            libc::read(
                self.0,
                std::ptr::from_mut(&mut value).cast::<libc::c_void>(),
                std::mem::size_of::<u64>(),
            )
        };
        if n != std::mem::size_of::<u64>() as isize {
            return Err(MonitorError::last_os_error("read perf counter"));
        }
        Ok(value)
    }
}

impl Drop for EventFd {
    fn drop(&mut self) {
        let _ = self.ioctl(IOC_DISABLE, "disable perf event");
        // SAFETY: the fd is owned by this value and closed exactly once.
        let _ = unsafe { libc::close(self.0) };
    }
}

/// Per-thread hardware counters read through `perf_event_open`.
///
/// Counts the thread that calls [`initialize`](CounterSource::initialize).
#[derive(Debug, Default)]
pub struct PerfCounterSource {
    events: Vec<Option<EventFd>>,
    last: [u64; EVENT_COUNT],
    interval: Duration,
}

impl PerfCounterSource {
    /// Creates an unopened source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events that were successfully opened.
    pub fn open_events(&self) -> usize {
        self.events.iter().filter(|e| e.is_some()).count()
    }

    /// Sampling cadence the source was initialized with.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    fn read_cumulative(&self) -> [u64; EVENT_COUNT] {
        let mut values = [0u64; EVENT_COUNT];
        for (slot, event) in values.iter_mut().zip(&self.events) {
            if let Some(fd) = event {
                match fd.read_value() {
                    Ok(v) => *slot = v,
                    Err(err) => tracing::trace!(%err, "perf counter read failed"),
                }
            }
        }
        values
    }
}

impl CounterSource for PerfCounterSource {
    fn initialize(&mut self, interval: Duration) -> Result<(), MonitorError> {
        if !self.events.is_empty() {
            return Ok(());
        }

        let mut events = Vec::with_capacity(EVENT_COUNT);
        for event in Event::ALL {
            match EventFd::open(event) {
                Ok(fd) => events.push(Some(fd)),
                Err(err) => {
                    tracing::warn!(?event, %err, "failed to open perf event");
                    events.push(None);
                }
            }
        }
        if events.iter().all(Option::is_none) {
            return Err(MonitorError::NoEventsOpened);
        }

        for fd in events.iter().flatten() {
            fd.ioctl(IOC_RESET, "reset perf event")?;
            fd.ioctl(IOC_ENABLE, "enable perf event")?;
        }

        self.events = events;
        self.interval = interval;
        self.last = self.read_cumulative();
        tracing::debug!(opened = self.open_events(), "perf counters enabled");
        Ok(())
    }

    fn read_counters(&mut self) -> Result<RawCounters, MonitorError> {
        if self.events.is_empty() {
            return Err(MonitorError::NotInitialized);
        }

        let now = self.read_cumulative();
        let mut delta = [0u64; EVENT_COUNT];
        for ((d, cur), prev) in delta.iter_mut().zip(now).zip(self.last) {
            *d = cur.saturating_sub(prev);
        }
        self.last = now;

        let get = |event: Event| delta[event as usize];
        let l1_access = get(Event::L1dReadAccess);
        let l1_miss = get(Event::L1dReadMiss);
        let ll_access = get(Event::LlReadAccess);
        let ll_miss = get(Event::LlReadMiss);
        let refs = get(Event::CacheReferences);
        let misses = get(Event::CacheMisses);
        let pf_access = get(Event::L1dPrefetchAccess);
        let pf_miss = get(Event::L1dPrefetchMiss);

        Ok(RawCounters {
            instructions: get(Event::Instructions),
            cycles: get(Event::Cycles),
            l1_hits: l1_access.saturating_sub(l1_miss),
            l1_misses: l1_miss,
            l2_hits: ll_access.saturating_sub(ll_miss),
            l2_misses: ll_miss,
            l3_hits: refs.saturating_sub(misses),
            l3_misses: misses,
            branches: get(Event::Branches),
            branch_misses: get(Event::BranchMisses),
            prefetch_attempts: pf_access,
            prefetch_hits: pf_access.saturating_sub(pf_miss),
        })
    }
}
