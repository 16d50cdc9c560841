//! Software prefetch strategies.
//!
//! This module contains the shared contract and the three strategies the
//! controller switches between. Strategies compute hint addresses and hand
//! them to a [`HintSink`]; they never dereference anything.

/// Hint sinks: CPU prefetch instructions and recorders.
pub mod hint;

/// Pointer-chain (indirect memory access) prefetcher.
pub mod ima;

/// Sequential prefetcher (fixed stride, no learning).
pub mod sequential;

/// Strided prefetcher (detects constant positive deltas).
pub mod strided;

use std::fmt;

use crate::config::PrefetchConfig;

pub use self::hint::{HardwareHints, HintCounter, HintSink};
pub use self::ima::ImaPrefetcher;
pub use self::sequential::SequentialPrefetcher;
pub use self::strided::StridedPrefetcher;

/// Which strategy a prefetcher implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefetchStrategy {
    /// Fixed-stride lookahead.
    Sequential,
    /// Learned constant stride.
    Strided,
    /// Learned pointer-chain successors.
    Ima,
}

impl fmt::Display for PrefetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sequential => "Sequential",
            Self::Strided => "Strided",
            Self::Ima => "IMA",
        })
    }
}

/// Capability shared by all prefetch strategies.
///
/// Implementations must not fault: they compute addresses and pass them to a
/// [`HintSink`], tolerating invalid or already-resident addresses.
pub trait Prefetcher: Send + Sync {
    /// Issues hints for up to `count` forthcoming accesses.
    ///
    /// Each of the first `count` entries of `addrs` is treated as an access
    /// base, in order. A strategy that cannot predict anything for a base
    /// falls back to a fixed-stride or next-line hint.
    fn prefetch(&mut self, addrs: &[u64], count: usize, sink: &mut dyn HintSink);

    /// Sets the lookahead (`distance` elements) and element size (`stride` bytes).
    ///
    /// A zero distance is raised to 1 and a zero stride falls back to the
    /// cache-line size.
    fn configure(&mut self, distance: usize, stride: u64);

    /// Clears all learned state.
    fn reset(&mut self);

    /// The strategy tag.
    fn strategy(&self) -> PrefetchStrategy;
}

/// Pointer value of `r` as a prefetch address.
pub fn addr_of<T: ?Sized>(r: &T) -> u64 {
    std::ptr::from_ref(r).cast::<u8>() as usize as u64
}

/// One of the three strategies.
///
/// The set is closed; the controller stores and clones strategies through
/// this type rather than trait objects.
#[derive(Debug, Clone)]
pub enum AnyPrefetcher {
    /// See [`SequentialPrefetcher`].
    Sequential(SequentialPrefetcher),
    /// See [`StridedPrefetcher`].
    Strided(StridedPrefetcher),
    /// See [`ImaPrefetcher`].
    Ima(ImaPrefetcher),
}

impl AnyPrefetcher {
    /// Builds a fresh strategy of kind `strategy` from `config`.
    pub fn new(strategy: PrefetchStrategy, config: &PrefetchConfig) -> Self {
        match strategy {
            PrefetchStrategy::Sequential => Self::Sequential(SequentialPrefetcher::new(
                1,
                config.line_bytes,
            )),
            PrefetchStrategy::Strided => Self::Strided(StridedPrefetcher::new(
                1,
                config.line_bytes,
                config.stride_window,
            )),
            PrefetchStrategy::Ima => Self::Ima(ImaPrefetcher::new(
                1,
                config.line_bytes,
                config.max_chain_length,
            )),
        }
    }

    /// Configured lookahead in elements.
    pub const fn distance(&self) -> usize {
        match self {
            Self::Sequential(p) => p.distance(),
            Self::Strided(p) => p.distance(),
            Self::Ima(p) => p.distance(),
        }
    }

    /// Configured element size in bytes.
    pub const fn stride(&self) -> u64 {
        match self {
            Self::Sequential(p) => p.stride(),
            Self::Strided(p) => p.stride(),
            Self::Ima(p) => p.stride(),
        }
    }

    /// The IMA strategy, if that is what this is.
    pub const fn as_ima(&self) -> Option<&ImaPrefetcher> {
        match self {
            Self::Ima(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable access to the IMA strategy, for pointer-chain training.
    pub const fn as_ima_mut(&mut self) -> Option<&mut ImaPrefetcher> {
        match self {
            Self::Ima(p) => Some(p),
            _ => None,
        }
    }

    /// The strided strategy, if that is what this is.
    pub const fn as_strided(&self) -> Option<&StridedPrefetcher> {
        match self {
            Self::Strided(p) => Some(p),
            _ => None,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Prefetcher {
        match self {
            Self::Sequential(p) => p,
            Self::Strided(p) => p,
            Self::Ima(p) => p,
        }
    }
}

impl Prefetcher for AnyPrefetcher {
    #[inline]
    fn prefetch(&mut self, addrs: &[u64], count: usize, sink: &mut dyn HintSink) {
        match self {
            Self::Sequential(p) => p.prefetch(addrs, count, sink),
            Self::Strided(p) => p.prefetch(addrs, count, sink),
            Self::Ima(p) => p.prefetch(addrs, count, sink),
        }
    }

    fn configure(&mut self, distance: usize, stride: u64) {
        self.inner_mut().configure(distance, stride);
    }

    fn reset(&mut self) {
        self.inner_mut().reset();
    }

    fn strategy(&self) -> PrefetchStrategy {
        match self {
            Self::Sequential(_) => PrefetchStrategy::Sequential,
            Self::Strided(_) => PrefetchStrategy::Strided,
            Self::Ima(_) => PrefetchStrategy::Ima,
        }
    }
}

impl From<SequentialPrefetcher> for AnyPrefetcher {
    fn from(p: SequentialPrefetcher) -> Self {
        Self::Sequential(p)
    }
}

impl From<StridedPrefetcher> for AnyPrefetcher {
    fn from(p: StridedPrefetcher) -> Self {
        Self::Strided(p)
    }
}

impl From<ImaPrefetcher> for AnyPrefetcher {
    fn from(p: ImaPrefetcher) -> Self {
        Self::Ima(p)
    }
}
