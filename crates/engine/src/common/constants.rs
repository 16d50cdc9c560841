//! Engine-wide constants.
//!
//! Values here are the defaults the configuration layer falls back to and the
//! fixed layout parameters shared between the sampler and the classifier.

/// Size of a cache line in bytes; the default prefetch stride.
pub const CACHE_LINE_BYTES: u64 = 64;

/// Number of elements in a classifier feature vector.
///
/// Layout: `[l3_miss_rate, ipc, branch_miss_rate, l1_misses, l2_misses, instructions, cycles]`.
pub const FEATURE_COUNT: usize = 7;

/// Default number of recent addresses the strided prefetcher keeps.
pub const STRIDE_WINDOW: usize = 8;

/// Default bound on learned successors per base address in the IMA prefetcher.
pub const MAX_CHAIN_LENGTH: usize = 4;

/// Minimum number of history entries before an adaptation tick may act.
pub const MIN_SAMPLES_FOR_DECISION: usize = 10;

/// Minimum number of history entries for `effectiveness()` to report a value.
pub const MIN_SAMPLES_FOR_EFFECTIVENESS: usize = 2;

/// Nanoseconds per millisecond.
pub const NANOS_PER_MILLI: u64 = 1_000_000;
