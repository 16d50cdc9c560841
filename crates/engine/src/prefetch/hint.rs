//! Prefetch hint sinks.
//!
//! A strategy decides *which* addresses to hint; a [`HintSink`] decides what
//! happens to them. [`HardwareHints`] issues the CPU's non-faulting prefetch
//! instruction. `Vec<u64>` records addresses, which is what the tests use.

/// Receives prefetch hint addresses.
pub trait HintSink {
    /// Handles one hint for `addr`.
    fn hint(&mut self, addr: u64);
}

impl HintSink for Vec<u64> {
    #[inline]
    fn hint(&mut self, addr: u64) {
        self.push(addr);
    }
}

/// Issues a read prefetch into all cache levels for `addr`.
///
/// Prefetch instructions never fault, so any address (unmapped, misaligned,
/// already resident) is accepted. On targets without a prefetch instruction
/// this is a no-op.
#[inline(always)]
pub fn issue_prefetch(addr: u64) {
    #[cfg(target_arch = "x86_64")]
    {
        use std::arch::x86_64::{_MM_HINT_T0, _mm_prefetch};
        // SAFETY: PREFETCHT0 is a hint; it performs no access and cannot fault
        // regardless of the address.
        unsafe { _mm_prefetch::<_MM_HINT_T0>(addr as usize as *const i8) };
    }

    #[cfg(target_arch = "aarch64")]
    {
        // SAFETY: PRFM is a hint; it performs no access and cannot fault
        // regardless of the address.
        unsafe {
            std::arch::asm!(
                "prfm pldl1keep, [{0}]",
                in(reg) addr,
                options(nostack, preserves_flags, readonly)
            );
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        let _ = addr;
    }
}

/// Sends every hint to the CPU via [`issue_prefetch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HardwareHints;

impl HintSink for HardwareHints {
    #[inline(always)]
    fn hint(&mut self, addr: u64) {
        issue_prefetch(addr);
    }
}

/// Counts hints without issuing them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HintCounter {
    /// Number of hints received.
    pub issued: u64,
}

impl HintSink for HintCounter {
    #[inline]
    fn hint(&mut self, _addr: u64) {
        self.issued += 1;
    }
}
