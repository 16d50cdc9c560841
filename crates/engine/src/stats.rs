//! Controller statistics collection and reporting.
//!
//! Tracks what the sampling/adaptation loop has done. It provides:
//! 1. **Sampling:** Samples collected and failed reads.
//! 2. **Adaptation:** Ticks run, ticks skipped for lack of history, switches committed.
//! 3. **Residency:** How many ticks classified into each phase.

use std::fmt;

use crate::monitor::ExecutionPhase;

/// Counters describing the controller's activity since construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Samples appended to history.
    pub samples: u64,
    /// Counter reads that failed.
    pub sample_errors: u64,
    /// Adaptation ticks that classified a window.
    pub ticks: u64,
    /// Adaptation ticks skipped because the history was too short.
    pub skipped_ticks: u64,
    /// Strategy switches committed, including manual phase hints.
    pub adaptations: u64,
    /// Ticks classified into each phase, indexed by [`ExecutionPhase::index`].
    pub phase_ticks: [u64; 4],
}

impl RuntimeStats {
    /// Records one classified tick.
    pub const fn record_phase(&mut self, phase: ExecutionPhase) {
        self.ticks += 1;
        self.phase_ticks[phase.index()] += 1;
    }

    /// Fraction of classified ticks that landed in `phase`; 0 with no ticks.
    pub fn residency(&self, phase: ExecutionPhase) -> f64 {
        self.phase_ticks[phase.index()] as f64 / self.ticks.max(1) as f64
    }

    /// Writes the report to stdout.
    pub fn print(&self) {
        println!("{self}");
    }
}

impl fmt::Display for RuntimeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==========================================================")?;
        writeln!(f, "ADAPTIVE PREFETCH CONTROLLER STATISTICS")?;
        writeln!(f, "==========================================================")?;
        writeln!(f, "samples                  {}", self.samples)?;
        writeln!(f, "sample_errors            {}", self.sample_errors)?;
        writeln!(f, "ticks                    {}", self.ticks)?;
        writeln!(f, "ticks.skipped            {}", self.skipped_ticks)?;
        writeln!(f, "adaptations              {}", self.adaptations)?;
        writeln!(f, "----------------------------------------------------------")?;
        writeln!(f, "PHASE RESIDENCY")?;
        for phase in ExecutionPhase::ALL {
            writeln!(
                f,
                "  {:<22} {} ({:.2}%)",
                phase.as_str(),
                self.phase_ticks[phase.index()],
                self.residency(phase) * 100.0
            )?;
        }
        write!(f, "==========================================================")
    }
}
