//! Adaptive controller.
//!
//! Owns the sampler, the history window and the published strategy. Three
//! paths touch it:
//!
//! - The **worker** (or `sample_now`/`adapt_now` on the caller's thread)
//!   appends samples and runs adaptation ticks.
//! - **Switches** (`adapt_now`, worker ticks, `hint_phase`) build the next
//!   [`StrategySnapshot`] under `switch_lock` and publish it in one store.
//! - **Consumers** read the published snapshot without locking.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use arc_swap::ArcSwap;

use crate::common::constants::MIN_SAMPLES_FOR_EFFECTIVENESS;
use crate::common::error::{ConfigError, MonitorError};
use crate::config::Config;
use crate::monitor::{
    CounterSource, ExecutionPhase, PerformanceSample, PerformanceSampler, PhaseClassifier,
    PhaseMetrics,
};
use crate::prefetch::{AnyPrefetcher, Prefetcher};
use crate::stats::RuntimeStats;

use super::history::{HistoryBuffer, HistoryEntry, average_features};
use super::policy::PhasePolicy;
use super::snapshot::{PrefetchHandle, StrategySnapshot};
use super::worker;

/// Locks `mutex`, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Result of one adaptation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not enough history to decide.
    Skipped {
        /// Entries currently held.
        have: usize,
        /// Entries required.
        need: usize,
    },
    /// The window classified as `phase`; nothing was switched.
    Unchanged(ExecutionPhase),
    /// A new strategy was published.
    Switched {
        /// Phase before the switch.
        from: ExecutionPhase,
        /// Phase after the switch.
        to: ExecutionPhase,
    },
}

/// History and statistics, written by the sampling side only.
#[derive(Debug)]
pub(crate) struct Telemetry {
    history: HistoryBuffer<HistoryEntry>,
    last_window: Option<PhaseMetrics>,
    stats: RuntimeStats,
}

/// State shared between the controller and its worker thread.
#[derive(Debug)]
pub(crate) struct Shared {
    config: Config,
    sampler: Mutex<PerformanceSampler>,
    telemetry: Mutex<Telemetry>,
    published: Arc<ArcSwap<StrategySnapshot>>,
    switch_lock: Mutex<()>,
    adaptations: AtomicU64,
    cancel: AtomicBool,
}

impl Shared {
    pub(crate) const fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Initializes the sampler if needed.
    fn ensure_monitoring(&self) -> Result<(), MonitorError> {
        let interval = Duration::from_millis(self.config.runtime.sampling_interval_ms);
        lock(&self.sampler).initialize(interval)
    }

    /// Reads one sample and appends it to history.
    pub(crate) fn sample_once(&self) -> Result<PerformanceSample, MonitorError> {
        let result = lock(&self.sampler).sample_classified();
        let mut telemetry = lock(&self.telemetry);
        match result {
            Ok(sample) => {
                let _ = telemetry.history.push(HistoryEntry::from_sample(sample));
                telemetry.stats.samples += 1;
                Ok(sample)
            }
            Err(err) => {
                telemetry.stats.sample_errors += 1;
                Err(err)
            }
        }
    }

    /// Classifies the history window and switches strategy if the phase changed.
    ///
    /// With `abort_on_cancel`, a stop request that lands after classification
    /// abandons the switch; the worker passes `true`, inline callers `false`.
    pub(crate) fn adapt_once(&self, abort_on_cancel: bool) -> TickOutcome {
        let phase = {
            let mut telemetry = lock(&self.telemetry);
            let have = telemetry.history.len();
            let need = self.config.runtime.min_samples;
            let averaged = if have < need {
                None
            } else {
                average_features(telemetry.history.iter())
            };
            let Some(features) = averaged else {
                telemetry.stats.skipped_ticks += 1;
                tracing::trace!(have, need, "adaptation tick skipped");
                return TickOutcome::Skipped { have, need };
            };

            let window = PhaseMetrics::average(telemetry.history.iter().map(|e| &e.metrics));
            telemetry.last_window = window;
            let phase = PhaseClassifier::classify(&features);
            telemetry.stats.record_phase(phase);
            phase
        };

        if abort_on_cancel && self.is_cancelled() {
            return TickOutcome::Unchanged(phase);
        }
        match self.commit(phase) {
            Some(from) => TickOutcome::Switched { from, to: phase },
            None => TickOutcome::Unchanged(phase),
        }
    }

    /// Publishes the strategy planned for `phase`.
    ///
    /// Returns the previous phase if a switch happened. `Unknown` and the
    /// already active phase are no-ops.
    pub(crate) fn commit(&self, phase: ExecutionPhase) -> Option<ExecutionPhase> {
        let plan = PhasePolicy::plan_for(phase)?;
        let _guard = lock(&self.switch_lock);

        let current = self.published.load_full();
        if current.phase() == phase {
            return None;
        }

        let stride = current.settings().stride;
        let mut next = if current.strategy() == plan.strategy {
            current.prefetcher().clone()
        } else {
            AnyPrefetcher::new(plan.strategy, &self.config.prefetch)
        };
        next.reset();
        next.configure(plan.distance, stride);

        let generation = self.adaptations.load(Ordering::Relaxed) + 1;
        self.published.store(Arc::new(StrategySnapshot::new(
            phase,
            plan.degree,
            next,
            generation,
        )));
        let _ = self.adaptations.fetch_add(1, Ordering::AcqRel);

        let from = current.phase();
        if self.config.runtime.enable_logging {
            tracing::info!(%from, to = %phase, "phase transition: {from} -> {phase}");
        }
        tracing::debug!(
            strategy = %plan.strategy,
            distance = plan.distance,
            degree = plan.degree,
            stride,
            "prefetch strategy reconfigured"
        );
        Some(from)
    }
}

/// Closed-loop controller that matches the prefetch strategy to the
/// execution phase observed through hardware counters.
///
/// # Examples
///
/// ```
/// use morpheus_core::config::Config;
/// use morpheus_core::monitor::{ExecutionPhase, NullCounterSource};
/// use morpheus_core::prefetch::SequentialPrefetcher;
/// use morpheus_core::runtime::AdaptiveController;
///
/// let mut controller = AdaptiveController::new(
///     NullCounterSource,
///     SequentialPrefetcher::default(),
///     Config::default(),
/// ).unwrap();
///
/// // No counters: monitoring is off, the controller keeps working.
/// assert!(controller.start().is_err());
/// assert_eq!(controller.current_phase(), ExecutionPhase::Unknown);
///
/// let _ = controller.hint_phase(ExecutionPhase::PointerChasing);
/// assert_eq!(controller.current_prefetcher().settings().distance, 64);
/// ```
#[derive(Debug)]
pub struct AdaptiveController {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl AdaptiveController {
    /// Creates a controller in phase `Unknown` with `initial` as the active
    /// strategy. The counter source is not touched until [`start`](Self::start)
    /// or [`sample_now`](Self::sample_now).
    ///
    /// # Errors
    ///
    /// Returns the first configuration constraint `config` violates.
    pub fn new<S, P>(source: S, initial: P, config: Config) -> Result<Self, ConfigError>
    where
        S: CounterSource + 'static,
        P: Into<AnyPrefetcher>,
    {
        config.validate()?;

        let initial = StrategySnapshot::new(
            ExecutionPhase::Unknown,
            config.prefetch.default_degree,
            initial.into(),
            0,
        );
        let shared = Shared {
            sampler: Mutex::new(PerformanceSampler::new(Box::new(source))),
            telemetry: Mutex::new(Telemetry {
                history: HistoryBuffer::new(config.runtime.history_size),
                last_window: None,
                stats: RuntimeStats::default(),
            }),
            published: Arc::new(ArcSwap::from_pointee(initial)),
            switch_lock: Mutex::new(()),
            adaptations: AtomicU64::new(0),
            cancel: AtomicBool::new(false),
            config,
        };
        Ok(Self {
            shared: Arc::new(shared),
            worker: None,
        })
    }

    /// Starts the background sampling/adaptation loop and clears history.
    ///
    /// A no-op if the loop is already running.
    ///
    /// # Errors
    ///
    /// Returns the counter source's initialization failure. The controller
    /// stays usable with adaptation disabled: phase `Unknown`, strategy
    /// unchanged.
    pub fn start(&mut self) -> Result<(), MonitorError> {
        if self.worker.is_some() {
            return Ok(());
        }

        if let Err(err) = self.shared.ensure_monitoring() {
            tracing::warn!(%err, "telemetry unavailable, adaptation disabled");
            return Err(err);
        }

        lock(&self.shared.telemetry).history.clear();
        self.shared.cancel.store(false, Ordering::Release);

        let handle = worker::spawn(Arc::clone(&self.shared))
            .map_err(|source| MonitorError::Io { what: "spawn adaptation thread", source })?;
        self.worker = Some(handle);
        tracing::debug!(
            sampling_ms = self.shared.config.runtime.sampling_interval_ms,
            adaptation_ms = self.shared.config.runtime.adaptation_interval_ms,
            "adaptation loop started"
        );
        Ok(())
    }

    /// Stops the loop and waits for the worker to exit.
    ///
    /// Idempotent. The last published strategy stays active.
    pub fn stop(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        self.shared.cancel.store(true, Ordering::Release);
        handle.thread().unpark();
        if handle.join().is_err() {
            tracing::error!("adaptation thread panicked");
        }
        self.shared.cancel.store(false, Ordering::Release);
        tracing::debug!("adaptation loop stopped");
    }

    /// Whether the background loop is running.
    pub const fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Whether the counter source has been initialized successfully.
    pub fn is_monitoring(&self) -> bool {
        lock(&self.shared.sampler).is_initialized()
    }

    /// The latest committed phase. Lock-free.
    pub fn current_phase(&self) -> ExecutionPhase {
        self.shared.published.load().phase()
    }

    /// The latest committed snapshot. Lock-free.
    pub fn current_prefetcher(&self) -> Arc<StrategySnapshot> {
        self.shared.published.load_full()
    }

    /// A consumer handle following this controller's decisions.
    pub fn handle(&self) -> PrefetchHandle {
        PrefetchHandle::new(Arc::clone(&self.shared.published))
    }

    /// Applies the strategy for `phase` immediately, bypassing sampling.
    ///
    /// Returns `true` if a switch was published; `Unknown` or the current
    /// phase change nothing.
    pub fn hint_phase(&self, phase: ExecutionPhase) -> bool {
        self.shared.commit(phase).is_some()
    }

    /// Mean `prefetch_useful_rate` over the history window.
    ///
    /// `0.0` when fewer than two samples are held.
    pub fn effectiveness(&self) -> f64 {
        let telemetry = lock(&self.shared.telemetry);
        if telemetry.history.len() < MIN_SAMPLES_FOR_EFFECTIVENESS {
            return 0.0;
        }
        let total: f64 = telemetry
            .history
            .iter()
            .map(|e| e.metrics.prefetch_useful_rate)
            .sum();
        total / telemetry.history.len() as f64
    }

    /// The newest `count` per-sample metrics, oldest first.
    pub fn recent_metrics(&self, count: usize) -> Vec<PhaseMetrics> {
        lock(&self.shared.telemetry)
            .history
            .recent(count)
            .map(|e| e.metrics)
            .collect()
    }

    /// The window average computed by the last adaptation tick that ran.
    pub fn last_window_metrics(&self) -> Option<PhaseMetrics> {
        lock(&self.shared.telemetry).last_window
    }

    /// Number of entries currently in the history window.
    pub fn history_len(&self) -> usize {
        lock(&self.shared.telemetry).history.len()
    }

    /// Strategy switches committed so far.
    pub fn total_adaptations(&self) -> u64 {
        self.shared.adaptations.load(Ordering::Acquire)
    }

    /// Activity counters.
    pub fn stats(&self) -> RuntimeStats {
        let mut stats = lock(&self.shared.telemetry).stats.clone();
        stats.adaptations = self.total_adaptations();
        stats
    }

    /// The configuration this controller was built with.
    pub fn config(&self) -> &Config {
        self.shared.config()
    }

    /// Takes one sample on the caller's thread.
    ///
    /// Initializes the counter source on first use. Intended for inline
    /// adaptation when the background loop is not running.
    ///
    /// # Errors
    ///
    /// Returns the source's initialization or read failure.
    pub fn sample_now(&self) -> Result<PerformanceSample, MonitorError> {
        self.shared.ensure_monitoring()?;
        self.shared.sample_once()
    }

    /// Runs one adaptation tick on the caller's thread.
    pub fn adapt_now(&self) -> TickOutcome {
        self.shared.adapt_once(false)
    }
}

impl Drop for AdaptiveController {
    fn drop(&mut self) {
        self.stop();
    }
}
