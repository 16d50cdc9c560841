//! Adaptive Controller Tests.
//!
//! Drives the controller inline (`sample_now` / `adapt_now`) for exact
//! switching behavior, and through the background loop for lifecycle.

use std::thread;
use std::time::{Duration, Instant};

use morpheus_core::config::Config;
use morpheus_core::monitor::{ExecutionPhase, NullCounterSource};
use morpheus_core::prefetch::{PrefetchStrategy, SequentialPrefetcher};
use morpheus_core::runtime::{AdaptiveController, TickOutcome};
use morpheus_core::{ConfigError, MonitorError};
use pretty_assertions::assert_eq;

use crate::common::builder::{dense_counters, fast_config, pointer_counters, sparse_counters};
use crate::common::{capture_logs, init_tracing};
use crate::common::mocks::{MockCounters, ScriptedSource};

use ExecutionPhase::{DenseSequential, PointerChasing, SparseRandom, Unknown};

fn controller_with(source: ScriptedSource, config: Config) -> AdaptiveController {
    AdaptiveController::new(source, SequentialPrefetcher::default(), config).unwrap()
}

fn wait_for(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    done()
}

// ══════════════════════════════════════════════════════════
// 1. Construction
// ══════════════════════════════════════════════════════════

#[test]
fn starts_unknown_with_supplied_strategy() {
    let controller = AdaptiveController::new(
        NullCounterSource,
        SequentialPrefetcher::new(7, 32),
        Config::default(),
    )
    .unwrap();
    let snapshot = controller.current_prefetcher();
    assert_eq!(controller.current_phase(), Unknown);
    assert_eq!(snapshot.strategy(), PrefetchStrategy::Sequential);
    assert_eq!(snapshot.settings().distance, 7);
    assert_eq!(snapshot.settings().stride, 32);
    assert_eq!(snapshot.settings().degree, 1);
    assert_eq!(snapshot.generation(), 0);
    assert_eq!(controller.total_adaptations(), 0);
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = Config::default();
    config.runtime.adaptation_interval_ms = 1;
    let err = AdaptiveController::new(NullCounterSource, SequentialPrefetcher::default(), config)
        .unwrap_err();
    assert!(matches!(err, ConfigError::AdaptationNotCoarser { .. }));
}

// ══════════════════════════════════════════════════════════
// 2. Adaptation ticks
// ══════════════════════════════════════════════════════════

#[test]
fn tick_waits_for_enough_history() {
    let controller = controller_with(ScriptedSource::constant(dense_counters()), Config::default());
    for _ in 0..9 {
        let _ = controller.sample_now().unwrap();
    }
    assert_eq!(controller.adapt_now(), TickOutcome::Skipped { have: 9, need: 10 });
    assert_eq!(controller.current_phase(), Unknown);
    assert_eq!(controller.stats().skipped_ticks, 1);
}

#[test]
fn dense_window_switches_exactly_once() {
    init_tracing();
    let controller = controller_with(ScriptedSource::constant(dense_counters()), Config::default());
    for _ in 0..12 {
        let _ = controller.sample_now().unwrap();
    }

    assert_eq!(
        controller.adapt_now(),
        TickOutcome::Switched {
            from: Unknown,
            to: DenseSequential
        }
    );
    assert_eq!(controller.adapt_now(), TickOutcome::Unchanged(DenseSequential));
    assert_eq!(controller.total_adaptations(), 1);

    let snapshot = controller.current_prefetcher();
    assert_eq!(snapshot.phase(), DenseSequential);
    assert_eq!(snapshot.strategy(), PrefetchStrategy::Sequential);
    assert_eq!(snapshot.settings().distance, 256);
    assert_eq!(snapshot.settings().degree, 4);
    assert_eq!(snapshot.generation(), 1);
}

#[test]
fn phase_change_selects_mapped_strategy() {
    let mut config = Config::default();
    config.runtime.history_size = 10;
    let source = ScriptedSource::new(std::iter::repeat_n(dense_counters(), 10));
    let script = source.clone();
    let controller = controller_with(source, config);

    for _ in 0..10 {
        let _ = controller.sample_now().unwrap();
    }
    assert!(matches!(controller.adapt_now(), TickOutcome::Switched { .. }));

    for _ in 0..10 {
        script.push(sparse_counters());
    }
    for _ in 0..10 {
        let _ = controller.sample_now().unwrap();
    }
    assert_eq!(
        controller.adapt_now(),
        TickOutcome::Switched {
            from: DenseSequential,
            to: SparseRandom
        }
    );
    let snapshot = controller.current_prefetcher();
    assert_eq!(snapshot.strategy(), PrefetchStrategy::Strided);
    assert_eq!(snapshot.settings().distance, 128);
    assert_eq!(snapshot.settings().degree, 2);
    assert_eq!(controller.total_adaptations(), 2);
    assert!(controller.last_window_metrics().is_some());
}

#[test]
fn tick_classifies_window_average() {
    let mut config = Config::default();
    config.runtime.history_size = 10;
    let readings = std::iter::repeat_n(pointer_counters(), 9).chain([dense_counters()]);
    let controller = controller_with(ScriptedSource::new(readings), config);
    for _ in 0..10 {
        let _ = controller.sample_now().unwrap();
    }
    assert_eq!(
        controller.adapt_now(),
        TickOutcome::Switched {
            from: Unknown,
            to: PointerChasing
        }
    );
}

// ══════════════════════════════════════════════════════════
// 3. Manual phase hints
// ══════════════════════════════════════════════════════════

#[test]
fn hint_phase_applies_immediately() {
    init_tracing();
    let controller = AdaptiveController::new(
        NullCounterSource,
        SequentialPrefetcher::new(1, 16),
        Config::default(),
    )
    .unwrap();

    assert!(controller.hint_phase(DenseSequential));
    assert!(!controller.hint_phase(DenseSequential));
    assert!(!controller.hint_phase(Unknown));
    assert!(controller.hint_phase(PointerChasing));

    let snapshot = controller.current_prefetcher();
    assert_eq!(controller.current_phase(), PointerChasing);
    assert_eq!(snapshot.strategy(), PrefetchStrategy::Ima);
    assert_eq!(snapshot.settings().distance, 64);
    assert_eq!(snapshot.settings().degree, 1);
    // element size survives switches
    assert_eq!(snapshot.settings().stride, 16);
    assert_eq!(controller.total_adaptations(), 2);
    assert_eq!(controller.stats().adaptations, 2);
}

#[test]
fn handle_follows_switches_and_trains_chains() {
    let controller =
        AdaptiveController::new(NullCounterSource, SequentialPrefetcher::default(), Config::default())
            .unwrap();
    let mut handle = controller.handle();
    assert!(handle.ima_mut().is_none());

    let _ = controller.hint_phase(PointerChasing);
    assert_eq!(handle.phase(), Unknown);
    assert!(handle.refresh());
    assert_eq!(handle.phase(), PointerChasing);

    let ima = handle.ima_mut().unwrap();
    ima.learn_pointer_chain(0x1000, 0x9000);
    let mut hints = Vec::new();
    handle.prefetch_into(&[0x1000, 0x2000], 2, &mut hints);
    // degree 1: only the first base is used
    assert_eq!(hints, vec![0x9000]);

    // a new snapshot drops the handle's learned chains
    let _ = controller.hint_phase(DenseSequential);
    let _ = controller.hint_phase(PointerChasing);
    assert!(handle.refresh());
    assert_eq!(handle.ima_mut().map(|p| p.learned_bases()), Some(0));
}

// ══════════════════════════════════════════════════════════
// 4. Transition logging
// ══════════════════════════════════════════════════════════

#[test]
fn transition_is_logged_when_enabled() {
    let controller =
        AdaptiveController::new(NullCounterSource, SequentialPrefetcher::default(), Config::default())
            .unwrap();
    let logs = capture_logs(|| {
        assert!(controller.hint_phase(DenseSequential));
        assert!(controller.hint_phase(PointerChasing));
    });
    assert!(logs.contains("phase transition: UNKNOWN -> DENSE_SEQUENTIAL"), "{logs}");
    assert!(logs.contains("phase transition: DENSE_SEQUENTIAL -> POINTER_CHASING"), "{logs}");
}

#[test]
fn transition_is_silent_when_disabled() {
    let mut config = Config::default();
    config.runtime.enable_logging = false;
    let controller =
        AdaptiveController::new(NullCounterSource, SequentialPrefetcher::default(), config).unwrap();
    let logs = capture_logs(|| {
        assert!(controller.hint_phase(SparseRandom));
    });
    assert!(!logs.contains("phase transition"), "{logs}");
    assert_eq!(controller.current_phase(), SparseRandom);
}

// ══════════════════════════════════════════════════════════
// 5. Introspection
// ══════════════════════════════════════════════════════════

#[test]
fn effectiveness_needs_two_samples() {
    let controller = controller_with(ScriptedSource::constant(dense_counters()), Config::default());
    assert_eq!(controller.effectiveness(), 0.0);
    let _ = controller.sample_now().unwrap();
    assert_eq!(controller.effectiveness(), 0.0);
    let _ = controller.sample_now().unwrap();
    assert!((controller.effectiveness() - 900.0 / 1001.0).abs() < 1e-12);
}

#[test]
fn recent_metrics_returns_newest_oldest_first() {
    let controller = controller_with(ScriptedSource::constant(dense_counters()), Config::default());
    for _ in 0..5 {
        let _ = controller.sample_now().unwrap();
    }
    let recent = controller.recent_metrics(3);
    assert_eq!(recent.len(), 3);
    assert!(recent.windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
    assert_eq!(controller.recent_metrics(100).len(), 5);
    assert_eq!(controller.stats().samples, 5);
}

// ══════════════════════════════════════════════════════════
// 6. Unavailable telemetry
// ══════════════════════════════════════════════════════════

#[test]
fn unavailable_telemetry_degrades_to_off() {
    let mut controller =
        AdaptiveController::new(NullCounterSource, SequentialPrefetcher::default(), Config::default())
            .unwrap();
    assert!(matches!(controller.start(), Err(MonitorError::Unsupported)));
    assert!(!controller.is_running());
    assert!(!controller.is_monitoring());
    assert!(controller.sample_now().is_err());
    assert_eq!(controller.adapt_now(), TickOutcome::Skipped { have: 0, need: 10 });
    assert_eq!(controller.current_phase(), Unknown);
    assert_eq!(controller.effectiveness(), 0.0);

    let mut handle = controller.handle();
    let mut hints = Vec::new();
    handle.prefetch_into(&[0x4000], 1, &mut hints);
    assert_eq!(hints, vec![0x4040]);
    controller.stop();
}

// ══════════════════════════════════════════════════════════
// 7. Background loop
// ══════════════════════════════════════════════════════════

#[test]
fn loop_detects_dense_phase() {
    init_tracing();
    let mut controller = controller_with(ScriptedSource::constant(dense_counters()), fast_config());
    controller.start().unwrap();
    assert!(controller.is_running());
    assert!(wait_for(Duration::from_secs(5), || controller.current_phase() == DenseSequential));
    controller.stop();

    assert!(!controller.is_running());
    assert_eq!(controller.current_phase(), DenseSequential);
    assert_eq!(controller.total_adaptations(), 1);
    assert!(controller.stats().samples >= 10);
}

#[test]
fn start_and_stop_are_idempotent() {
    let mut mock = MockCounters::new();
    let _ = mock.expect_initialize().times(1).returning(|_| Ok(()));
    let _ = mock.expect_read_counters().returning(|| Ok(dense_counters()));
    let mut controller =
        AdaptiveController::new(mock, SequentialPrefetcher::default(), fast_config()).unwrap();

    controller.stop();
    controller.start().unwrap();
    controller.start().unwrap();
    controller.stop();
    controller.stop();
    controller.start().unwrap();
    controller.stop();
    assert!(!controller.is_running());
}

#[test]
fn start_clears_history() {
    let mut config = Config::default();
    config.runtime.sampling_interval_ms = 1_000;
    config.runtime.adaptation_interval_ms = 2_000;
    let mut controller = controller_with(ScriptedSource::constant(dense_counters()), config);
    for _ in 0..5 {
        let _ = controller.sample_now().unwrap();
    }
    controller.start().unwrap();
    assert!(controller.history_len() <= 1);
    controller.stop();
}

#[test]
fn stop_keeps_last_strategy_and_drop_joins() {
    let mut controller = controller_with(ScriptedSource::constant(dense_counters()), fast_config());
    controller.start().unwrap();
    let _ = controller.hint_phase(SparseRandom);
    controller.stop();
    let phase = controller.current_phase();
    assert_ne!(phase, Unknown);
    assert_eq!(controller.current_prefetcher().phase(), phase);

    controller.start().unwrap();
    drop(controller);
}

#[test]
fn inline_adaptation_works_after_stop() {
    let mut controller = controller_with(ScriptedSource::constant(dense_counters()), fast_config());
    controller.start().unwrap();
    controller.stop();
    assert!(controller.hint_phase(PointerChasing));

    for _ in 0..12 {
        let _ = controller.sample_now().unwrap();
    }
    assert_eq!(
        controller.adapt_now(),
        TickOutcome::Switched {
            from: PointerChasing,
            to: DenseSequential
        }
    );
    assert_eq!(controller.current_phase(), DenseSequential);
}
