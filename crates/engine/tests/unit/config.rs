//! Configuration Tests.
//!
//! Verifies defaults, JSON loading with partial documents, and every
//! validation rule.

use morpheus_core::config::Config;
use morpheus_core::ConfigError;
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════
// 1. Defaults
// ══════════════════════════════════════════════════════════

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();
    assert_eq!(config.runtime.sampling_interval_ms, 1);
    assert_eq!(config.runtime.adaptation_interval_ms, 10);
    assert_eq!(config.runtime.history_size, 1000);
    assert!(config.runtime.enable_logging);
    assert_eq!(config.runtime.min_samples, 10);
    assert_eq!(config.prefetch.line_bytes, 64);
    assert_eq!(config.prefetch.stride_window, 8);
    assert_eq!(config.prefetch.max_chain_length, 4);
    assert_eq!(config.prefetch.default_degree, 1);
    assert!(config.validate().is_ok());
}

#[test]
fn empty_document_is_all_defaults() {
    let config = Config::from_json("{}").unwrap();
    assert_eq!(config.runtime.history_size, 1000);
    assert_eq!(config.prefetch.stride_window, 8);
}

// ══════════════════════════════════════════════════════════
// 2. Validation
// ══════════════════════════════════════════════════════════

#[test]
fn zero_sampling_interval_rejected() {
    let err = Config::from_json(r#"{"runtime": {"sampling_interval_ms": 0}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::ZeroInterval { field: "sampling_interval_ms" }));
}

#[test]
fn adaptation_must_be_strictly_coarser() {
    let err = Config::from_json(
        r#"{"runtime": {"sampling_interval_ms": 10, "adaptation_interval_ms": 10}}"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::AdaptationNotCoarser {
            sampling_ms: 10,
            adaptation_ms: 10
        }
    ));
}

#[test]
fn zero_history_rejected() {
    let err = Config::from_json(r#"{"runtime": {"history_size": 0}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::ZeroHistory));
}

#[test]
fn history_must_hold_enough_samples_to_decide() {
    let err = Config::from_json(r#"{"runtime": {"history_size": 5}}"#).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::BoundTooSmall {
            field: "history_size",
            min: 10
        }
    ));

    let config =
        Config::from_json(r#"{"runtime": {"history_size": 5, "min_samples": 5}}"#).unwrap();
    assert_eq!(config.runtime.history_size, 5);
}

#[test]
fn stride_window_needs_two_addresses() {
    let err = Config::from_json(r#"{"prefetch": {"stride_window": 1}}"#).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::BoundTooSmall {
            field: "stride_window",
            min: 2
        }
    ));
}

#[test]
fn zero_chain_length_rejected() {
    let mut config = Config::default();
    config.prefetch.max_chain_length = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::BoundTooSmall {
            field: "max_chain_length",
            ..
        })
    ));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = Config::from_json("{ runtime: ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert!(err.to_string().starts_with("invalid configuration document"));
}
