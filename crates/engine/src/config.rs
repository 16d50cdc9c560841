//! Configuration system for the adaptive prefetch controller.
//!
//! This module defines all configuration structures used to parameterize the
//! controller. It provides:
//! 1. **Defaults:** Baseline cadences, history depth, and predictor bounds.
//! 2. **Structures:** Runtime loop settings and prefetch-strategy tunables.
//! 3. **Validation:** Cross-field checks performed before a controller is built.
//!
//! Configuration is supplied as JSON (`Config::from_json`) or built with
//! `Config::default()` and adjusted field by field.

use serde::Deserialize;

use crate::common::constants;
use crate::common::error::ConfigError;

/// Default configuration constants.
///
/// These values apply whenever a field is omitted from the JSON document.
mod defaults {
    use crate::common::constants;

    /// Counter sampling cadence (1 ms).
    pub const SAMPLING_INTERVAL_MS: u64 = 1;

    /// Classify-and-switch cadence (10 ms). Must stay coarser than sampling.
    pub const ADAPTATION_INTERVAL_MS: u64 = 10;

    /// Number of samples retained in the history window.
    pub const HISTORY_SIZE: usize = 1000;

    /// Minimum samples before a tick may switch strategy.
    pub const MIN_SAMPLES: usize = constants::MIN_SAMPLES_FOR_DECISION;

    /// Prefetch stride when none is detected (one cache line).
    pub const LINE_BYTES: u64 = constants::CACHE_LINE_BYTES;

    /// Strided prefetcher address window.
    pub const STRIDE_WINDOW: usize = constants::STRIDE_WINDOW;

    /// IMA prefetcher successor-list bound.
    pub const MAX_CHAIN_LENGTH: usize = constants::MAX_CHAIN_LENGTH;

    /// Hint bases per call before any phase has been detected.
    pub const DEFAULT_DEGREE: usize = 1;
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use morpheus_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.runtime.sampling_interval_ms, 1);
/// assert_eq!(config.runtime.adaptation_interval_ms, 10);
/// assert_eq!(config.prefetch.stride_window, 8);
/// ```
///
/// Deserializing from JSON; omitted fields keep their defaults:
///
/// ```
/// use morpheus_core::config::Config;
///
/// let config = Config::from_json(r#"{
///     "runtime": { "adaptation_interval_ms": 25, "enable_logging": false },
///     "prefetch": { "max_chain_length": 6 }
/// }"#).unwrap();
/// assert_eq!(config.runtime.adaptation_interval_ms, 25);
/// assert_eq!(config.runtime.history_size, 1000);
/// assert_eq!(config.prefetch.max_chain_length, 6);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Sampling and adaptation loop settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Prefetch-strategy tunables.
    #[serde(default)]
    pub prefetch: PrefetchConfig,
}

impl Config {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and any validation
    /// error reported by [`Config::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.runtime.validate()?;
        self.prefetch.validate()
    }
}

/// Settings for the background sampling/adaptation loop.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// How often the counter source is read, in milliseconds.
    #[serde(default = "RuntimeConfig::default_sampling_interval_ms")]
    pub sampling_interval_ms: u64,

    /// How often the classify-and-switch step runs, in milliseconds.
    #[serde(default = "RuntimeConfig::default_adaptation_interval_ms")]
    pub adaptation_interval_ms: u64,

    /// Capacity of the history window.
    #[serde(default = "RuntimeConfig::default_history_size")]
    pub history_size: usize,

    /// Emit a log line on every phase transition.
    #[serde(default = "RuntimeConfig::default_enable_logging")]
    pub enable_logging: bool,

    /// Samples required before an adaptation tick is allowed to act.
    #[serde(default = "RuntimeConfig::default_min_samples")]
    pub min_samples: usize,
}

impl RuntimeConfig {
    fn default_sampling_interval_ms() -> u64 {
        defaults::SAMPLING_INTERVAL_MS
    }

    fn default_adaptation_interval_ms() -> u64 {
        defaults::ADAPTATION_INTERVAL_MS
    }

    fn default_history_size() -> usize {
        defaults::HISTORY_SIZE
    }

    fn default_enable_logging() -> bool {
        true
    }

    fn default_min_samples() -> usize {
        defaults::MIN_SAMPLES
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "sampling_interval_ms",
            });
        }
        if self.adaptation_interval_ms <= self.sampling_interval_ms {
            return Err(ConfigError::AdaptationNotCoarser {
                sampling_ms: self.sampling_interval_ms,
                adaptation_ms: self.adaptation_interval_ms,
            });
        }
        if self.history_size == 0 {
            return Err(ConfigError::ZeroHistory);
        }
        if self.min_samples == 0 {
            return Err(ConfigError::BoundTooSmall {
                field: "min_samples",
                min: 1,
            });
        }
        // A window that can never reach `min_samples` never adapts.
        if self.history_size < self.min_samples {
            return Err(ConfigError::BoundTooSmall {
                field: "history_size",
                min: self.min_samples,
            });
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            sampling_interval_ms: defaults::SAMPLING_INTERVAL_MS,
            adaptation_interval_ms: defaults::ADAPTATION_INTERVAL_MS,
            history_size: defaults::HISTORY_SIZE,
            enable_logging: true,
            min_samples: defaults::MIN_SAMPLES,
        }
    }
}

/// Tunables for the prefetch strategies.
///
/// The stride window and the successor-list bound have no principled value;
/// they are exposed here rather than baked into the strategies.
#[derive(Debug, Clone, Deserialize)]
pub struct PrefetchConfig {
    /// Element size assumed when no stride is known, in bytes.
    #[serde(default = "PrefetchConfig::default_line_bytes")]
    pub line_bytes: u64,

    /// Number of recent addresses the strided prefetcher inspects.
    #[serde(default = "PrefetchConfig::default_stride_window")]
    pub stride_window: usize,

    /// Maximum learned successors per base address for the IMA prefetcher.
    #[serde(default = "PrefetchConfig::default_max_chain_length")]
    pub max_chain_length: usize,

    /// Hint bases per call while the phase is still `Unknown`.
    #[serde(default = "PrefetchConfig::default_degree")]
    pub default_degree: usize,
}

impl PrefetchConfig {
    fn default_line_bytes() -> u64 {
        defaults::LINE_BYTES
    }

    fn default_stride_window() -> usize {
        defaults::STRIDE_WINDOW
    }

    fn default_max_chain_length() -> usize {
        defaults::MAX_CHAIN_LENGTH
    }

    fn default_degree() -> usize {
        defaults::DEFAULT_DEGREE
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.line_bytes == 0 {
            return Err(ConfigError::BoundTooSmall {
                field: "line_bytes",
                min: 1,
            });
        }
        // Two addresses are needed to form a single delta.
        if self.stride_window < 2 {
            return Err(ConfigError::BoundTooSmall {
                field: "stride_window",
                min: 2,
            });
        }
        if self.max_chain_length == 0 {
            return Err(ConfigError::BoundTooSmall {
                field: "max_chain_length",
                min: 1,
            });
        }
        if self.default_degree == 0 {
            return Err(ConfigError::BoundTooSmall {
                field: "default_degree",
                min: 1,
            });
        }
        Ok(())
    }
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            line_bytes: defaults::LINE_BYTES,
            stride_window: defaults::STRIDE_WINDOW,
            max_chain_length: defaults::MAX_CHAIN_LENGTH,
            default_degree: defaults::DEFAULT_DEGREE,
        }
    }
}

/// Smallest line size a strategy will accept; guards `configure(_, 0)`.
pub(crate) const MIN_STRIDE: u64 = 1;

/// Returns `stride`, or the default line size when `stride` is zero.
pub(crate) const fn stride_or_line(stride: u64) -> u64 {
    if stride < MIN_STRIDE {
        constants::CACHE_LINE_BYTES
    } else {
        stride
    }
}
