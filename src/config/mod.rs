//! Engine configuration: defaults, loading and validation.
//!
//! Configuration is validated once at load time. A config that fails
//! [`EngineConfig::validate`] must stop the process from starting.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;

/// Current deployment environment (`APP_ENV`), defaulting to `sandbox`.
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

/// Price history retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub window_seconds: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { window_seconds: 120 }
    }
}

/// ERM detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReversalConfig {
    pub lookback_seconds: u64,
    pub min_time_elapsed_seconds: u64,
    pub max_validity_seconds: u64,
    pub atr_multiplier: f64,
    /// Number of completed bars averaged by the tick-driven ATR.
    pub atr_period: usize,
    pub atr_bar_seconds: u64,
}

impl Default for ReversalConfig {
    fn default() -> Self {
        Self {
            lookback_seconds: 60,
            min_time_elapsed_seconds: 30,
            max_validity_seconds: 300,
            atr_multiplier: 0.5,
            atr_period: 14,
            atr_bar_seconds: 60,
        }
    }
}

/// Kelly sizing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KellyConfig {
    pub sample_window: usize,
    pub min_sample_size: usize,
    pub risk_adjustment: f64,
    pub max_kelly_fraction: f64,
    /// Fraction used when the Kelly estimate is undefined.
    pub fallback_fraction: f64,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            sample_window: 100,
            min_sample_size: 5,
            risk_adjustment: 0.3,
            max_kelly_fraction: 0.20,
            fallback_fraction: 0.05,
        }
    }
}

/// Decision gate thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub caution_dollar_threshold: f64,
    pub caution_probability_threshold: f64,
    pub skip_probability_threshold: f64,
    pub caution_size_multiplier: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            caution_dollar_threshold: 300.0,
            caution_probability_threshold: 0.60,
            skip_probability_threshold: 0.50,
            caution_size_multiplier: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub history: HistoryConfig,
    pub reversal: ReversalConfig,
    pub kelly: KellyConfig,
    pub gate: GateConfig,
}

impl EngineConfig {
    /// Parse a JSON document. Missing sections and fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        serde_json::from_str(raw).map_err(|e| EngineError::ConfigLoad(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    /// Build a validated config from `ENGINE_CONFIG_PATH` (if set) plus
    /// per-field environment overrides.
    pub fn from_env() -> Result<Self, EngineError> {
        let mut config = match env::var("ENGINE_CONFIG_PATH") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };

        override_from_env("HISTORY_WINDOW_SECONDS", &mut config.history.window_seconds)?;

        let reversal = &mut config.reversal;
        override_from_env("ERM_LOOKBACK_SECONDS", &mut reversal.lookback_seconds)?;
        override_from_env("ERM_MIN_ELAPSED_SECONDS", &mut reversal.min_time_elapsed_seconds)?;
        override_from_env("ERM_MAX_VALIDITY_SECONDS", &mut reversal.max_validity_seconds)?;
        override_from_env("ERM_ATR_MULTIPLIER", &mut reversal.atr_multiplier)?;
        override_from_env("ATR_PERIOD", &mut reversal.atr_period)?;
        override_from_env("ATR_BAR_SECONDS", &mut reversal.atr_bar_seconds)?;

        let kelly = &mut config.kelly;
        override_from_env("KELLY_SAMPLE_WINDOW", &mut kelly.sample_window)?;
        override_from_env("KELLY_MIN_SAMPLE_SIZE", &mut kelly.min_sample_size)?;
        override_from_env("KELLY_RISK_ADJUSTMENT", &mut kelly.risk_adjustment)?;
        override_from_env("KELLY_MAX_FRACTION", &mut kelly.max_kelly_fraction)?;
        override_from_env("KELLY_FALLBACK_FRACTION", &mut kelly.fallback_fraction)?;

        let gate = &mut config.gate;
        override_from_env("GATE_CAUTION_DOLLARS", &mut gate.caution_dollar_threshold)?;
        override_from_env("GATE_CAUTION_PROBABILITY", &mut gate.caution_probability_threshold)?;
        override_from_env("GATE_SKIP_PROBABILITY", &mut gate.skip_probability_threshold)?;
        override_from_env("GATE_CAUTION_SIZE_MULTIPLIER", &mut gate.caution_size_multiplier)?;

        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range or contradictory settings.
    pub fn validate(&self) -> Result<(), EngineError> {
        let h = &self.history;
        let r = &self.reversal;
        let k = &self.kelly;
        let g = &self.gate;

        ensure(
            (60..=300).contains(&h.window_seconds),
            format!("history window must be 60-300s, got {}", h.window_seconds),
        )?;
        ensure(
            (60..=120).contains(&r.lookback_seconds),
            format!("lookback must be 60-120s, got {}", r.lookback_seconds),
        )?;
        ensure(
            r.lookback_seconds <= h.window_seconds,
            format!(
                "lookback ({}s) exceeds history window ({}s)",
                r.lookback_seconds, h.window_seconds
            ),
        )?;
        ensure(
            r.min_time_elapsed_seconds > 0,
            "min_time_elapsed_seconds must be positive".to_string(),
        )?;
        ensure(
            r.min_time_elapsed_seconds < r.max_validity_seconds,
            format!(
                "min elapsed ({}s) must be below max validity ({}s)",
                r.min_time_elapsed_seconds, r.max_validity_seconds
            ),
        )?;
        ensure(
            in_range(r.atr_multiplier, 0.25, 0.5),
            format!("atr_multiplier must be in [0.25, 0.5], got {}", r.atr_multiplier),
        )?;
        ensure(r.atr_period >= 1, "atr_period must be at least 1".to_string())?;
        ensure(r.atr_bar_seconds >= 1, "atr_bar_seconds must be at least 1".to_string())?;

        ensure(k.min_sample_size >= 1, "min_sample_size must be at least 1".to_string())?;
        ensure(
            k.min_sample_size <= k.sample_window,
            format!(
                "min_sample_size ({}) exceeds sample_window ({})",
                k.min_sample_size, k.sample_window
            ),
        )?;
        ensure(
            k.risk_adjustment > 0.0 && k.risk_adjustment <= 1.0,
            format!("risk_adjustment must be in (0, 1], got {}", k.risk_adjustment),
        )?;
        ensure(
            k.max_kelly_fraction > 0.0 && k.max_kelly_fraction <= 1.0,
            format!("max_kelly_fraction must be in (0, 1], got {}", k.max_kelly_fraction),
        )?;
        ensure(
            in_range(k.fallback_fraction, 0.0, k.max_kelly_fraction),
            format!(
                "fallback_fraction must be in [0, {}], got {}",
                k.max_kelly_fraction, k.fallback_fraction
            ),
        )?;

        ensure(
            g.caution_dollar_threshold.is_finite() && g.caution_dollar_threshold >= 0.0,
            format!("caution_dollar_threshold must be >= 0, got {}", g.caution_dollar_threshold),
        )?;
        ensure(
            in_range(g.caution_probability_threshold, 0.0, 1.0),
            format!(
                "caution_probability_threshold must be in [0, 1], got {}",
                g.caution_probability_threshold
            ),
        )?;
        ensure(
            in_range(g.skip_probability_threshold, 0.0, 1.0),
            format!(
                "skip_probability_threshold must be in [0, 1], got {}",
                g.skip_probability_threshold
            ),
        )?;
        ensure(
            g.skip_probability_threshold <= g.caution_probability_threshold,
            format!(
                "skip threshold ({}) must not exceed caution threshold ({})",
                g.skip_probability_threshold, g.caution_probability_threshold
            ),
        )?;
        ensure(
            in_range(g.caution_size_multiplier, 0.0, 1.0),
            format!(
                "caution_size_multiplier must be in [0, 1], got {}",
                g.caution_size_multiplier
            ),
        )?;

        Ok(())
    }
}

fn ensure(condition: bool, message: String) -> Result<(), EngineError> {
    if condition {
        Ok(())
    } else {
        Err(EngineError::InvalidConfiguration(message))
    }
}

// NaN fails both comparisons, so it is rejected here too.
fn in_range(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}

fn override_from_env<T: FromStr>(key: &str, target: &mut T) -> Result<(), EngineError> {
    if let Ok(raw) = env::var(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| EngineError::ConfigLoad(format!("{} has unparseable value {:?}", key, raw)))?;
    }
    Ok(())
}
