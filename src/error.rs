//! Error taxonomy shared by every engine layer.

use thiserror::Error;

/// Conditions the engine reports instead of panicking.
///
/// Everything except `InvalidConfiguration` and `ConfigLoad` is an expected
/// runtime state ("cannot evaluate yet") and callers are meant to branch on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("insufficient price history for {instrument}: no sample {seconds}s old")]
    InsufficientHistory { instrument: String, seconds: u64 },

    #[error("signal for {instrument} expired after {age_seconds}s")]
    ExpiredSignal { instrument: String, age_seconds: i64 },

    #[error("insufficient sample size: {have} outcomes recorded, {need} required")]
    InsufficientSampleSize { have: usize, need: usize },

    #[error("average loss is zero with a win rate below 1.0")]
    ZeroAverageLoss,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to load configuration: {0}")]
    ConfigLoad(String),
}

impl EngineError {
    /// True for data conditions that clear up as more ticks or outcomes arrive.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::InsufficientHistory { .. } | EngineError::InsufficientSampleSize { .. }
        )
    }
}
