//! Fractional Kelly sizing over a rolling window of trade outcomes.
//!
//! b = avg_win / avg_loss
//! kelly = (b * win_rate - (1 - win_rate)) / b
//! capped = clamp(kelly * risk_adjustment, 0, max_kelly_fraction)

use crate::common::math;
use crate::config::KellyConfig;
use crate::error::EngineError;
use crate::models::outcome::TradeOutcome;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Statistics a Kelly estimate was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KellyBasis {
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KellyResult {
    /// Raw Kelly fraction, may be negative.
    pub fraction: f64,
    /// Risk-adjusted fraction clamped to `[0, max_kelly_fraction]`.
    pub capped_fraction: f64,
    pub basis: KellyBasis,
}

/// Raw Kelly fraction. `None` when `avg_loss` is not positive.
///
/// A zero average win has no payoff and is reported as 0.
pub fn kelly_fraction(win_rate: f64, avg_win: f64, avg_loss: f64) -> Option<f64> {
    if !avg_loss.is_finite() || avg_loss <= 0.0 {
        return None;
    }
    let b = avg_win / avg_loss;
    if b.is_nan() || b <= 0.0 {
        return Some(0.0);
    }
    Some((b * win_rate - (1.0 - win_rate)) / b)
}

/// Apply the fractional-Kelly multiplier and clamp to `[0, max_fraction]`.
pub fn cap_fraction(kelly: f64, risk_adjustment: f64, max_fraction: f64) -> f64 {
    let adjusted = kelly * risk_adjustment;
    if adjusted.is_nan() {
        return 0.0;
    }
    adjusted.clamp(0.0, max_fraction)
}

/// Keeps the last `sample_window` outcomes (FIFO) for one strategy/instrument.
#[derive(Debug, Clone)]
pub struct KellyPositionSizer {
    config: KellyConfig,
    outcomes: VecDeque<TradeOutcome>,
}

impl KellyPositionSizer {
    pub fn new(config: KellyConfig) -> Self {
        let capacity = config.sample_window;
        Self {
            config,
            outcomes: VecDeque::with_capacity(capacity),
        }
    }

    pub fn record_outcome(&mut self, outcome: TradeOutcome) {
        self.outcomes.push_back(outcome);
        while self.outcomes.len() > self.config.sample_window {
            self.outcomes.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &TradeOutcome> {
        self.outcomes.iter()
    }

    pub fn config(&self) -> &KellyConfig {
        &self.config
    }

    fn require_sample(&self) -> Result<usize, EngineError> {
        let n = self.outcomes.len();
        if n < self.config.min_sample_size {
            return Err(EngineError::InsufficientSampleSize {
                have: n,
                need: self.config.min_sample_size,
            });
        }
        Ok(n)
    }

    /// Share of winning outcomes in the window.
    pub fn win_rate(&self) -> Result<f64, EngineError> {
        let n = self.require_sample()?;
        let wins = self.outcomes.iter().filter(|o| o.won).count();
        Ok(wins as f64 / n as f64)
    }

    /// Kelly estimate for the current window.
    ///
    /// `InsufficientSampleSize` and `ZeroAverageLoss` mean "use fallback sizing".
    /// With no losing trades at all and a perfect record, the cap is returned.
    pub fn calculate_kelly(&self) -> Result<KellyResult, EngineError> {
        let n = self.require_sample()?;
        let win_rate = self.win_rate()?;

        let avg_win = math::mean(self.outcomes.iter().filter(|o| o.won).map(|o| o.win_amount)).unwrap_or(0.0);
        let avg_loss =
            math::mean(self.outcomes.iter().filter(|o| !o.won).map(|o| o.loss_amount.abs())).unwrap_or(0.0);

        let basis = KellyBasis {
            win_rate,
            avg_win,
            avg_loss,
            n,
        };

        if avg_loss == 0.0 {
            if win_rate == 1.0 {
                return Ok(KellyResult {
                    fraction: 1.0,
                    capped_fraction: self.config.max_kelly_fraction,
                    basis,
                });
            }
            return Err(EngineError::ZeroAverageLoss);
        }

        let fraction = kelly_fraction(win_rate, avg_win, avg_loss).ok_or(EngineError::ZeroAverageLoss)?;
        let capped_fraction = cap_fraction(fraction, self.config.risk_adjustment, self.config.max_kelly_fraction);

        Ok(KellyResult {
            fraction,
            capped_fraction,
            basis,
        })
    }
}
