//! ERM (Enigma Reversal Momentum) detector
//!
//! momentum_velocity = (P_current - P_n) / T_elapsed   (price change per minute)
//! ERM = (P_current - E_price) * momentum_velocity
//!
//! A LONG signal triggers when ERM > threshold, a SHORT signal when
//! ERM < -threshold, with threshold = atr_multiplier * ATR. Both comparisons
//! are strict.
//!
//! Only a signal older than `max_validity_seconds` is reported as `Expired`
//! and should be discarded. A signal younger than `min_time_elapsed_seconds`
//! is not stale, it just has not aged enough to measure, so it reports
//! `InsufficientHistory` and stays open.

use crate::common::math;
use crate::config::{EngineConfig, ReversalConfig};
use crate::error::EngineError;
use crate::indicators::history::{PriceHistoryBuffer, RecordStatus};
use crate::models::market::{Direction, PriceTick, SignalEvent};
use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErmReason {
    Ok,
    InsufficientHistory,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErmResult {
    pub triggered: bool,
    pub erm_value: f64,
    pub reason: ErmReason,
    pub momentum_velocity: f64,
    /// `None` when no usable ATR was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl ErmResult {
    fn not_evaluated(reason: ErmReason) -> Self {
        Self {
            triggered: false,
            erm_value: 0.0,
            reason,
            momentum_velocity: 0.0,
            threshold: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.reason == ErmReason::Expired
    }
}

/// Price change per minute between the lookback sample and now.
pub fn momentum_velocity(current_price: f64, lookback_price: f64, elapsed_minutes: f64) -> f64 {
    (current_price - lookback_price) / elapsed_minutes
}

pub fn erm_score(current_price: f64, entry_price: f64, velocity: f64) -> f64 {
    (current_price - entry_price) * velocity
}

pub fn is_triggered(direction: Direction, erm: f64, threshold: f64) -> bool {
    match direction {
        Direction::Long => erm > threshold,
        Direction::Short => erm < -threshold,
    }
}

#[derive(Debug, Clone, Copy)]
struct Reading {
    erm: f64,
    velocity: f64,
}

/// Watches signals for price moving against them faster than volatility explains.
///
/// Owns the price history it evaluates against.
#[derive(Debug, Clone)]
pub struct ReversalMomentumDetector {
    config: ReversalConfig,
    history: PriceHistoryBuffer,
}

impl ReversalMomentumDetector {
    pub fn new(config: ReversalConfig, history_window_seconds: u64) -> Self {
        Self {
            config,
            history: PriceHistoryBuffer::new(history_window_seconds),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.reversal.clone(), config.history.window_seconds)
    }

    pub fn record(&mut self, tick: &PriceTick) -> RecordStatus {
        self.history.record(&tick.instrument, tick.price, tick.timestamp)
    }

    pub fn history(&self) -> &PriceHistoryBuffer {
        &self.history
    }

    pub fn config(&self) -> &ReversalConfig {
        &self.config
    }

    /// Evaluate `signal` against the newest tick of its instrument.
    ///
    /// Insufficient data and expiry are reported through `reason`; a signal
    /// reported as expired should be discarded by the caller.
    pub fn evaluate(&self, signal: &SignalEvent, atr: Option<f64>) -> ErmResult {
        let reading = match self.read(signal) {
            Ok(reading) => reading,
            Err(EngineError::ExpiredSignal { .. }) => return ErmResult::not_evaluated(ErmReason::Expired),
            Err(_) => return ErmResult::not_evaluated(ErmReason::InsufficientHistory),
        };

        let threshold = atr
            .filter(|a| a.is_finite() && *a > 0.0)
            .map(|a| self.config.atr_multiplier * a);

        match threshold {
            Some(threshold) => ErmResult {
                triggered: is_triggered(signal.direction, reading.erm, threshold),
                erm_value: reading.erm,
                reason: ErmReason::Ok,
                momentum_velocity: reading.velocity,
                threshold: Some(threshold),
            },
            None => ErmResult {
                triggered: false,
                erm_value: reading.erm,
                reason: ErmReason::InsufficientHistory,
                momentum_velocity: reading.velocity,
                threshold: None,
            },
        }
    }

    fn read(&self, signal: &SignalEvent) -> Result<Reading, EngineError> {
        let instrument = signal.instrument.as_str();
        let insufficient = |seconds: u64| EngineError::InsufficientHistory {
            instrument: instrument.to_string(),
            seconds,
        };

        let latest = self.history.latest(instrument).ok_or_else(|| insufficient(0))?;

        let age = signal.age(latest.timestamp);
        if age > Duration::seconds(self.config.max_validity_seconds as i64) {
            return Err(EngineError::ExpiredSignal {
                instrument: instrument.to_string(),
                age_seconds: age.num_seconds(),
            });
        }
        let min_elapsed = Duration::seconds(self.config.min_time_elapsed_seconds as i64);
        // Too young to measure; not expired.
        if age < min_elapsed {
            return Err(insufficient(self.config.min_time_elapsed_seconds));
        }

        let lookback = self
            .history
            .sample_n_seconds_ago(instrument, self.config.lookback_seconds)?;

        let elapsed = latest.timestamp - lookback.timestamp;
        if elapsed < min_elapsed || elapsed <= Duration::zero() {
            return Err(insufficient(self.config.min_time_elapsed_seconds));
        }

        let velocity = momentum_velocity(latest.price, lookback.price, math::duration_minutes(elapsed));
        Ok(Reading {
            erm: erm_score(latest.price, signal.entry_price, velocity),
            velocity,
        })
    }
}
