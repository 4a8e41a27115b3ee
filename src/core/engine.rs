//! Coordinating context that owns all per-instrument state.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::indicators::history::RecordStatus;
use crate::indicators::momentum::{ErmResult, ReversalMomentumDetector};
use crate::indicators::volatility::RollingAtr;
use crate::metrics::Metrics;
use crate::models::decision::Decision;
use crate::models::market::{PriceTick, SignalEvent};
use crate::models::outcome::TradeOutcome;
use crate::models::risk::RiskBudget;
use crate::signals::decision::{DecisionGate, GateInputs};
use crate::sizing::kelly::{KellyPositionSizer, KellyResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A signal whose ERM crossed its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReversalEvent {
    pub signal: SignalEvent,
    pub result: ErmResult,
}

/// Everything one tick caused.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub status: RecordStatus,
    pub reversals: Vec<ReversalEvent>,
    pub expired: Vec<SignalEvent>,
}

impl TickReport {
    fn unchanged(status: RecordStatus) -> Self {
        Self {
            status,
            reversals: Vec::new(),
            expired: Vec::new(),
        }
    }
}

/// Owns the detector, per-instrument ATR and outcome windows, open signals
/// and the account risk budget. Instruments never share state.
pub struct SizingEngine {
    config: EngineConfig,
    detector: ReversalMomentumDetector,
    gate: DecisionGate,
    atr: HashMap<String, RollingAtr>,
    atr_overrides: HashMap<String, f64>,
    signals: HashMap<String, Vec<SignalEvent>>,
    sizers: HashMap<String, KellyPositionSizer>,
    budget: RiskBudget,
    metrics: Option<Arc<Metrics>>,
}

impl SizingEngine {
    /// Fails with `InvalidConfiguration` if the config does not validate.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            detector: ReversalMomentumDetector::from_config(&config),
            gate: DecisionGate::from_config(&config),
            config,
            atr: HashMap::new(),
            atr_overrides: HashMap::new(),
            signals: HashMap::new(),
            sizers: HashMap::new(),
            budget: RiskBudget::default(),
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_budget(mut self, budget: RiskBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn detector(&self) -> &ReversalMomentumDetector {
        &self.detector
    }

    /// Record a tick and re-evaluate the instrument's open signals.
    ///
    /// Triggered and expired signals are removed from the open set.
    pub fn on_tick(&mut self, tick: &PriceTick) -> TickReport {
        let status = self.detector.record(tick);
        if !status.changed() {
            match status {
                RecordStatus::Duplicate => {}
                _ => warn!(
                    instrument = %tick.instrument,
                    price = tick.price,
                    timestamp = %tick.timestamp,
                    ?status,
                    "Dropped tick"
                ),
            }
            return TickReport::unchanged(status);
        }

        if let Some(metrics) = &self.metrics {
            metrics.ticks_recorded.inc();
        }

        let reversal = &self.config.reversal;
        self.atr
            .entry(tick.instrument.clone())
            .or_insert_with(|| RollingAtr::new(reversal.atr_period, reversal.atr_bar_seconds))
            .update(tick.price, tick.timestamp);

        let mut report = TickReport::unchanged(status);
        self.expire_idle_signals(tick.timestamp, &tick.instrument, &mut report.expired);

        let Some(open) = self.signals.remove(&tick.instrument) else {
            return report;
        };

        let atr = self.atr_for(&tick.instrument);
        let mut still_open = Vec::with_capacity(open.len());
        for signal in open {
            let result = self.detector.evaluate(&signal, atr);
            if result.is_expired() {
                debug!(instrument = %signal.instrument, issued_at = %signal.issued_at, "Signal expired");
                if let Some(metrics) = &self.metrics {
                    metrics.signals_expired.inc();
                }
                report.expired.push(signal);
            } else if result.triggered {
                info!(
                    instrument = %signal.instrument,
                    direction = ?signal.direction,
                    erm = result.erm_value,
                    threshold = ?result.threshold,
                    "ERM reversal triggered"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.reversals_triggered.inc();
                }
                report.reversals.push(ReversalEvent { signal, result });
            } else {
                still_open.push(signal);
            }
        }

        if !still_open.is_empty() {
            self.signals.insert(tick.instrument.clone(), still_open);
        }
        report
    }

    /// Discard signals on other instruments that are past their validity
    /// window as of `now`, the newest tick seen from any instrument.
    fn expire_idle_signals(&mut self, now: DateTime<Utc>, ticked: &str, expired: &mut Vec<SignalEvent>) {
        let max_age = Duration::seconds(self.config.reversal.max_validity_seconds as i64);
        let before = expired.len();
        self.signals.retain(|instrument, open| {
            if instrument == ticked {
                return true;
            }
            let (stale, fresh): (Vec<_>, Vec<_>) = open.drain(..).partition(|s| s.age(now) > max_age);
            expired.extend(stale);
            *open = fresh;
            !open.is_empty()
        });

        let swept = expired.len() - before;
        if swept > 0 {
            debug!(swept, "Expired signals on idle instruments");
            if let Some(metrics) = &self.metrics {
                metrics.signals_expired.inc_by(swept as u64);
            }
        }
    }

    /// Register a signal to be watched on every tick.
    ///
    /// Signals are evaluated against their own instrument's ticks and expire
    /// against the newest tick of any instrument.
    pub fn add_signal(&mut self, signal: SignalEvent) {
        debug!(
            instrument = %signal.instrument,
            entry_price = signal.entry_price,
            direction = ?signal.direction,
            "Signal registered"
        );
        self.signals.entry(signal.instrument.clone()).or_default().push(signal);
    }

    pub fn open_signals(&self, instrument: &str) -> &[SignalEvent] {
        self.signals.get(instrument).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Evaluate one open signal without changing any state.
    pub fn check_signal(&self, signal: &SignalEvent) -> ErmResult {
        self.detector.evaluate(signal, self.atr_for(&signal.instrument))
    }

    pub fn record_outcome(&mut self, instrument: &str, outcome: TradeOutcome) {
        let kelly_config = &self.config.kelly;
        self.sizers
            .entry(instrument.to_string())
            .or_insert_with(|| KellyPositionSizer::new(kelly_config.clone()))
            .record_outcome(outcome);
    }

    pub fn sizer(&self, instrument: &str) -> Option<&KellyPositionSizer> {
        self.sizers.get(instrument)
    }

    pub fn kelly(&self, instrument: &str) -> Result<KellyResult, EngineError> {
        match self.sizers.get(instrument) {
            Some(sizer) => sizer.calculate_kelly(),
            None => Err(EngineError::InsufficientSampleSize {
                have: 0,
                need: self.config.kelly.min_sample_size,
            }),
        }
    }

    pub fn update_budget(&mut self, budget: RiskBudget) {
        self.budget = budget;
    }

    pub fn reset_session(&mut self) {
        self.budget.reset_session();
        info!(
            effective_remaining = self.budget.effective_remaining(),
            "Risk session reset"
        );
    }

    pub fn budget(&self) -> &RiskBudget {
        &self.budget
    }

    /// Use an externally estimated ATR instead of the tick-driven one.
    pub fn set_atr(&mut self, instrument: &str, atr: f64) {
        self.atr_overrides.insert(instrument.to_string(), atr);
    }

    pub fn clear_atr(&mut self, instrument: &str) {
        self.atr_overrides.remove(instrument);
    }

    pub fn atr_for(&self, instrument: &str) -> Option<f64> {
        self.atr_overrides
            .get(instrument)
            .copied()
            .or_else(|| self.atr.get(instrument).and_then(RollingAtr::value))
    }

    /// Produce a decision for `instrument`.
    ///
    /// Without a supplied probability the instrument's historical win rate is used.
    pub fn evaluate(&self, instrument: &str, success_probability: Option<f64>) -> Decision {
        let kelly = self.kelly(instrument);
        if let Err(e) = &kelly {
            debug!(instrument, error = %e, transient = e.is_transient(), "Kelly undefined, using fallback fraction");
        }

        let probability = success_probability
            .or_else(|| self.sizers.get(instrument).and_then(|s| s.win_rate().ok()));

        let decision = self.gate.evaluate(GateInputs {
            budget: &self.budget,
            success_probability: probability,
            kelly: kelly.as_ref().ok(),
        });

        if let Some(metrics) = &self.metrics {
            metrics
                .decisions
                .with_label_values(&[decision.action.as_str()])
                .inc();
            metrics
                .effective_remaining_risk
                .set(self.budget.effective_remaining());
        }
        info!(
            instrument,
            action = %decision.action,
            size = decision.recommended_size,
            reason = %decision.reason,
            "Decision"
        );
        decision
    }
}
