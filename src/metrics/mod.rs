//! Prometheus metrics for the sizing engine.

use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub ticks_recorded: IntCounter,
    pub reversals_triggered: IntCounter,
    pub signals_expired: IntCounter,
    pub decisions: IntCounterVec,
    pub effective_remaining_risk: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ticks_recorded = IntCounter::new("ticks_recorded_total", "Price ticks accepted into history")?;
        let reversals_triggered =
            IntCounter::new("reversals_triggered_total", "ERM reversal triggers emitted")?;
        let signals_expired =
            IntCounter::new("signals_expired_total", "Signals discarded after their validity window")?;
        let decisions = IntCounterVec::new(
            Opts::new("decisions_total", "Gate decisions by action"),
            &["action"],
        )?;
        let effective_remaining_risk = Gauge::new(
            "effective_remaining_risk",
            "Smaller of remaining daily and trailing risk at the last evaluation",
        )?;

        registry.register(Box::new(ticks_recorded.clone()))?;
        registry.register(Box::new(reversals_triggered.clone()))?;
        registry.register(Box::new(signals_expired.clone()))?;
        registry.register(Box::new(decisions.clone()))?;
        registry.register(Box::new(effective_remaining_risk.clone()))?;

        Ok(Self {
            registry,
            ticks_recorded,
            reversals_triggered,
            signals_expired,
            decisions,
            effective_remaining_risk,
        })
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
