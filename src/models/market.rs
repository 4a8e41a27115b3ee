//! Market-facing inputs: price ticks and directional signals.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A single observed price. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    pub instrument: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceTick {
    pub fn new(instrument: impl Into<String>, price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            instrument: instrument.into(),
            price,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

/// A trade idea reported by an external signal source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub instrument: String,
    pub entry_price: f64,
    pub direction: Direction,
    pub issued_at: DateTime<Utc>,
}

impl SignalEvent {
    pub fn new(
        instrument: impl Into<String>,
        entry_price: f64,
        direction: Direction,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            entry_price,
            direction,
            issued_at,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.issued_at
    }
}
