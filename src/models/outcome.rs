use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a closed trade, reported by the execution layer.
///
/// `loss_amount` is a magnitude; the sizer takes its absolute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub won: bool,
    pub win_amount: f64,
    pub loss_amount: f64,
    pub timestamp: DateTime<Utc>,
}

impl TradeOutcome {
    pub fn win(amount: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            won: true,
            win_amount: amount,
            loss_amount: 0.0,
            timestamp,
        }
    }

    pub fn loss(amount: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            won: false,
            win_amount: 0.0,
            loss_amount: amount,
            timestamp,
        }
    }
}
