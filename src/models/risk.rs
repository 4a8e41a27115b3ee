//! Account-level risk budget.

use serde::{Deserialize, Serialize};

/// Drawdown budget maintained by the execution layer and read by the gate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskBudget {
    pub daily_limit: f64,
    pub consumed_today: f64,
    pub trailing_limit: f64,
    pub peak_equity: f64,
    pub current_equity: f64,
}

impl RiskBudget {
    pub fn remaining_daily(&self) -> f64 {
        self.daily_limit - self.consumed_today
    }

    /// Trailing limit minus the drawdown from the equity peak.
    pub fn remaining_trailing(&self) -> f64 {
        self.trailing_limit - (self.peak_equity - self.current_equity)
    }

    pub fn effective_remaining(&self) -> f64 {
        self.remaining_daily().min(self.remaining_trailing())
    }

    /// Start a new trading session. The trailing peak carries over.
    pub fn reset_session(&mut self) {
        self.consumed_today = 0.0;
    }
}
