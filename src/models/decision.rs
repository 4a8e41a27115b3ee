use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Go,
    Caution,
    Stop,
    Skip,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Go => "GO",
            Action::Caution => "CAUTION",
            Action::Stop => "STOP",
            Action::Skip => "SKIP",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one gate evaluation. Built fresh per call, never stored.
///
/// `recommended_size` is in dollars of risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub recommended_size: f64,
    pub reason: String,
}

impl Decision {
    pub fn new(action: Action, recommended_size: f64, reason: impl Into<String>) -> Self {
        Self {
            action,
            recommended_size,
            reason: reason.into(),
        }
    }
}
