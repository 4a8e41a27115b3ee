//! First-principles decision table combining risk budget and opportunity quality.
//!
//! Rules are evaluated top to bottom and the first match wins:
//! 1. effective remaining risk <= 0                      -> STOP
//! 2. remaining < caution dollars OR p < caution p       -> CAUTION
//! 3. p < skip p                                         -> SKIP
//! 4. otherwise                                          -> GO
//!
//! Budget exhaustion dominates everything, including p = 1.0. The budget
//! half of rule 2 does not need a probability; a missing or out-of-range
//! probability is a SKIP once both budget checks have passed.

use crate::config::{EngineConfig, GateConfig};
use crate::models::decision::{Action, Decision};
use crate::models::risk::RiskBudget;
use crate::sizing::kelly::KellyResult;

pub const STOP_REASON: &str = "No drawdown budget remaining";

/// Everything one evaluation looks at.
#[derive(Debug, Clone, Copy)]
pub struct GateInputs<'a> {
    pub budget: &'a RiskBudget,
    /// Estimated chance of success in `[0, 1]`, if one is known.
    pub success_probability: Option<f64>,
    /// `None` when the Kelly estimate is undefined.
    pub kelly: Option<&'a KellyResult>,
}

#[derive(Debug, Clone)]
pub struct DecisionGate {
    config: GateConfig,
    fallback_fraction: f64,
}

impl DecisionGate {
    pub fn new(config: GateConfig, fallback_fraction: f64) -> Self {
        Self {
            config,
            fallback_fraction,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.gate.clone(), config.kelly.fallback_fraction)
    }

    /// Pure function of its inputs; repeated calls give identical decisions.
    pub fn evaluate(&self, inputs: GateInputs<'_>) -> Decision {
        let remaining = inputs.budget.effective_remaining();

        // NaN budgets are treated as exhausted.
        if remaining.is_nan() || remaining <= 0.0 {
            return Decision::new(Action::Stop, 0.0, STOP_REASON);
        }

        let (size, sizing_basis) = self.size_for(remaining, inputs.kelly);
        let caution_size = size * self.config.caution_size_multiplier;

        if remaining < self.config.caution_dollar_threshold {
            return Decision::new(
                Action::Caution,
                caution_size,
                format!(
                    "Remaining risk ${:.2} below caution threshold ${:.2}",
                    remaining, self.config.caution_dollar_threshold
                ),
            );
        }

        let probability = match inputs.success_probability {
            Some(p) if (0.0..=1.0).contains(&p) => p,
            Some(p) => {
                return Decision::new(Action::Skip, 0.0, format!("Invalid success probability {}", p));
            }
            None => return Decision::new(Action::Skip, 0.0, "No success probability estimate"),
        };

        if probability < self.config.caution_probability_threshold {
            return Decision::new(
                Action::Caution,
                caution_size,
                format!(
                    "Success probability {:.2} below caution threshold {:.2}",
                    probability, self.config.caution_probability_threshold
                ),
            );
        }
        // Shadowed by the caution rule whenever skip <= caution probability.
        if probability < self.config.skip_probability_threshold {
            return Decision::new(
                Action::Skip,
                0.0,
                format!(
                    "Success probability {:.2} below skip threshold {:.2}",
                    probability, self.config.skip_probability_threshold
                ),
            );
        }

        Decision::new(
            Action::Go,
            size,
            format!(
                "Risk ${:.2} available, p={:.2}, sized by {}",
                remaining, probability, sizing_basis
            ),
        )
    }

    fn size_for(&self, remaining: f64, kelly: Option<&KellyResult>) -> (f64, &'static str) {
        match kelly {
            Some(k) => (k.capped_fraction * remaining, "fractional Kelly"),
            None => (self.fallback_fraction * remaining, "fallback fraction"),
        }
    }
}
