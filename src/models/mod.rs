//! Shared data models spanning the engine layers.

pub mod decision;
pub mod market;
pub mod outcome;
pub mod risk;

pub use decision::{Action, Decision};
pub use market::{Direction, PriceTick, SignalEvent};
pub use outcome::TradeOutcome;
pub use risk::RiskBudget;
