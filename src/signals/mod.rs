//! Trade/no-trade decisions.

pub mod decision;

pub use decision::{DecisionGate, GateInputs};
