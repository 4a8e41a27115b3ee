//! Position sizing and reversal-signal engine.
//!
//! Ticks flow into a per-instrument price history, the ERM detector watches
//! open signals for fast adverse momentum, and the decision gate combines the
//! remaining risk budget with a fractional-Kelly size into one action.

pub mod common;
pub mod config;
pub mod core;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod signals;
pub mod sizing;

pub use config::EngineConfig;
pub use error::EngineError;
