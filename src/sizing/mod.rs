//! Position sizing.

pub mod kelly;

pub use kelly::{cap_fraction, kelly_fraction, KellyBasis, KellyPositionSizer, KellyResult};
