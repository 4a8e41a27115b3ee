//! Momentum indicators: ERM reversal detection

pub mod erm;

pub use erm::*;
