//! Core application primitives (engine, runtime)

pub mod engine;
pub mod runtime;

pub use engine::*;
pub use runtime::*;
