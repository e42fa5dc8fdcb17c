//! Deterministic simulation harness for game tests.
//!
//! Provides [`SimEnv`], an `Environment` implementation with a seeded RNG,
//! a virtual clock, and a scriptable dice supply. Tests that need exact
//! dice sequences (forced sixes, forced captures) script them; everything
//! else stays reproducible from the seed alone.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_env;

pub use sim_env::{SimEnv, SimInstant};
