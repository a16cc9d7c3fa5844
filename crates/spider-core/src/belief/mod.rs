//! Probabilistic belief tracking over which character the player has in mind.
//!
//! This module is composed of:
//! - `distribution`: the normalized per-character distribution and its updates (`Belief`).
//! - `compatibility`: the multiplier table relating player answers to expected answers.
//! - `telemetry`: entropy and margin metrics derived from a belief snapshot.

mod compatibility;
mod distribution;
pub mod telemetry;

pub use compatibility::CompatibilityTable;
pub use distribution::Belief;

/// Seed mass for answer buckets and the base of every probability floor.
pub const BASELINE: f64 = 0.05;

/// Lowest probability an answer update may leave a character with.
pub const PROBABILITY_FLOOR: f64 = BASELINE * 0.1;

/// Probability assigned to a character after a rejected guess.
pub const GUESS_MISS_FLOOR: f64 = BASELINE * 0.05;
