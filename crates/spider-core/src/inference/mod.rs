//! Decision logic layered on top of the belief state.
//!
//! - `scoring`: entropy-based question selection with an injectable tie-break.
//! - `stop`: whether the next turn must be a guess.
//! - `guess`: which character to propose.

pub mod guess;
pub mod scoring;
pub mod stop;

pub use guess::pick_guess;
pub use scoring::{NoTieBreak, QuestionScorer, RandomTieBreak, ScoredQuestion, TieBreak};
pub use stop::{StopReason, stop_reason};
