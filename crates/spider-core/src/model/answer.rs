use core::fmt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Expected answer recorded for a character against a question.
///
/// `Unknown` is a real category: a character without an entry for a question
/// lands here, and it gets its own bucket during scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Answer {
    Yes = 0,
    No = 1,
    Maybe = 2,
    #[default]
    Unknown = 3,
}

impl Answer {
    pub const ALL: [Answer; 4] = [Answer::Yes, Answer::No, Answer::Maybe, Answer::Unknown];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Answer::Yes => "yes",
            Answer::No => "no",
            Answer::Maybe => "maybe",
            Answer::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer a player may actually give.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PlayerAnswer {
    Yes = 0,
    No = 1,
    Maybe = 2,
}

impl PlayerAnswer {
    pub const ALL: [PlayerAnswer; 3] = [PlayerAnswer::Yes, PlayerAnswer::No, PlayerAnswer::Maybe];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PlayerAnswer::Yes => "yes",
            PlayerAnswer::No => "no",
            PlayerAnswer::Maybe => "maybe",
        }
    }

    /// Maps an expected answer onto what a truthful player would say, using
    /// `fallback` for characters with no recorded answer.
    pub const fn from_expected(expected: Answer, fallback: PlayerAnswer) -> PlayerAnswer {
        match expected {
            Answer::Yes => PlayerAnswer::Yes,
            Answer::No => PlayerAnswer::No,
            Answer::Maybe => PlayerAnswer::Maybe,
            Answer::Unknown => fallback,
        }
    }
}

impl From<PlayerAnswer> for Answer {
    fn from(value: PlayerAnswer) -> Self {
        match value {
            PlayerAnswer::Yes => Answer::Yes,
            PlayerAnswer::No => Answer::No,
            PlayerAnswer::Maybe => Answer::Maybe,
        }
    }
}

impl fmt::Display for PlayerAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when player input is not one of `yes`, `no` or `maybe`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerParseError {
    #[error("unknown answer literal '{0}' (expected yes, no or maybe)")]
    UnknownAnswerLiteral(String),
}

impl FromStr for PlayerAnswer {
    type Err = AnswerParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(PlayerAnswer::Yes),
            "no" => Ok(PlayerAnswer::No),
            "maybe" => Ok(PlayerAnswer::Maybe),
            _ => Err(AnswerParseError::UnknownAnswerLiteral(value.to_string())),
        }
    }
}
