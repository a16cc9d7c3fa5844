use crate::belief::CompatibilityTable;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

const DEFAULT_MAX_QUESTIONS: usize = 24;
const DEFAULT_MAX_GUESSES: usize = 3;
const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.62;
const DEFAULT_TIE_BREAK_NOISE: f64 = 0.05;

/// Tunable limits for a single session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Questions asked before the engine is forced to guess.
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
    /// Guesses allowed before the session is lost.
    #[serde(default = "default_max_guesses")]
    pub max_guesses: usize,
    /// Top probability at which the engine stops asking and guesses.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Upper bound of the random jitter added to question scores.
    #[serde(default = "default_tie_break_noise")]
    pub tie_break_noise: f64,
    #[serde(default)]
    pub compatibility: CompatibilityTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_questions: DEFAULT_MAX_QUESTIONS,
            max_guesses: DEFAULT_MAX_GUESSES,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            tie_break_noise: DEFAULT_TIE_BREAK_NOISE,
            compatibility: CompatibilityTable::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies `SPIDER_*` environment overrides. Only values read from the
    /// environment are clamped; configured values pass through untouched.
    pub fn with_env_overrides(self) -> Self {
        Self {
            max_questions: parse_env("SPIDER_MAX_QUESTIONS")
                .map(|value| value.clamp(0, 256))
                .unwrap_or(self.max_questions),
            max_guesses: parse_env("SPIDER_MAX_GUESSES")
                .map(|value| value.clamp(1, 64))
                .unwrap_or(self.max_guesses),
            confidence_threshold: parse_env_f64("SPIDER_CONFIDENCE")
                .map(|value| value.clamp(0.01, 1.0))
                .unwrap_or(self.confidence_threshold),
            tie_break_noise: parse_env_f64("SPIDER_TIE_NOISE")
                .map(|value| value.clamp(0.0, 0.5))
                .unwrap_or(self.tie_break_noise),
            compatibility: self.compatibility,
        }
    }

    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if self.max_guesses == 0 {
            return Err(EngineConfigError::InvalidField {
                field: "max_guesses",
                message: "at least one guess must be allowed".to_string(),
            });
        }
        if !(self.confidence_threshold > 0.0 && self.confidence_threshold <= 1.0) {
            return Err(EngineConfigError::InvalidField {
                field: "confidence_threshold",
                message: format!("{} is outside (0, 1]", self.confidence_threshold),
            });
        }
        if !self.tie_break_noise.is_finite() || self.tie_break_noise < 0.0 {
            return Err(EngineConfigError::InvalidField {
                field: "tie_break_noise",
                message: "noise must be a finite, non-negative number".to_string(),
            });
        }
        if !self.compatibility.is_valid() {
            return Err(EngineConfigError::InvalidField {
                field: "compatibility",
                message: "every multiplier must be finite and positive".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineConfigError {
    #[error("engine.{field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
}

fn default_max_questions() -> usize {
    DEFAULT_MAX_QUESTIONS
}

fn default_max_guesses() -> usize {
    DEFAULT_MAX_GUESSES
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_tie_break_noise() -> f64 {
    DEFAULT_TIE_BREAK_NOISE
}

fn parse_env(key: &str) -> Option<usize> {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
}

fn parse_env_f64(key: &str) -> Option<f64> {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}
