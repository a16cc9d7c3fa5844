use crate::game::config::EngineConfig;
use serde::{Deserialize, Serialize};

/// Why the engine switched from asking to guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    QuestionLimit,
    GuessLimit,
    Confident,
    QuestionsExhausted,
}

impl StopReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            StopReason::QuestionLimit => "question_limit",
            StopReason::GuessLimit => "guess_limit",
            StopReason::Confident => "confident",
            StopReason::QuestionsExhausted => "questions_exhausted",
        }
    }
}

/// Evaluated once per turn before scoring; `Some` means the turn is a guess.
pub fn stop_reason(
    config: &EngineConfig,
    questions_asked: usize,
    guesses_made: usize,
    top_probability: f64,
    unasked_remaining: usize,
) -> Option<StopReason> {
    if questions_asked >= config.max_questions {
        Some(StopReason::QuestionLimit)
    } else if guesses_made >= config.max_guesses {
        Some(StopReason::GuessLimit)
    } else if top_probability >= config.confidence_threshold {
        Some(StopReason::Confident)
    } else if unasked_remaining == 0 {
        Some(StopReason::QuestionsExhausted)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_asking_while_uncertain() {
        let config = EngineConfig::default();
        assert_eq!(stop_reason(&config, 3, 0, 0.4, 5), None);
    }

    #[test]
    fn each_condition_triggers_a_guess() {
        let config = EngineConfig::default();
        assert_eq!(
            stop_reason(&config, config.max_questions, 0, 0.1, 5),
            Some(StopReason::QuestionLimit)
        );
        assert_eq!(
            stop_reason(&config, 0, config.max_guesses, 0.1, 5),
            Some(StopReason::GuessLimit)
        );
        assert_eq!(
            stop_reason(&config, 0, 0, config.confidence_threshold, 5),
            Some(StopReason::Confident)
        );
        assert_eq!(
            stop_reason(&config, 0, 0, 0.1, 0),
            Some(StopReason::QuestionsExhausted)
        );
    }
}
