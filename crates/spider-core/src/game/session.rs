use super::config::{EngineConfig, EngineConfigError};
use super::submission::SessionRecord;
use crate::belief::Belief;
use crate::belief::telemetry::BeliefMetrics;
use crate::inference::{QuestionScorer, StopReason, TieBreak, pick_guess, stop_reason};
use crate::model::answer::PlayerAnswer;
use crate::model::id::{CharacterId, QuestionId};
use crate::model::knowledge::{KnowledgeBase, KnowledgeError};
use crate::model::question::Question;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskedQuestion {
    pub question_id: QuestionId,
    pub text: String,
    pub answer: PlayerAnswer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessRecord {
    pub character_id: CharacterId,
    pub character_name: String,
    /// Belief in the character when the guess was made.
    pub probability: f64,
    pub correct: bool,
}

/// A guess waiting for the player to confirm or reject it.
#[derive(Debug, Clone, PartialEq)]
pub struct GuessProposal {
    pub character_id: CharacterId,
    pub character_name: String,
    pub probability: f64,
    pub reason: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    /// Every character was guessed and rejected.
    CandidatesExhausted,
    /// The configured number of guesses ran out.
    GuessLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Win {
        character_id: CharacterId,
        character_name: String,
    },
    Loss {
        reason: LossReason,
    },
}

impl Outcome {
    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Win { .. })
    }

    pub fn revealed_name(&self) -> Option<&str> {
        match self {
            Outcome::Win { character_name, .. } => Some(character_name),
            Outcome::Loss { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
    #[error(transparent)]
    Config(#[from] EngineConfigError),
    #[error("no question is awaiting an answer")]
    NoActiveQuestion,
    #[error("answer given for question '{actual}' but '{expected}' is active")]
    QuestionMismatch {
        expected: QuestionId,
        actual: QuestionId,
    },
    #[error("no guess is awaiting confirmation")]
    NoActiveGuess,
    #[error("the game is over")]
    GameOver,
}

#[derive(Debug, Clone, PartialEq)]
enum Prompt {
    Idle,
    Question(QuestionId),
    Guess(GuessProposal),
}

/// What a collaborator needs to render the current turn.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView<'a> {
    pub question: Option<&'a Question>,
    pub guess: Option<&'a GuessProposal>,
    pub questions_asked: usize,
    pub max_questions: usize,
    pub guesses_remaining: usize,
    pub outcome: Option<&'a Outcome>,
}

/// One game: owns its knowledge copy, belief and history.
///
/// Every transition is synchronous. After `answer` or `resolve_guess` returns,
/// the session already holds the next question, the next guess, or an outcome.
#[derive(Debug, Clone)]
pub struct Session {
    knowledge: KnowledgeBase,
    config: EngineConfig,
    belief: Belief,
    asked: Vec<AskedQuestion>,
    guesses: Vec<GuessRecord>,
    prompt: Prompt,
    outcome: Option<Outcome>,
}

impl Session {
    /// Copies `knowledge`, starts from a uniform belief and prepares the first turn.
    pub fn start(
        knowledge: &KnowledgeBase,
        config: EngineConfig,
        tie_break: &mut impl TieBreak,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        knowledge.validate()?;
        let knowledge = knowledge.clone();
        let belief = Belief::uniform(&knowledge)?;

        let mut session = Self {
            knowledge,
            config,
            belief,
            asked: Vec::new(),
            guesses: Vec::new(),
            prompt: Prompt::Idle,
            outcome: None,
        };
        session.advance(tie_break);
        Ok(session)
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn belief(&self) -> &Belief {
        &self.belief
    }

    pub fn asked(&self) -> &[AskedQuestion] {
        &self.asked
    }

    pub fn guesses(&self) -> &[GuessRecord] {
        &self.guesses
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn questions_asked(&self) -> usize {
        self.asked.len()
    }

    pub fn guesses_remaining(&self) -> usize {
        self.config.max_guesses.saturating_sub(self.guesses.len())
    }

    pub fn current_question(&self) -> Option<&Question> {
        match &self.prompt {
            Prompt::Question(id) => self.knowledge.question(id),
            _ => None,
        }
    }

    pub fn current_guess(&self) -> Option<&GuessProposal> {
        match &self.prompt {
            Prompt::Guess(proposal) => Some(proposal),
            _ => None,
        }
    }

    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            question: self.current_question(),
            guess: self.current_guess(),
            questions_asked: self.questions_asked(),
            max_questions: self.config.max_questions,
            guesses_remaining: self.guesses_remaining(),
            outcome: self.outcome.as_ref(),
        }
    }

    pub fn record(&self) -> SessionRecord {
        SessionRecord::capture(self)
    }

    /// Applies the player's answer to the active question and moves to the next turn.
    pub fn answer(
        &mut self,
        question_id: &QuestionId,
        answer: PlayerAnswer,
        tie_break: &mut impl TieBreak,
    ) -> Result<(), SessionError> {
        if self.outcome.is_some() {
            return Err(SessionError::GameOver);
        }
        let Prompt::Question(active) = &self.prompt else {
            return Err(SessionError::NoActiveQuestion);
        };
        if active != question_id {
            return Err(SessionError::QuestionMismatch {
                expected: active.clone(),
                actual: question_id.clone(),
            });
        }

        let text = self
            .knowledge
            .question(question_id)
            .map(|question| question.text.clone())
            .unwrap_or_default();
        self.asked.push(AskedQuestion {
            question_id: question_id.clone(),
            text,
            answer,
        });
        self.belief.apply_answer(
            &self.knowledge,
            question_id,
            answer,
            &self.config.compatibility,
        );
        log_answer(question_id, answer, &self.belief);

        self.prompt = Prompt::Idle;
        self.advance(tie_break);
        Ok(())
    }

    /// Confirms or rejects the active guess.
    pub fn resolve_guess(
        &mut self,
        correct: bool,
        tie_break: &mut impl TieBreak,
    ) -> Result<(), SessionError> {
        if self.outcome.is_some() {
            return Err(SessionError::GameOver);
        }
        let Prompt::Guess(proposal) = &self.prompt else {
            return Err(SessionError::NoActiveGuess);
        };
        let proposal = proposal.clone();
        let probability = self
            .belief
            .prob(&proposal.character_id)
            .unwrap_or(proposal.probability);

        self.guesses.push(GuessRecord {
            character_id: proposal.character_id.clone(),
            character_name: proposal.character_name.clone(),
            probability,
            correct,
        });
        log_guess(&proposal, probability, correct, self.guesses.len());
        self.prompt = Prompt::Idle;

        if correct {
            self.conclude(Outcome::Win {
                character_id: proposal.character_id,
                character_name: proposal.character_name,
            });
            return Ok(());
        }

        self.belief.suppress(&proposal.character_id);
        if self.guesses.len() >= self.config.max_guesses {
            self.conclude(Outcome::Loss {
                reason: LossReason::GuessLimit,
            });
        } else {
            self.advance(tie_break);
        }
        Ok(())
    }

    fn advance(&mut self, tie_break: &mut impl TieBreak) {
        if self.outcome.is_some() {
            self.prompt = Prompt::Idle;
            return;
        }

        let asked_ids: Vec<QuestionId> = self
            .asked
            .iter()
            .map(|entry| entry.question_id.clone())
            .collect();
        let unasked = self
            .knowledge
            .questions
            .iter()
            .filter(|question| !asked_ids.contains(&question.id))
            .count();

        if let Some(reason) = stop_reason(
            &self.config,
            self.asked.len(),
            self.guesses.len(),
            self.belief.max_probability(),
            unasked,
        ) {
            self.request_guess(reason);
            return;
        }

        let next = QuestionScorer::select(&self.knowledge, &self.belief, &asked_ids, tie_break)
            .map(|scored| (scored.question.id.clone(), scored.entropy, scored.score));
        match next {
            Some((id, entropy, score)) => {
                log_question(&id, entropy, score, &self.belief, self.asked.len());
                self.prompt = Prompt::Question(id);
            }
            None => self.request_guess(StopReason::QuestionsExhausted),
        }
    }

    fn request_guess(&mut self, reason: StopReason) {
        let attempted: Vec<CharacterId> = self
            .guesses
            .iter()
            .map(|guess| guess.character_id.clone())
            .collect();
        let proposal = pick_guess(&self.knowledge, &self.belief, &attempted).map(
            |(character, probability)| GuessProposal {
                character_id: character.id.clone(),
                character_name: character.name.clone(),
                probability,
                reason,
            },
        );

        match proposal {
            Some(proposal) => self.prompt = Prompt::Guess(proposal),
            None => self.conclude(Outcome::Loss {
                reason: LossReason::CandidatesExhausted,
            }),
        }
    }

    fn conclude(&mut self, outcome: Outcome) {
        if tracing::enabled!(Level::INFO) {
            event!(
                target: "spider_core::outcome",
                Level::INFO,
                outcome = ?outcome,
                won = outcome.is_win(),
                questions_asked = self.asked.len(),
                guesses = self.guesses.len(),
            );
        }
        self.prompt = Prompt::Idle;
        self.outcome = Some(outcome);
    }
}

fn log_question(id: &QuestionId, entropy: f64, score: f64, belief: &Belief, turn: usize) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }
    let metrics = BeliefMetrics::from_belief(belief);
    event!(
        target: "spider_core::question",
        Level::INFO,
        question_id = %id,
        turn,
        entropy,
        score,
        belief_entropy = metrics.entropy_bits,
        top_probability = metrics.top_probability,
    );
}

fn log_answer(id: &QuestionId, answer: PlayerAnswer, belief: &Belief) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }
    let metrics = BeliefMetrics::from_belief(belief);
    event!(
        target: "spider_core::answer",
        Level::INFO,
        question_id = %id,
        answer = answer.as_str(),
        belief_entropy = metrics.entropy_bits,
        top_probability = metrics.top_probability,
        margin = metrics.margin,
    );
}

fn log_guess(proposal: &GuessProposal, probability: f64, correct: bool, attempt: usize) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }
    event!(
        target: "spider_core::guess",
        Level::INFO,
        character_id = %proposal.character_id,
        reason = proposal.reason.as_str(),
        probability,
        correct,
        attempt,
    );
}
