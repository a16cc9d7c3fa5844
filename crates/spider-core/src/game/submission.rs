//! Session summaries handed to an external submission sink.

use super::session::{AskedQuestion, GuessRecord, Outcome, Session};
use crate::model::answer::Answer;
use crate::model::id::{CharacterId, QuestionId};
use crate::model::knowledge::KnowledgeSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Everything the engine knows about a session, minus the answer tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub asked: Vec<AskedQuestion>,
    pub guess_history: Vec<GuessRecord>,
    /// `None` while the session is still running.
    pub outcome: Option<Outcome>,
    pub correct: bool,
    pub final_guess: Option<String>,
    pub knowledge_snapshot: KnowledgeSnapshot,
}

impl SessionRecord {
    pub fn capture(session: &Session) -> Self {
        let outcome = session.outcome().cloned();
        Self {
            asked: session.asked().to_vec(),
            guess_history: session.guesses().to_vec(),
            correct: outcome.as_ref().is_some_and(Outcome::is_win),
            final_guess: outcome
                .as_ref()
                .and_then(Outcome::revealed_name)
                .map(str::to_string),
            outcome,
            knowledge_snapshot: session.knowledge().snapshot(),
        }
    }
}

/// What the player tells us after the game: who they were really thinking of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reveal {
    pub name: Option<String>,
    pub notes: Option<String>,
}

impl Reveal {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.notes.is_none()
    }
}

/// A character the player would like added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSuggestion {
    pub name: String,
    #[serde(default)]
    pub answers: BTreeMap<QuestionId, Answer>,
}

/// A question the player would like added, with answers for known characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSuggestion {
    pub text: String,
    #[serde(default)]
    pub answers: BTreeMap<CharacterId, Answer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    pub new_character: Option<CharacterSuggestion>,
    pub new_question: Option<QuestionSuggestion>,
}

/// Envelope delivered to a [`SubmissionSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub timestamp: String,
    #[serde(flatten)]
    pub session: SessionRecord,
    #[serde(default)]
    pub revealed: Reveal,
    #[serde(default)]
    pub suggestions: Suggestions,
}

impl Submission {
    pub fn new(timestamp: impl Into<String>, session: SessionRecord) -> Self {
        Self {
            timestamp: timestamp.into(),
            session,
            revealed: Reveal::default(),
            suggestions: Suggestions::default(),
        }
    }

    pub fn with_reveal(mut self, revealed: Reveal) -> Self {
        self.revealed = revealed;
        self
    }

    pub fn with_suggestions(mut self, suggestions: Suggestions) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize submission: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// Accepts finished sessions. Transport and storage belong to the implementor;
/// the engine never waits on it to reach a terminal state.
pub trait SubmissionSink {
    fn submit(&mut self, submission: &Submission) -> Result<(), SinkError>;
}

/// Keeps submissions in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    submissions: Vec<Submission>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }
}

impl SubmissionSink for MemorySink {
    fn submit(&mut self, submission: &Submission) -> Result<(), SinkError> {
        self.submissions.push(submission.clone());
        Ok(())
    }
}
