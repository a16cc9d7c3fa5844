use crate::model::answer::Answer;
use crate::model::id::{CharacterId, QuestionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A candidate the player may be thinking of, with its expected answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    #[serde(default)]
    pub answers: BTreeMap<QuestionId, Answer>,
}

impl Character {
    pub fn new(id: impl Into<CharacterId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            answers: BTreeMap::new(),
        }
    }

    pub fn with_answer(mut self, question: impl Into<QuestionId>, answer: Answer) -> Self {
        self.answers.insert(question.into(), answer);
        self
    }

    /// Expected answer for `question`, `Unknown` when none was recorded.
    pub fn expected(&self, question: &QuestionId) -> Answer {
        self.answers.get(question).copied().unwrap_or_default()
    }
}
