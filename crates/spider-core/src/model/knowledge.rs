use crate::model::character::Character;
use crate::model::id::{CharacterId, QuestionId};
use crate::model::question::Question;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use thiserror::Error;

/// Static reference data a session reasons over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub characters: Vec<Character>,
}

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("knowledge base contains no characters")]
    EmptyKnowledgeBase,
    #[error("question id '{0}' is defined more than once")]
    DuplicateQuestion(QuestionId),
    #[error("character id '{0}' is defined more than once")]
    DuplicateCharacter(CharacterId),
    #[error("failed to parse knowledge base: {0}")]
    Parse(#[from] serde_json::Error),
}

impl KnowledgeBase {
    pub fn new(questions: Vec<Question>, characters: Vec<Character>) -> Self {
        Self {
            questions,
            characters,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, KnowledgeError> {
        let knowledge: KnowledgeBase = serde_json::from_str(json)?;
        knowledge.validate()?;
        Ok(knowledge)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, KnowledgeError> {
        let knowledge: KnowledgeBase = serde_json::from_reader(reader)?;
        knowledge.validate()?;
        Ok(knowledge)
    }

    /// Checks the invariants a session relies on. Zero questions is allowed.
    pub fn validate(&self) -> Result<(), KnowledgeError> {
        if self.characters.is_empty() {
            return Err(KnowledgeError::EmptyKnowledgeBase);
        }

        let mut seen_questions = HashSet::new();
        for question in &self.questions {
            if !seen_questions.insert(&question.id) {
                return Err(KnowledgeError::DuplicateQuestion(question.id.clone()));
            }
        }

        let mut seen_characters = HashSet::new();
        for character in &self.characters {
            if !seen_characters.insert(&character.id) {
                return Err(KnowledgeError::DuplicateCharacter(character.id.clone()));
            }
        }

        Ok(())
    }

    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| &question.id == id)
    }

    pub fn character(&self, id: &CharacterId) -> Option<&Character> {
        self.characters.iter().find(|character| &character.id == id)
    }

    pub fn snapshot(&self) -> KnowledgeSnapshot {
        KnowledgeSnapshot {
            questions: self
                .questions
                .iter()
                .map(|question| QuestionLabel {
                    id: question.id.clone(),
                    text: question.text.clone(),
                })
                .collect(),
            characters: self
                .characters
                .iter()
                .map(|character| CharacterLabel {
                    id: character.id.clone(),
                    name: character.name.clone(),
                })
                .collect(),
        }
    }
}

/// Ids and labels only; answer tables are left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeSnapshot {
    pub questions: Vec<QuestionLabel>,
    pub characters: Vec<CharacterLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionLabel {
    pub id: QuestionId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterLabel {
    pub id: CharacterId,
    pub name: String,
}
