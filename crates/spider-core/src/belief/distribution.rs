//! Normalized probability distribution over knowledge-base characters.

use super::{CompatibilityTable, GUESS_MISS_FLOOR, PROBABILITY_FLOOR};
use crate::model::answer::PlayerAnswer;
use crate::model::id::{CharacterId, QuestionId};
use crate::model::knowledge::{KnowledgeBase, KnowledgeError};

/// Probability per character, aligned with the knowledge base's character order.
///
/// Every value stays strictly positive and the values sum to one after each update.
#[derive(Debug, Clone, PartialEq)]
pub struct Belief {
    ids: Vec<CharacterId>,
    probs: Vec<f64>,
}

impl Belief {
    /// Assigns `1/N` to each of the `N` characters.
    pub fn uniform(knowledge: &KnowledgeBase) -> Result<Self, KnowledgeError> {
        let count = knowledge.characters.len();
        if count == 0 {
            return Err(KnowledgeError::EmptyKnowledgeBase);
        }
        let initial = 1.0 / count as f64;
        Ok(Self {
            ids: knowledge.characters.iter().map(|c| c.id.clone()).collect(),
            probs: vec![initial; count],
        })
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    pub fn prob(&self, id: &CharacterId) -> Option<f64> {
        self.position(id).map(|index| self.probs[index])
    }

    pub fn prob_at(&self, index: usize) -> f64 {
        self.probs[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CharacterId, f64)> {
        self.ids.iter().zip(self.probs.iter().copied())
    }

    pub fn total(&self) -> f64 {
        self.probs.iter().sum()
    }

    pub fn max_probability(&self) -> f64 {
        self.probs.iter().copied().fold(0.0, f64::max)
    }

    /// Highest-probability character; earlier characters win ties.
    pub fn top(&self) -> Option<(&CharacterId, f64)> {
        let mut best: Option<(&CharacterId, f64)> = None;
        for (id, prob) in self.iter() {
            if best.is_none_or(|(_, best_prob)| prob > best_prob) {
                best = Some((id, prob));
            }
        }
        best
    }

    /// Reweights every character by how well its expected answer to `question`
    /// agrees with `answer`, then renormalizes.
    pub fn apply_answer(
        &mut self,
        knowledge: &KnowledgeBase,
        question: &QuestionId,
        answer: PlayerAnswer,
        table: &CompatibilityTable,
    ) {
        debug_assert_eq!(knowledge.characters.len(), self.probs.len());
        for (character, prob) in knowledge.characters.iter().zip(self.probs.iter_mut()) {
            let expected = character.expected(question);
            let multiplier = table.multiplier(answer, expected);
            *prob = (*prob * multiplier).max(PROBABILITY_FLOOR);
        }
        self.renormalize();
    }

    /// Crushes `id` to the guess-miss floor after a rejected guess.
    /// Returns false when the character is unknown to this belief.
    pub fn suppress(&mut self, id: &CharacterId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.probs[index] = GUESS_MISS_FLOOR;
        self.renormalize();
        true
    }

    /// Sum within `tolerance` of one and every entry strictly positive.
    pub fn is_normalized(&self, tolerance: f64) -> bool {
        (self.total() - 1.0).abs() <= tolerance && self.probs.iter().all(|p| *p > 0.0)
    }

    fn position(&self, id: &CharacterId) -> Option<usize> {
        self.ids.iter().position(|candidate| candidate == id)
    }

    fn renormalize(&mut self) {
        let total: f64 = self.probs.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            // Mass collapsed; fall back to uniform instead of dividing by zero.
            let uniform = 1.0 / self.probs.len() as f64;
            self.probs.iter_mut().for_each(|p| *p = uniform);
            return;
        }
        for prob in &mut self.probs {
            *prob /= total;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::answer::Answer;
    use crate::model::character::Character;
    use crate::model::question::Question;

    fn two_character_knowledge() -> KnowledgeBase {
        KnowledgeBase::new(
            vec![Question::new("q1", "Does your character wear a cape?")],
            vec![
                Character::new("a", "Caped").with_answer("q1", Answer::Yes),
                Character::new("b", "Plain").with_answer("q1", Answer::No),
            ],
        )
    }

    #[test]
    fn uniform_assigns_equal_mass() {
        let belief = Belief::uniform(&two_character_knowledge()).unwrap();
        assert_eq!(belief.prob(&"a".into()), Some(0.5));
        assert_eq!(belief.prob(&"b".into()), Some(0.5));
        assert!(belief.is_normalized(1e-12));
    }

    #[test]
    fn uniform_rejects_empty_knowledge() {
        let err = Belief::uniform(&KnowledgeBase::default()).expect_err("no characters");
        assert!(matches!(err, KnowledgeError::EmptyKnowledgeBase));
    }

    #[test]
    fn matching_yes_moves_mass_to_matching_character() {
        let kb = two_character_knowledge();
        let mut belief = Belief::uniform(&kb).unwrap();
        belief.apply_answer(
            &kb,
            &"q1".into(),
            PlayerAnswer::Yes,
            &CompatibilityTable::default(),
        );
        let a = belief.prob(&"a".into()).unwrap();
        assert!((a - 0.625 / 0.8).abs() < 1e-12, "got {a}");
        assert!(belief.is_normalized(1e-9));
        assert_eq!(belief.top().map(|(id, _)| id.as_str()), Some("a"));
    }

    #[test]
    fn floor_prevents_elimination() {
        let kb = two_character_knowledge();
        let mut belief = Belief::uniform(&kb).unwrap();
        let table = CompatibilityTable::default();
        for _ in 0..200 {
            belief.apply_answer(&kb, &"q1".into(), PlayerAnswer::Yes, &table);
        }
        let b = belief.prob(&"b".into()).unwrap();
        assert!(b > 0.0);
        assert!(belief.is_normalized(1e-9));
    }

    #[test]
    fn suppress_crushes_and_renormalizes() {
        let kb = two_character_knowledge();
        let mut belief = Belief::uniform(&kb).unwrap();
        assert!(belief.suppress(&"a".into()));
        let a = belief.prob(&"a".into()).unwrap();
        assert!((a - GUESS_MISS_FLOOR / (GUESS_MISS_FLOOR + 0.5)).abs() < 1e-12);
        assert!(belief.is_normalized(1e-9));
        assert!(!belief.suppress(&"missing".into()));
    }

    #[test]
    fn top_prefers_earlier_character_on_ties() {
        let belief = Belief::uniform(&two_character_knowledge()).unwrap();
        assert_eq!(belief.top().map(|(id, _)| id.as_str()), Some("a"));
    }
}
