//! Question scoring by the entropy of the predicted answer distribution.

use crate::belief::{BASELINE, Belief};
use crate::model::answer::Answer;
use crate::model::id::QuestionId;
use crate::model::knowledge::KnowledgeBase;
use crate::model::question::Question;
use rand::Rng;

/// Source of the small perturbation added to each question score.
pub trait TieBreak {
    fn jitter(&mut self) -> f64;
}

/// Uniform jitter in `[0, noise)` drawn from `R`.
#[derive(Debug)]
pub struct RandomTieBreak<R> {
    rng: R,
    noise: f64,
}

impl<R: Rng> RandomTieBreak<R> {
    pub fn new(rng: R, noise: f64) -> Self {
        Self {
            rng,
            noise: noise.max(0.0),
        }
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }
}

impl<R: Rng> TieBreak for RandomTieBreak<R> {
    fn jitter(&mut self) -> f64 {
        if self.noise == 0.0 {
            return 0.0;
        }
        self.rng.gen_range(0.0..self.noise)
    }
}

/// Deterministic scoring with no perturbation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTieBreak;

impl TieBreak for NoTieBreak {
    fn jitter(&mut self) -> f64 {
        0.0
    }
}

impl<T: TieBreak + ?Sized> TieBreak for &mut T {
    fn jitter(&mut self) -> f64 {
        (**self).jitter()
    }
}

/// Predicted probability of each answer category (indexed by [`Answer::index`]).
///
/// Every bucket starts at [`BASELINE`] so an empty category never produces a
/// degenerate entropy term.
pub fn answer_distribution(
    knowledge: &KnowledgeBase,
    belief: &Belief,
    question: &QuestionId,
) -> [f64; 4] {
    let mut buckets = [BASELINE; 4];
    for (index, character) in knowledge.characters.iter().enumerate() {
        let expected: Answer = character.expected(question);
        buckets[expected.index()] += belief.prob_at(index);
    }
    let total: f64 = buckets.iter().sum();
    buckets.map(|value| value / total)
}

/// Shannon entropy in bits; zero entries contribute nothing.
pub fn entropy_bits(distribution: &[f64]) -> f64 {
    -distribution
        .iter()
        .filter(|p| **p > 0.0)
        .map(|p| p * p.log2())
        .sum::<f64>()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredQuestion<'a> {
    pub question: &'a Question,
    pub entropy: f64,
    pub score: f64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct QuestionScorer;

impl QuestionScorer {
    /// Entropy of every question not in `asked`, in knowledge-base order.
    pub fn score_all<'a>(
        knowledge: &'a KnowledgeBase,
        belief: &Belief,
        asked: &[QuestionId],
        tie_break: &mut impl TieBreak,
    ) -> Vec<ScoredQuestion<'a>> {
        knowledge
            .questions
            .iter()
            .filter(|question| !asked.contains(&question.id))
            .map(|question| {
                let entropy = entropy_bits(&answer_distribution(knowledge, belief, &question.id));
                ScoredQuestion {
                    question,
                    entropy,
                    score: entropy + tie_break.jitter(),
                }
            })
            .collect()
    }

    /// Highest perturbed score among unasked questions. Equal scores keep the
    /// earlier question. `None` when every question has been asked.
    pub fn select<'a>(
        knowledge: &'a KnowledgeBase,
        belief: &Belief,
        asked: &[QuestionId],
        tie_break: &mut impl TieBreak,
    ) -> Option<ScoredQuestion<'a>> {
        Self::score_all(knowledge, belief, asked, tie_break)
            .into_iter()
            .fold(None::<ScoredQuestion<'a>>, |best, candidate| match best {
                Some(current) if current.score >= candidate.score => Some(current),
                _ => Some(candidate),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::character::Character;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn knowledge() -> KnowledgeBase {
        KnowledgeBase::new(
            vec![
                Question::new("split", "Is your character a detective?"),
                Question::new("useless", "Does your character breathe?"),
                Question::new("split_too", "Is your character fictional?"),
            ],
            vec![
                Character::new("a", "A")
                    .with_answer("split", Answer::Yes)
                    .with_answer("useless", Answer::Yes)
                    .with_answer("split_too", Answer::No),
                Character::new("b", "B")
                    .with_answer("split", Answer::No)
                    .with_answer("useless", Answer::Yes)
                    .with_answer("split_too", Answer::Yes),
            ],
        )
    }

    #[test]
    fn distribution_sums_to_one_with_baseline_seeds() {
        let kb = knowledge();
        let belief = Belief::uniform(&kb).unwrap();
        let dist = answer_distribution(&kb, &belief, &"useless".into());
        assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(dist.iter().all(|p| *p > 0.0));
        assert!((dist[Answer::Yes.index()] - 1.05 / 1.2).abs() < 1e-12);
    }

    #[test]
    fn entropy_of_uniform_four_way_split_is_two_bits() {
        assert!((entropy_bits(&[0.25; 4]) - 2.0).abs() < 1e-12);
        assert_eq!(entropy_bits(&[1.0, 0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn even_split_beats_unanimous_question() {
        let kb = knowledge();
        let belief = Belief::uniform(&kb).unwrap();
        let best = QuestionScorer::select(&kb, &belief, &[], &mut NoTieBreak).unwrap();
        assert_eq!(best.question.id.as_str(), "split");
        assert!(best.entropy > 1.0);
    }

    #[test]
    fn asked_questions_are_skipped() {
        let kb = knowledge();
        let belief = Belief::uniform(&kb).unwrap();
        let asked = vec![QuestionId::new("split")];
        let best = QuestionScorer::select(&kb, &belief, &asked, &mut NoTieBreak).unwrap();
        assert_eq!(best.question.id.as_str(), "split_too");

        let all: Vec<QuestionId> = kb.questions.iter().map(|q| q.id.clone()).collect();
        assert!(QuestionScorer::select(&kb, &belief, &all, &mut NoTieBreak).is_none());
    }

    #[test]
    fn random_tie_break_always_picks_one_of_the_tied_questions() {
        let kb = knowledge();
        let belief = Belief::uniform(&kb).unwrap();
        let asked = vec![QuestionId::new("useless")];
        let mut tie_break = RandomTieBreak::new(SmallRng::seed_from_u64(7), 0.05);
        for _ in 0..64 {
            let pick = QuestionScorer::select(&kb, &belief, &asked, &mut tie_break).unwrap();
            assert!(matches!(pick.question.id.as_str(), "split" | "split_too"));
            assert!(pick.score >= pick.entropy && pick.score <= pick.entropy + 0.05);
        }
    }

    #[test]
    fn zero_noise_yields_zero_jitter() {
        let mut tie_break = RandomTieBreak::new(SmallRng::seed_from_u64(1), 0.0);
        assert_eq!(tie_break.jitter(), 0.0);
    }
}
