use std::convert::Infallible;

use rand::Rng;
use rand::rngs::StdRng;
use spider_core::game::GuessProposal;
use spider_core::model::answer::PlayerAnswer;
use spider_core::model::character::Character;
use spider_core::model::question::Question;

use crate::player::Player;

/// Answers from the secret character's table, occasionally at random.
pub struct OraclePlayer {
    secret: Character,
    noise: f64,
    unknown_answer: PlayerAnswer,
    rng: StdRng,
    noisy_answers: usize,
}

impl OraclePlayer {
    pub fn new(secret: Character, noise: f64, unknown_answer: PlayerAnswer, rng: StdRng) -> Self {
        Self {
            secret,
            noise: noise.clamp(0.0, 1.0),
            unknown_answer,
            rng,
            noisy_answers: 0,
        }
    }

    pub fn secret(&self) -> &Character {
        &self.secret
    }

    /// Answers that were drawn at random instead of read from the table.
    pub fn noisy_answers(&self) -> usize {
        self.noisy_answers
    }
}

impl Player for OraclePlayer {
    type Error = Infallible;

    fn answer(&mut self, question: &Question) -> Result<PlayerAnswer, Infallible> {
        if self.noise > 0.0 && self.rng.gen_bool(self.noise) {
            self.noisy_answers += 1;
            let index = self.rng.gen_range(0..PlayerAnswer::ALL.len());
            return Ok(PlayerAnswer::ALL[index]);
        }
        let expected = self.secret.expected(&question.id);
        Ok(PlayerAnswer::from_expected(expected, self.unknown_answer))
    }

    fn confirm(&mut self, guess: &GuessProposal) -> Result<bool, Infallible> {
        Ok(guess.character_id == self.secret.id)
    }
}
