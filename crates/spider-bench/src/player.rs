//! The answering side of a game, and the loop that feeds it to a [`Session`].

use spider_core::game::{GuessProposal, Outcome, Session, SessionError};
use spider_core::inference::TieBreak;
use spider_core::model::answer::PlayerAnswer;
use spider_core::model::question::Question;
use thiserror::Error;

/// Someone who knows the secret character.
pub trait Player {
    type Error: std::error::Error + Send + Sync + 'static;

    fn answer(&mut self, question: &Question) -> Result<PlayerAnswer, Self::Error>;

    /// `true` when the proposed guess is the secret character.
    fn confirm(&mut self, guess: &GuessProposal) -> Result<bool, Self::Error>;
}

#[derive(Debug, Error)]
pub enum DriveError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("player failed: {0}")]
    Player(#[source] E),
}

/// How a driven session ended.
#[derive(Debug, Clone, PartialEq)]
pub struct Played {
    pub turns: usize,
    pub outcome: Outcome,
}

/// Plays `session` to the end.
pub fn drive<P: Player>(
    session: &mut Session,
    player: &mut P,
    tie_break: &mut impl TieBreak,
) -> Result<Played, DriveError<P::Error>> {
    let mut turns = 0;
    loop {
        if let Some(outcome) = session.outcome() {
            return Ok(Played {
                turns,
                outcome: outcome.clone(),
            });
        }
        if let Some(question) = session.current_question().cloned() {
            let answer = player.answer(&question).map_err(DriveError::Player)?;
            session.answer(&question.id, answer, tie_break)?;
        } else if let Some(guess) = session.current_guess().cloned() {
            let correct = player.confirm(&guess).map_err(DriveError::Player)?;
            session.resolve_guess(correct, tie_break)?;
        } else {
            return Err(DriveError::Session(SessionError::GameOver));
        }
        turns += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spider_core::game::EngineConfig;
    use spider_core::inference::NoTieBreak;
    use spider_core::model::answer::Answer;
    use spider_core::model::character::Character;
    use spider_core::model::knowledge::KnowledgeBase;
    use std::convert::Infallible;

    /// Says "no" to everything.
    struct Contrarian;

    impl Player for Contrarian {
        type Error = Infallible;

        fn answer(&mut self, _question: &Question) -> Result<PlayerAnswer, Infallible> {
            Ok(PlayerAnswer::No)
        }

        fn confirm(&mut self, _guess: &GuessProposal) -> Result<bool, Infallible> {
            Ok(false)
        }
    }

    #[test]
    fn contrarian_exhausts_every_guess() {
        let kb = KnowledgeBase::new(
            vec![Question::new("q1", "Is your character a wolf?")],
            vec![
                Character::new("fenrir", "Fenrir").with_answer("q1", Answer::Yes),
                Character::new("sleipnir", "Sleipnir").with_answer("q1", Answer::No),
            ],
        );
        let mut session =
            Session::start(&kb, EngineConfig::default(), &mut NoTieBreak).expect("start");

        let played = drive(&mut session, &mut Contrarian, &mut NoTieBreak).expect("drive");

        assert_eq!(played.turns, 3);
        assert!(matches!(played.outcome, Outcome::Loss { .. }));
        assert_eq!(session.outcome(), Some(&played.outcome));
        assert_eq!(session.guesses().len(), 2);
    }
}
