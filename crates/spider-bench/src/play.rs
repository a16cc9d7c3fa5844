//! Interactive terminal game.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use spider_core::game::{
    CharacterSuggestion, EngineConfig, GuessProposal, Outcome, QuestionSuggestion, Reveal,
    Session, SessionError, Submission, Suggestions,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use spider_core::inference::{RandomTieBreak, TieBreak};
use spider_core::model::answer::{Answer, AnswerParseError, PlayerAnswer};
use spider_core::model::character::Character;
use spider_core::model::id::QuestionId;
use spider_core::model::knowledge::KnowledgeBase;
use spider_core::model::question::Question;
use thiserror::Error;

use crate::player::{DriveError, Player, drive};
use crate::sink::timestamp_now;

#[derive(Debug, Error)]
pub enum PlayError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl From<DriveError<io::Error>> for PlayError {
    fn from(err: DriveError<io::Error>) -> Self {
        match err {
            DriveError::Session(source) => PlayError::Session(source),
            DriveError::Player(source) => PlayError::Io(source),
        }
    }
}

/// Reads answers from `input` and narrates to `output`.
pub struct TerminalPlayer<R, W> {
    input: R,
    output: W,
    questions_asked: usize,
    max_questions: usize,
}

impl<R: BufRead, W: Write> TerminalPlayer<R, W> {
    pub fn new(input: R, output: W, max_questions: usize) -> Self {
        Self {
            input,
            output,
            questions_asked: 0,
            max_questions,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn prompt(&mut self, text: &str) -> io::Result<String> {
        write!(self.output, "{text} ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before the game finished",
            ));
        }
        Ok(line.trim().to_string())
    }

    fn optional(&mut self, text: &str) -> io::Result<Option<String>> {
        let line = self.prompt(text)?;
        Ok((!line.is_empty()).then_some(line))
    }

    fn read_answer(&mut self, text: &str) -> io::Result<PlayerAnswer> {
        loop {
            let line = self.prompt(text)?;
            match parse_answer(&line) {
                Ok(answer) => return Ok(answer),
                Err(err) => writeln!(self.output, "{err}. Try y, n or m.")?,
            }
        }
    }

    fn read_yes_no(&mut self, text: &str) -> io::Result<bool> {
        loop {
            match parse_answer(&self.prompt(text)?) {
                Ok(PlayerAnswer::Yes) => return Ok(true),
                Ok(PlayerAnswer::No) => return Ok(false),
                _ => writeln!(self.output, "The Spider needs a plain yes or no.")?,
            }
        }
    }

    /// Collects the reveal and suggestions once the session has ended.
    fn debrief(&mut self, session: &Session) -> io::Result<(Reveal, Suggestions)> {
        let known = match session.outcome() {
            Some(Outcome::Win { character_name, .. }) => {
                writeln!(self.output, "The web prevailed! {character_name} was captured.")?;
                Some(character_name.clone())
            }
            _ => {
                writeln!(
                    self.output,
                    "The Spider could not ensnare the truth. Reveal your character to teach the web."
                )?;
                None
            }
        };

        let name = match known {
            Some(name) => Some(name),
            None => self.optional("Who was your character? (blank to skip)")?,
        };
        let notes = self.optional("Any hints so the web remembers? (blank to skip)")?;

        let character = name
            .as_deref()
            .and_then(|name| find_by_name(session.knowledge(), name));

        let new_character = match (&name, character) {
            (Some(name), None) => Some(CharacterSuggestion {
                name: name.clone(),
                answers: answers_from_session(session),
            }),
            _ => None,
        };

        let new_question = match self.optional("Suggest a question that would have helped (blank to skip)")? {
            Some(text) => {
                let mut answers = BTreeMap::new();
                if let Some(character) = character {
                    let prompt = format!("How would {} answer it? [y/n/m]", character.name);
                    let answer = self.read_answer(&prompt)?;
                    answers.insert(character.id.clone(), Answer::from(answer));
                }
                Some(QuestionSuggestion { text, answers })
            }
            None => None,
        };

        writeln!(self.output, "The Spider thanks you. Your insights are woven into the web.")?;
        Ok((
            Reveal { name, notes },
            Suggestions {
                new_character,
                new_question,
            },
        ))
    }
}

impl<R: BufRead, W: Write> Player for TerminalPlayer<R, W> {
    type Error = io::Error;

    fn answer(&mut self, question: &Question) -> io::Result<PlayerAnswer> {
        self.questions_asked += 1;
        writeln!(
            self.output,
            "\nQuestion {} / {}: {}",
            self.questions_asked, self.max_questions, question.text
        )?;
        let answer = self.read_answer("[y]es, [n]o or [m]aybe?")?;
        writeln!(self.output, "{}", narration_for_answer(answer))?;
        Ok(answer)
    }

    fn confirm(&mut self, guess: &GuessProposal) -> io::Result<bool> {
        writeln!(
            self.output,
            "\nThe Spider believes you ponder {}. Is it correct?",
            guess.character_name
        )?;
        let correct = self.read_yes_no("[y/n]")?;
        if !correct {
            writeln!(self.output, "The Spider misses... but we spin anew.")?;
        }
        Ok(correct)
    }
}

/// Plays one game over `input`/`output` and returns the submission to store.
pub fn run_interactive<R: BufRead, W: Write>(
    knowledge: &KnowledgeBase,
    config: EngineConfig,
    input: R,
    output: W,
    tie_break: &mut impl TieBreak,
) -> Result<Submission, PlayError> {
    let mut player = TerminalPlayer::new(input, output, config.max_questions);
    writeln!(
        player.output,
        "Think of a character. The Spider has {} questions and {} guesses to find them.",
        config.max_questions, config.max_guesses
    )?;

    let mut session = Session::start(knowledge, config, tie_break)?;
    drive(&mut session, &mut player, tie_break)?;

    let (revealed, suggestions) = player.debrief(&session)?;
    Ok(Submission::new(timestamp_now(), session.record())
        .with_reveal(revealed)
        .with_suggestions(suggestions))
}

/// Tie-break jitter for an interactive game. Without a seed every launch
/// draws a fresh one, so repeated plays break ties differently.
pub fn play_tie_break(seed: Option<u64>, noise: f64) -> RandomTieBreak<StdRng> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    RandomTieBreak::new(rng, noise)
}

/// Accepts `y`, `n` and `m` as well as the full words.
pub fn parse_answer(input: &str) -> Result<PlayerAnswer, AnswerParseError> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" => Ok(PlayerAnswer::Yes),
        "n" => Ok(PlayerAnswer::No),
        "m" => Ok(PlayerAnswer::Maybe),
        other => other.parse(),
    }
}

fn narration_for_answer(answer: PlayerAnswer) -> &'static str {
    match answer {
        PlayerAnswer::Yes => "The silken thread pulls taut...",
        PlayerAnswer::No => "The web shifts, discarding errant strands.",
        PlayerAnswer::Maybe => "Ambiguity only thickens the web.",
    }
}

fn find_by_name<'a>(knowledge: &'a KnowledgeBase, name: &str) -> Option<&'a Character> {
    knowledge
        .characters
        .iter()
        .find(|character| character.name.eq_ignore_ascii_case(name.trim()))
}

fn answers_from_session(session: &Session) -> BTreeMap<QuestionId, Answer> {
    session
        .asked()
        .iter()
        .map(|entry| (entry.question_id.clone(), Answer::from(entry.answer)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use spider_core::game::LossReason;
    use spider_core::inference::NoTieBreak;
    use std::io::Cursor;

    fn knights() -> KnowledgeBase {
        KnowledgeBase::new(
            vec![Question::new("knight", "Is your character a knight?")],
            vec![
                Character::new("lancelot", "Lancelot").with_answer("knight", Answer::Yes),
                Character::new("merlin", "Merlin").with_answer("knight", Answer::No),
            ],
        )
    }

    fn play(kb: &KnowledgeBase, script: &str) -> (Result<Submission, PlayError>, String) {
        let mut output = Vec::new();
        let result = run_interactive(
            kb,
            EngineConfig::default(),
            Cursor::new(script.as_bytes().to_vec()),
            &mut output,
            &mut NoTieBreak,
        );
        (result, String::from_utf8(output).expect("utf8 output"))
    }

    #[test]
    fn shortcuts_and_full_words_parse() {
        assert_eq!(parse_answer("Y"), Ok(PlayerAnswer::Yes));
        assert_eq!(parse_answer(" no "), Ok(PlayerAnswer::No));
        assert_eq!(parse_answer("m"), Ok(PlayerAnswer::Maybe));
        assert!(matches!(
            parse_answer("perhaps"),
            Err(AnswerParseError::UnknownAnswerLiteral(_))
        ));
    }

    #[test]
    fn win_reveals_the_guess_and_records_a_question_suggestion() {
        let (result, output) = play(&knights(), "perhaps\ny\ny\n\nDoes your character carry a lance?\ny\n");
        let submission = result.expect("game completes");

        assert!(output.contains("Try y, n or m."));
        assert!(output.contains("The silken thread pulls taut..."));
        assert!(output.contains("The web prevailed! Lancelot was captured."));

        assert!(submission.session.correct);
        assert_eq!(submission.revealed.name.as_deref(), Some("Lancelot"));
        assert!(submission.revealed.notes.is_none());
        assert!(submission.suggestions.new_character.is_none());
        let question = submission.suggestions.new_question.expect("suggestion");
        assert_eq!(question.text, "Does your character carry a lance?");
        assert_eq!(question.answers.get(&"lancelot".into()), Some(&Answer::Yes));
    }

    #[test]
    fn loss_collects_a_new_character_from_the_answers_given() {
        let (result, output) = play(&knights(), "m\nn\nn\nGawain\nGreen girdle\n\n");
        let submission = result.expect("game completes");

        assert!(output.contains("The Spider misses... but we spin anew."));
        assert!(output.contains("Reveal your character"));
        assert_eq!(
            submission.session.outcome,
            Some(Outcome::Loss {
                reason: LossReason::CandidatesExhausted
            })
        );
        assert_eq!(submission.revealed.name.as_deref(), Some("Gawain"));
        assert_eq!(submission.revealed.notes.as_deref(), Some("Green girdle"));

        let character = submission.suggestions.new_character.expect("new character");
        assert_eq!(character.name, "Gawain");
        assert_eq!(character.answers.get(&"knight".into()), Some(&Answer::Maybe));
        assert!(submission.suggestions.new_question.is_none());
    }

    #[test]
    fn unseeded_games_jitter_differently_and_seeded_ones_replay() {
        let draws = |tie_break: &mut RandomTieBreak<StdRng>| -> Vec<f64> {
            (0..8).map(|_| tie_break.jitter()).collect()
        };

        let first = draws(&mut play_tie_break(None, 0.05));
        let second = draws(&mut play_tie_break(None, 0.05));
        assert_ne!(first, second);
        assert!(first.iter().all(|value| (0.0..0.05).contains(value)));

        let seeded = draws(&mut play_tie_break(Some(11), 0.05));
        assert_eq!(seeded, draws(&mut play_tie_break(Some(11), 0.05)));
    }

    #[test]
    fn closed_input_is_an_error() {
        let (result, _) = play(&knights(), "y\n");
        assert!(matches!(result, Err(PlayError::Io(err)) if err.kind() == io::ErrorKind::UnexpectedEof));
    }
}
