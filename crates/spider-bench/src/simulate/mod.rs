mod oracle;

pub use oracle::OraclePlayer;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use spider_core::game::{
    LossReason, Outcome, Reveal, Session, SessionError, Submission, SubmissionSink,
};
use spider_core::inference::RandomTieBreak;
use spider_core::model::id::{CharacterId, QuestionId};
use spider_core::model::knowledge::{KnowledgeBase, KnowledgeError};
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{ResolvedOutputs, SpiderConfig};
use crate::logging::LoggingGuard;
use crate::player::{DriveError, Played, drive};
use crate::sink::{submit_or_warn, timestamp_now};
use crate::telemetry::{
    TelemetryError, TelemetryOutputs, append_highlights_to_markdown, write_summary_outputs,
};

/// Plays many oracle games and aggregates the results.
pub struct SimulationRunner {
    config: SpiderConfig,
    outputs: ResolvedOutputs,
    knowledge: KnowledgeBase,
    logging_enabled: bool,
    logging: Option<LoggingGuard>,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub sessions_played: usize,
    pub wins: usize,
    pub rows_written: usize,
    pub submissions_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
    pub telemetry_outputs: Option<TelemetryOutputs>,
}

/// What one simulated game produced.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub index: usize,
    pub seed: u64,
    pub secret_id: CharacterId,
    pub secret_name: String,
    pub outcome: Outcome,
    pub questions: usize,
    pub guesses: usize,
    pub turns: usize,
    pub noisy_answers: usize,
}

impl SimulationRunner {
    /// Build a runner from a validated configuration.
    pub fn new(
        config: SpiderConfig,
        outputs: ResolvedOutputs,
        knowledge: KnowledgeBase,
    ) -> Result<Self, RunnerError> {
        knowledge.validate()?;
        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            knowledge,
            logging: None,
        })
    }

    /// Hands over the structured log writer so it can be flushed before summarising.
    pub fn with_logging(mut self, guard: Option<LoggingGuard>) -> Self {
        self.logging = guard;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Runs every configured session, streaming JSONL rows to disk.
    pub fn run(&mut self, mut sink: Option<&mut dyn SubmissionSink>) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.simulation.seed.unwrap_or(0));
        let mut analytics = AnalyticsCollector::new(self.config.run_id.clone());
        let mut rows_written = 0usize;
        let mut submissions_written = 0usize;

        for index in 0..self.config.simulation.sessions {
            let seed = rng.next_u64();
            let (session, result) = self.play_session(index, seed)?;
            analytics.record(&result);
            write_session_row(&mut writer, &self.config.run_id, &session, &result)?;
            rows_written += 1;

            if let Some(sink) = sink.as_deref_mut() {
                let submission = Submission::new(timestamp_now(), session.record()).with_reveal(
                    Reveal {
                        name: Some(result.secret_name.clone()),
                        notes: Some(format!(
                            "oracle run '{}' session {index}",
                            self.config.run_id
                        )),
                    },
                );
                if submit_or_warn(sink, &submission) {
                    submissions_written += 1;
                }
            }
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;

        let telemetry_dir = self.outputs.telemetry_dir();
        let flushed = self.logging.take().map(LoggingGuard::finish);
        let telemetry_path = match flushed {
            Some(path) => Some(path),
            None if self.logging_enabled => Some(telemetry_dir.join("telemetry.jsonl")),
            None => None,
        };

        let telemetry_outputs = if let Some(path) = telemetry_path.as_ref() {
            write_summary_outputs(path, &telemetry_dir)?
        } else {
            None
        };

        if let Some(outputs) = telemetry_outputs.as_ref() {
            append_highlights_to_markdown(&self.outputs.summary_md, outputs)?;
        }

        Ok(RunSummary {
            sessions_played: summary.sessions,
            wins: summary.wins,
            rows_written,
            submissions_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
            telemetry_outputs,
        })
    }

    fn play_session(&self, index: usize, seed: u64) -> Result<(Session, SessionResult), RunnerError> {
        let simulation = &self.config.simulation;
        let mut session_rng = StdRng::seed_from_u64(seed);
        let secret_index = session_rng.gen_range(0..self.knowledge.characters.len());
        let secret = self.knowledge.characters[secret_index].clone();

        let mut oracle = OraclePlayer::new(
            secret,
            simulation.answer_noise,
            simulation.unknown_answer,
            StdRng::seed_from_u64(session_rng.next_u64()),
        );
        let mut tie_break = RandomTieBreak::new(
            StdRng::seed_from_u64(session_rng.next_u64()),
            self.config.engine.tie_break_noise,
        );

        let mut session = Session::start(&self.knowledge, self.config.engine.clone(), &mut tie_break)?;
        let Played { turns, outcome } = drive(&mut session, &mut oracle, &mut tie_break)
            .map_err(|err| match err {
                DriveError::Session(source) => RunnerError::Session(source),
                DriveError::Player(never) => match never {},
            })?;
        let result = SessionResult {
            index,
            seed,
            secret_id: oracle.secret().id.clone(),
            secret_name: oracle.secret().name.clone(),
            outcome,
            questions: session.questions_asked(),
            guesses: session.guesses().len(),
            turns,
            noisy_answers: oracle.noisy_answers(),
        };

        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            event!(
                target: "spider_bench::session",
                Level::INFO,
                run_id = %self.config.run_id,
                session_index = index as u32,
                secret = %result.secret_id,
                won = result.outcome.is_win(),
                questions = result.questions as u32,
                guesses = result.guesses as u32,
                noisy_answers = result.noisy_answers as u32,
            );
        }

        Ok((session, result))
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct SessionLogRow<'a> {
    run_id: &'a str,
    session_id: String,
    session_index: usize,
    session_seed: u64,
    secret_id: &'a CharacterId,
    secret_name: &'a str,
    won: bool,
    loss_reason: Option<LossReason>,
    questions: usize,
    guesses: usize,
    turns: usize,
    noisy_answers: usize,
    asked: Vec<&'a QuestionId>,
    guessed: Vec<&'a CharacterId>,
}

fn write_session_row(
    writer: &mut BufWriter<File>,
    run_id: &str,
    session: &Session,
    result: &SessionResult,
) -> Result<(), RunnerError> {
    let loss_reason = match &result.outcome {
        Outcome::Loss { reason } => Some(*reason),
        Outcome::Win { .. } => None,
    };
    let row = SessionLogRow {
        run_id,
        session_id: format!("S{:05}", result.index),
        session_index: result.index,
        session_seed: result.seed,
        secret_id: &result.secret_id,
        secret_name: &result.secret_name,
        won: result.outcome.is_win(),
        loss_reason,
        questions: result.questions,
        guesses: result.guesses,
        turns: result.turns,
        noisy_answers: result.noisy_answers,
        asked: session.asked().iter().map(|entry| &entry.question_id).collect(),
        guessed: session.guesses().iter().map(|guess| &guess.character_id).collect(),
    };

    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("knowledge base rejected: {0}")]
    Knowledge(#[from] KnowledgeError),
    #[error("session failed: {0}")]
    Session(#[from] SessionError),
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("telemetry summarisation failed: {0}")]
    Telemetry(#[from] TelemetryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::load_knowledge;
    use spider_core::game::MemorySink;

    fn config(dir: &Path, sessions: usize, noise: f64) -> SpiderConfig {
        let yaml = format!(
            r#"
run_id: "unit"
simulation:
  seed: 7
  sessions: {sessions}
  answer_noise: {noise}
outputs:
  sessions_dir: "{dir}/sessions"
  jsonl: "{dir}/sessions.jsonl"
  summary_md: "{dir}/summary.md"
"#,
            dir = dir.display()
        );
        let mut cfg: SpiderConfig = serde_yaml::from_str(&yaml).expect("parse");
        cfg.validate().expect("valid");
        cfg
    }

    fn runner(dir: &Path, sessions: usize, noise: f64) -> SimulationRunner {
        let cfg = config(dir, sessions, noise);
        let outputs = cfg.resolved_outputs();
        SimulationRunner::new(cfg, outputs, load_knowledge(None).expect("seed")).expect("runner")
    }

    #[test]
    fn truthful_oracle_is_always_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let summary = runner(dir.path(), 30, 0.0).run(None).expect("run");

        assert_eq!(summary.sessions_played, 30);
        assert_eq!(summary.rows_written, 30);
        assert_eq!(summary.wins, 30);
        assert_eq!(summary.submissions_written, 0);
    }

    #[test]
    fn same_seed_replays_identical_rows() {
        let first = tempfile::tempdir().expect("temp dir");
        let second = tempfile::tempdir().expect("temp dir");
        let a = runner(first.path(), 12, 0.2).run(None).expect("first run");
        let b = runner(second.path(), 12, 0.2).run(None).expect("second run");

        let rows_a = fs::read_to_string(a.jsonl_path).expect("rows a");
        let rows_b = fs::read_to_string(b.jsonl_path).expect("rows b");
        assert_eq!(rows_a, rows_b);
        assert_eq!(rows_a.lines().count(), 12);
    }

    #[test]
    fn every_session_reaches_the_sink() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut sink = MemorySink::new();
        let summary = runner(dir.path(), 5, 0.3)
            .run(Some(&mut sink))
            .expect("run");

        assert_eq!(summary.submissions_written, 5);
        assert_eq!(sink.submissions().len(), 5);
        for submission in sink.submissions() {
            assert!(submission.session.outcome.is_some());
            assert!(submission.revealed.name.is_some());
        }
    }
}
