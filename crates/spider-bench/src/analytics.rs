use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Serialize;
use spider_core::game::{LossReason, Outcome};
use spider_core::model::id::CharacterId;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::simulate::SessionResult;

const CONFIDENCE_LEVEL: f64 = 0.95;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build normal distribution: {0}")]
    Distribution(String),
}

/// Accumulates per-session results into a run summary.
pub struct AnalyticsCollector {
    run_id: String,
    overall: Accumulator,
    loss_reasons: BTreeMap<String, usize>,
    characters: HashMap<CharacterId, CharacterAccumulator>,
    character_order: Vec<CharacterId>,
}

impl AnalyticsCollector {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            overall: Accumulator::default(),
            loss_reasons: BTreeMap::new(),
            characters: HashMap::new(),
            character_order: Vec::new(),
        }
    }

    pub fn record(&mut self, result: &SessionResult) {
        let won = result.outcome.is_win();
        self.overall.record(won, result.questions, result.guesses);

        if let Outcome::Loss { reason } = &result.outcome {
            *self
                .loss_reasons
                .entry(loss_label(*reason).to_string())
                .or_insert(0) += 1;
        }

        if !self.characters.contains_key(&result.secret_id) {
            self.character_order.push(result.secret_id.clone());
        }
        self.characters
            .entry(result.secret_id.clone())
            .or_insert_with(|| CharacterAccumulator {
                name: result.secret_name.clone(),
                stats: Accumulator::default(),
            })
            .stats
            .record(won, result.questions, result.guesses);
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let z = z_score(CONFIDENCE_LEVEL)?;

        let mut characters = Vec::with_capacity(self.character_order.len());
        for id in &self.character_order {
            if let Some(acc) = self.characters.remove(id) {
                characters.push(CharacterReport {
                    id: id.clone(),
                    name: acc.name,
                    sessions: acc.stats.sessions,
                    wins: acc.stats.wins,
                    win_rate: acc.stats.win_rate(),
                    mean_questions: acc.stats.mean_questions(),
                });
            }
        }
        characters.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(AnalyticsSummary {
            run_id: self.run_id,
            sessions: self.overall.sessions,
            wins: self.overall.wins,
            win_rate: self.overall.win_rate(),
            ci95: win_rate_interval(self.overall.wins, self.overall.sessions, z),
            mean_questions: self.overall.mean_questions(),
            mean_guesses: self.overall.mean_guesses(),
            loss_reasons: self.loss_reasons,
            characters,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sessions: usize,
    wins: usize,
    questions: usize,
    guesses: usize,
}

impl Accumulator {
    fn record(&mut self, won: bool, questions: usize, guesses: usize) {
        self.sessions += 1;
        if won {
            self.wins += 1;
        }
        self.questions += questions;
        self.guesses += guesses;
    }

    fn win_rate(&self) -> f64 {
        ratio(self.wins, self.sessions)
    }

    fn mean_questions(&self) -> f64 {
        ratio(self.questions, self.sessions)
    }

    fn mean_guesses(&self) -> f64 {
        ratio(self.guesses, self.sessions)
    }
}

struct CharacterAccumulator {
    name: String,
    stats: Accumulator,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn z_score(level: f64) -> Result<f64, AnalyticsError> {
    let normal = Normal::new(0.0, 1.0).map_err(|e| AnalyticsError::Distribution(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + level / 2.0))
}

/// Normal-approximation interval for a win rate, clamped to [0, 1].
fn win_rate_interval(wins: usize, sessions: usize, z: f64) -> (f64, f64) {
    if sessions == 0 {
        return (0.0, 0.0);
    }
    let p = ratio(wins, sessions);
    let half_width = z * (p * (1.0 - p) / sessions as f64).sqrt();
    ((p - half_width).max(0.0), (p + half_width).min(1.0))
}

fn loss_label(reason: LossReason) -> &'static str {
    match reason {
        LossReason::CandidatesExhausted => "candidates_exhausted",
        LossReason::GuessLimit => "guess_limit",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterReport {
    pub id: CharacterId,
    pub name: String,
    pub sessions: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub mean_questions: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub run_id: String,
    pub sessions: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub ci95: (f64, f64),
    pub mean_questions: f64,
    pub mean_guesses: f64,
    pub loss_reasons: BTreeMap<String, usize>,
    pub characters: Vec<CharacterReport>,
}

impl AnalyticsSummary {
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# Simulation Summary: {}\n\n", self.run_id));
        out.push_str(&format!("- Sessions: {}\n", self.sessions));
        out.push_str(&format!(
            "- Win rate: {:.1}% ({} wins), 95% CI [{:.1}%, {:.1}%]\n",
            self.win_rate * 100.0,
            self.wins,
            self.ci95.0 * 100.0,
            self.ci95.1 * 100.0
        ));
        out.push_str(&format!("- Mean questions asked: {:.2}\n", self.mean_questions));
        out.push_str(&format!("- Mean guesses made: {:.2}\n", self.mean_guesses));

        out.push_str("\n## Losses\n");
        if self.loss_reasons.is_empty() {
            out.push_str("- <none>\n");
        } else {
            for (reason, count) in &self.loss_reasons {
                out.push_str(&format!("- {reason}: {count}\n"));
            }
        }

        out.push_str("\n## Characters\n\n");
        out.push_str("| Character | Sessions | Wins | Win % | Avg questions |\n");
        out.push_str("|-----------|----------|------|-------|---------------|\n");
        for character in &self.characters {
            out.push_str(&format!(
                "| {name} | {sessions} | {wins} | {win:.1}% | {questions:.2} |\n",
                name = character.name,
                sessions = character.sessions,
                wins = character.wins,
                win = character.win_rate * 100.0,
                questions = character.mean_questions,
            ));
        }
        out
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.render_markdown()).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }
}
