use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse telemetry JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize)]
pub struct TelemetrySummary {
    pub questions: QuestionTelemetrySummary,
    pub answers: AnswerTelemetrySummary,
    pub guesses: GuessTelemetrySummary,
    pub outcomes: OutcomeTelemetrySummary,
}

#[derive(Debug, Default, Serialize)]
pub struct QuestionTelemetrySummary {
    pub count: usize,
    pub avg_entropy: Option<f64>,
    pub avg_score: Option<f64>,
    pub avg_belief_entropy: Option<f64>,
}

#[derive(Debug, Default, Serialize)]
pub struct AnswerTelemetrySummary {
    pub count: usize,
    pub answer_counts: BTreeMap<String, usize>,
    pub avg_top_probability: Option<f64>,
    pub avg_margin: Option<f64>,
}

#[derive(Debug, Default, Serialize)]
pub struct GuessTelemetrySummary {
    pub count: usize,
    pub correct: usize,
    pub avg_probability: Option<f64>,
    pub reason_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Default, Serialize)]
pub struct OutcomeTelemetrySummary {
    pub count: usize,
    pub wins: usize,
    pub avg_questions: Option<f64>,
}

#[derive(Debug)]
struct Average {
    sum: f64,
    count: usize,
}

impl Average {
    fn new() -> Self {
        Self { sum: 0.0, count: 0 }
    }

    fn add_field(&mut self, fields: &Map<String, Value>, key: &str) {
        if let Some(value) = fields.get(key).and_then(Value::as_f64) {
            self.sum += value;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Aggregate the engine's question, answer, guess and outcome events.
pub fn summarise_telemetry(path: &Path) -> Result<TelemetrySummary, TelemetryError> {
    if !path.exists() {
        return Ok(TelemetrySummary::default());
    }

    let file = File::open(path).map_err(|source| TelemetryError::Io {
        context: "opening telemetry log",
        source,
    })?;
    let reader = BufReader::new(file);

    let mut summary = TelemetrySummary::default();
    let mut question_entropy = Average::new();
    let mut question_score = Average::new();
    let mut belief_entropy = Average::new();
    let mut answer_top = Average::new();
    let mut answer_margin = Average::new();
    let mut guess_probability = Average::new();
    let mut outcome_questions = Average::new();

    for line in reader.lines() {
        let line = line.map_err(|source| TelemetryError::Io {
            context: "reading telemetry line",
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let payload: Value = serde_json::from_str(&line)?;
        let target = payload
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let fields = payload
            .get("fields")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        match target {
            "spider_core::question" => {
                summary.questions.count += 1;
                question_entropy.add_field(&fields, "entropy");
                question_score.add_field(&fields, "score");
                belief_entropy.add_field(&fields, "belief_entropy");
            }
            "spider_core::answer" => {
                summary.answers.count += 1;
                *summary
                    .answers
                    .answer_counts
                    .entry(label(&fields, "answer"))
                    .or_insert(0) += 1;
                answer_top.add_field(&fields, "top_probability");
                answer_margin.add_field(&fields, "margin");
            }
            "spider_core::guess" => {
                summary.guesses.count += 1;
                if fields.get("correct").and_then(Value::as_bool) == Some(true) {
                    summary.guesses.correct += 1;
                }
                guess_probability.add_field(&fields, "probability");
                *summary
                    .guesses
                    .reason_counts
                    .entry(label(&fields, "reason"))
                    .or_insert(0) += 1;
            }
            "spider_core::outcome" => {
                summary.outcomes.count += 1;
                if fields.get("won").and_then(Value::as_bool) == Some(true) {
                    summary.outcomes.wins += 1;
                }
                outcome_questions.add_field(&fields, "questions_asked");
            }
            _ => {}
        }
    }

    summary.questions.avg_entropy = question_entropy.mean();
    summary.questions.avg_score = question_score.mean();
    summary.questions.avg_belief_entropy = belief_entropy.mean();
    summary.answers.avg_top_probability = answer_top.mean();
    summary.answers.avg_margin = answer_margin.mean();
    summary.guesses.avg_probability = guess_probability.mean();
    summary.outcomes.avg_questions = outcome_questions.mean();

    Ok(summary)
}

fn label(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("<unset>")
        .to_string()
}

pub fn write_summary_outputs(
    telemetry_path: &Path,
    output_dir: &Path,
) -> Result<Option<TelemetryOutputs>, TelemetryError> {
    if !telemetry_path.exists() {
        return Ok(None);
    }

    let summary = summarise_telemetry(telemetry_path)?;
    let json_path = output_dir.join("telemetry_summary.json");
    let md_path = output_dir.join("telemetry_summary.md");

    std::fs::write(&json_path, serde_json::to_vec_pretty(&summary)?).map_err(|source| {
        TelemetryError::Io {
            context: "writing telemetry summary json",
            source,
        }
    })?;

    let markdown = render_markdown(&summary, telemetry_path);
    std::fs::write(&md_path, markdown).map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary markdown",
        source,
    })?;

    Ok(Some(TelemetryOutputs {
        summary,
        json_path,
        markdown_path: md_path,
    }))
}

pub fn append_highlights_to_markdown(
    summary_path: &Path,
    outputs: &TelemetryOutputs,
) -> Result<(), TelemetryError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(summary_path)
        .map_err(|source| TelemetryError::Io {
            context: "opening summary markdown for telemetry append",
            source,
        })?;

    let summary = &outputs.summary;
    let mut section = String::new();
    section.push_str("\n## Telemetry Highlights\n");
    section.push_str(&format!(
        "- Questions scored: {}\n",
        summary.questions.count
    ));
    if let Some(value) = summary.questions.avg_score {
        section.push_str(&format!("- Avg question score: {:.3}\n", value));
    }
    section.push_str(&format!(
        "- Guesses: {} ({} correct)\n",
        summary.guesses.count, summary.guesses.correct
    ));
    if let Some(value) = summary.guesses.avg_probability {
        section.push_str(&format!("- Avg guess probability: {:.3}\n", value));
    }
    if !summary.guesses.reason_counts.is_empty() {
        section.push_str("- Guess reasons:\n");
        for (label, count) in &summary.guesses.reason_counts {
            section.push_str(&format!("  - {}: {}\n", label, count));
        }
    }

    write!(file, "{section}").map_err(|source| TelemetryError::Io {
        context: "writing telemetry highlights",
        source,
    })?;

    Ok(())
}

fn render_markdown(summary: &TelemetrySummary, telemetry_path: &Path) -> String {
    let mut output = String::new();
    output.push_str("# Telemetry Summary\n\n");
    output.push_str(&format!("- Source: `{}`\n\n", telemetry_path.display()));

    output.push_str("## Questions\n");
    output.push_str(&format!("- Events: {}\n", summary.questions.count));
    push_avg(&mut output, "Avg answer entropy (bits)", summary.questions.avg_entropy);
    push_avg(&mut output, "Avg score", summary.questions.avg_score);
    push_avg(
        &mut output,
        "Avg belief entropy (bits)",
        summary.questions.avg_belief_entropy,
    );
    output.push('\n');

    output.push_str("## Answers\n");
    output.push_str(&format!("- Events: {}\n", summary.answers.count));
    for (label, count) in &summary.answers.answer_counts {
        output.push_str(&format!("  - {}: {}\n", label, count));
    }
    push_avg(&mut output, "Avg top probability", summary.answers.avg_top_probability);
    push_avg(&mut output, "Avg margin over runner-up", summary.answers.avg_margin);
    output.push('\n');

    output.push_str("## Guesses\n");
    output.push_str(&format!(
        "- Events: {} ({} correct)\n",
        summary.guesses.count, summary.guesses.correct
    ));
    push_avg(&mut output, "Avg probability", summary.guesses.avg_probability);
    for (label, count) in &summary.guesses.reason_counts {
        output.push_str(&format!("  - {}: {}\n", label, count));
    }
    output.push('\n');

    output.push_str("## Outcomes\n");
    if summary.outcomes.count == 0 {
        output.push_str("- <none>\n");
    } else {
        output.push_str(&format!(
            "- Sessions: {} ({} won)\n",
            summary.outcomes.count, summary.outcomes.wins
        ));
        push_avg(&mut output, "Avg questions asked", summary.outcomes.avg_questions);
    }
    output
}

fn push_avg(output: &mut String, label: &str, value: Option<f64>) {
    if let Some(value) = value {
        output.push_str(&format!("- {label}: {value:.3}\n"));
    }
}

#[derive(Debug)]
pub struct TelemetryOutputs {
    pub summary: TelemetrySummary,
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}
