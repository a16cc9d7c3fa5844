use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use spider_bench::config::{ResolvedOutputs, SpiderConfig};
use spider_bench::knowledge::load_knowledge;
use spider_bench::logging::init_logging;
use spider_bench::play::{play_tie_break, run_interactive};
use spider_bench::simulate::SimulationRunner;
use spider_bench::sink::{DirectorySink, submit_or_warn};
use spider_core::AppInfo;
use spider_core::game::SubmissionSink;

/// Twenty-questions deduction engine: play it, or benchmark it against oracles.
#[derive(Debug, Parser)]
#[command(name = "spider", author, version, about = "Spider of Lore deduction engine")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/spider.yaml", global = true)]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID", global = true)]
    run_id: Option<String>,

    /// Load the knowledge base from this JSON file instead of the embedded seed.
    #[arg(long, value_name = "FILE", global = true)]
    knowledge: Option<PathBuf>,

    /// Exit after validating the configuration and knowledge base.
    #[arg(long, global = true)]
    validate_only: bool,

    /// Do not write session submissions.
    #[arg(long, global = true)]
    no_submit: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play one game in the terminal.
    Play {
        /// Seed the tie-break jitter for a reproducible game (fresh each launch otherwise).
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,
    },
    /// Play many games against simulated players.
    Simulate {
        /// Override the number of sessions to simulate.
        #[arg(long, value_name = "COUNT")]
        sessions: Option<usize>,

        /// Override the RNG seed.
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = SpiderConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(path) = cli.knowledge {
        config.knowledge = Some(path);
    }

    if let Command::Simulate { sessions, seed } = &cli.command {
        if let Some(sessions) = sessions {
            config.simulation.sessions = *sessions;
        }
        if let Some(seed) = seed {
            config.simulation.seed = Some(*seed);
        }
    }

    config.engine = config.engine.clone().with_env_overrides();
    config.validate()?;

    let knowledge = load_knowledge(config.knowledge.as_deref())?;
    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();

    println!(
        "{} {} ({}): '{run_id}' with {} characters and {} questions",
        AppInfo::name(),
        AppInfo::version(),
        AppInfo::codename(),
        knowledge.characters.len(),
        knowledge.questions.len()
    );

    if cli.validate_only {
        println!("Validation-only mode: nothing was played.");
        return Ok(());
    }

    let mut logging_guard = init_logging(&config.logging, &outputs)?;
    let mut sink = DirectorySink::new(outputs.sessions_dir.clone());

    match cli.command {
        Command::Play { seed } => {
            let mut tie_break = play_tie_break(seed, config.engine.tie_break_noise);
            let stdin = io::stdin();
            let submission = run_interactive(
                &knowledge,
                config.engine.clone(),
                stdin.lock(),
                io::stdout(),
                &mut tie_break,
            )
            .context("playing interactive session")?;

            if !cli.no_submit
                && submit_or_warn(&mut sink, &submission)
                && let Some(path) = sink.written().last()
            {
                println!("Session saved to {}", path.display());
            }
        }
        Command::Simulate { .. } => {
            let sessions = config.simulation.sessions;
            let mut runner = SimulationRunner::new(config, outputs, knowledge)?
                .with_logging(logging_guard.take());
            let target = if cli.no_submit {
                None
            } else {
                Some(&mut sink as &mut dyn SubmissionSink)
            };
            let summary = runner.run(target)?;

            println!(
                "Simulation complete for '{run_id}': {} sessions, {} wins → {} rows at {}",
                sessions,
                summary.wins,
                summary.rows_written,
                summary.jsonl_path.display()
            );
            println!("Summary table: {}", summary.summary_path.display());
            if summary.submissions_written > 0 {
                println!(
                    "Submissions: {} files in {}",
                    summary.submissions_written,
                    sink.dir().display()
                );
            }
            if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
                println!("Telemetry log: {}", telemetry_path.display());
            }
            if let Some(outputs) = summary.telemetry_outputs.as_ref() {
                println!("Telemetry summary (JSON): {}", outputs.json_path.display());
                println!(
                    "Telemetry summary (Markdown): {}",
                    outputs.markdown_path.display()
                );
                if let Some(probability) = outputs.summary.guesses.avg_probability {
                    println!(
                        "  Guesses: {} events, avg probability {:.3}",
                        outputs.summary.guesses.count, probability
                    );
                }
            }
        }
    }

    Ok(())
}
