// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Scenario replay commands
//!
//! Commands: run

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::info;

use tessera_core::KernelConfigManifest;
use tessera_sim::{
    HarnessFactory, HarnessOptions, LogCapture, LogVerifier, RunSummary, Scenario, ScenarioRunner, VerifyOutcome,
};

#[derive(Subcommand)]
pub enum ScenarioCommand {
    /// Replay a scenario file against the kitchen world
    Run {
        /// Scenario file (.yaml, .yml or .json)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Golden log to verify against (created on first run)
        #[arg(long, value_name = "PATH")]
        golden: Option<PathBuf>,

        /// Let StartCooking schedule item completion on the virtual clock
        #[arg(long)]
        scheduled_completion: bool,

        /// Print the captured log lines after the run
        #[arg(long)]
        print_log: bool,
    },
}

pub async fn handle_command(command: ScenarioCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ScenarioCommand::Run {
            file,
            golden,
            scheduled_completion,
            print_log,
        } => run(config_override, file, golden, scheduled_completion, print_log).await,
    }
}

/// Outcome of one replay, before anything is printed.
struct Replay {
    scenario: String,
    summary: RunSummary,
    events: usize,
    lines: Vec<String>,
    golden: Option<VerifyOutcome>,
}

async fn replay(
    config: &KernelConfigManifest,
    file: &Path,
    golden: Option<&Path>,
    scheduled_completion: bool,
) -> Result<Replay> {
    let scenario = Scenario::from_file(file).context("Failed to load scenario")?;

    let options = HarnessOptions::from_config(config)
        .with_seed(scenario.seed)
        .with_scheduled_completion(scheduled_completion);
    let world = HarnessFactory::kitchen(&options);
    let mut observer = world.event_bus().observe();

    info!(scenario = %scenario.name, file = %file.display(), "Replaying scenario");

    let capture = LogCapture::new();
    let summary = capture
        .capture(LevelFilter::INFO, ScenarioRunner::new(&world).play(&scenario))
        .await
        .with_context(|| format!("Scenario '{}' failed", scenario.name))?;
    let lines = capture.lines();

    let golden = golden
        .map(|path| LogVerifier::verify(&lines, path))
        .transpose()
        .context("Golden log verification failed")?;

    Ok(Replay {
        scenario: scenario.name,
        summary,
        events: observer.drain().len(),
        lines,
        golden,
    })
}

async fn run(
    config_override: Option<PathBuf>,
    file: PathBuf,
    golden: Option<PathBuf>,
    scheduled_completion: bool,
    print_log: bool,
) -> Result<()> {
    let config = KernelConfigManifest::load_or_default(config_override).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let replay = replay(&config, &file, golden.as_deref(), scheduled_completion).await?;

    if print_log {
        for line in &replay.lines {
            println!("{}", line.dimmed());
        }
        println!();
    }

    println!("{}", format!("✓ Scenario passed: {}", replay.scenario).green());
    println!("  Steps: {}", replay.summary.steps);
    println!(
        "  Acts: {} ({} rejected)",
        replay.summary.acts, replay.summary.rejected
    );
    println!("  Assertions: {}", replay.summary.assertions);
    println!("  Scheduled tasks run: {}", replay.summary.tasks_run);
    println!("  Virtual time elapsed: {} ms", replay.summary.elapsed_ms);
    println!("  Events published: {}", replay.events);
    println!("  Log lines: {}", replay.lines.len());

    match replay.golden {
        Some(VerifyOutcome::Bootstrapped { path, lines }) => println!(
            "{}",
            format!("! Golden log created: {} ({} lines)", path.display(), lines).yellow()
        ),
        Some(VerifyOutcome::Matched { lines }) => {
            println!("{}", format!("✓ Golden log matched ({} lines)", lines).green())
        }
        None => {}
    }

    Ok(())
}
