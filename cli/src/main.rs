// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

//! # Tessera CLI
//!
//! The `tessera` binary replays simulation scenarios against the kernel and
//! inspects kernel configuration manifests.
//!
//! ## Commands
//!
//! - `tessera scenario run <FILE> [--golden PATH]` - Replay a scenario, verify its golden log
//! - `tessera config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tessera_core::domain::kernel_config::{LogFormat, LoggingConfig};
use tessera_core::KernelConfigManifest;

mod commands;

use commands::{ConfigCommand, ScenarioCommand};

/// Tessera - deterministic capability kernel tooling
#[derive(Parser)]
#[command(name = "tessera")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides TESSERA_CONFIG_PATH)
    #[arg(
        short,
        long,
        global = true,
        env = "TESSERA_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level.
    #[arg(long, global = true, env = "TESSERA_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay simulation scenarios
    #[command(name = "scenario")]
    Scenario {
        #[command(subcommand)]
        command: ScenarioCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // An unreadable config is reported by the command itself
    let logging = KernelConfigManifest::load_or_default(cli.config.clone())
        .map(|config| config.spec.logging)
        .unwrap_or_default();
    init_logging(cli.log_level.as_deref(), &logging)?;

    match cli.command {
        Some(Commands::Scenario { command }) => {
            commands::scenario::handle_command(command, cli.config).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level_override: Option<&str>, logging: &LoggingConfig) -> Result<()> {
    let level = level_override.unwrap_or(&logging.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    match logging.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .flatten_event(true)
            .init(),
    }

    Ok(())
}
