// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use tessera_core::domain::kernel_config::CONFIG_PATH_ENV;
use tessera_core::KernelConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Print the full manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: --config, then TESSERA_CONFIG_PATH)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a simulation profile manifest
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./tessera-config.yaml")]
        output: PathBuf,

        /// Initial virtual time in epoch milliseconds
        #[arg(long, default_value_t = 0)]
        start_ms: i64,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { yaml } => show(config_override, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, start_ms } => generate(output, start_ms).await,
    }
}

async fn show(config_override: Option<PathBuf>, as_yaml: bool) -> Result<()> {
    let source = match &config_override {
        Some(path) => path.display().to_string(),
        None => std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "(built-in defaults)".to_string()),
    };
    let config = KernelConfigManifest::load_or_default(config_override).context("Failed to load configuration")?;

    if as_yaml {
        print!("{}", serde_yaml::to_string(&config).context("Failed to render configuration")?);
        return Ok(());
    }

    println!("{}", "Current configuration:".bold());
    println!("  Source: {}", source.dimmed());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Clock:".bold());
    println!("  Mode: {:?}", config.spec.clock.mode);
    println!("  Start: {} ms", config.spec.clock.start_ms);
    println!();

    println!("{}", "Ids:".bold());
    println!("  Strategy: {:?}", config.spec.ids.strategy);
    println!();

    println!("{}", "Event bus:".bold());
    println!("  Observer capacity: {}", config.spec.event_bus.observer_capacity);
    println!();

    println!("{}", "Logging:".bold());
    println!("  Level: {}", config.spec.logging.level);
    println!("  Format: {:?}", config.spec.logging.format);

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = KernelConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, start_ms: i64) -> Result<()> {
    KernelConfigManifest::simulation(start_ms)
        .to_yaml_file(&output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::domain::kernel_config::{ClockMode, IdStrategy};

    #[tokio::test]
    async fn test_generated_profile_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tessera-config.yaml");

        generate(path.clone(), 1_000).await.unwrap();
        validate(Some(path.clone())).await.unwrap();

        let loaded = KernelConfigManifest::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.spec.clock.mode, ClockMode::Virtual);
        assert_eq!(loaded.spec.clock.start_ms, 1_000);
        assert_eq!(loaded.spec.ids.strategy, IdStrategy::Sequential);
    }

    #[tokio::test]
    async fn test_validate_rejects_wrong_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "apiVersion: tessera/v1\nkind: NodeConfig\nmetadata:\n  name: x\n").unwrap();

        let err = validate(Some(path)).await.unwrap_err();
        assert_eq!(err.to_string(), "Configuration validation failed");
    }

    #[tokio::test]
    async fn test_validate_reports_missing_file() {
        let err = validate(Some(PathBuf::from("/nonexistent/tessera.yaml")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to load configuration");
    }
}
