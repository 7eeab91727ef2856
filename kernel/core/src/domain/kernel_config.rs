// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

// Kernel Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) selecting:
// - the time source (wall clock or virtual clock with a start instant)
// - the id strategy (random UUIDs or per-prefix sequences)
// - the passive observer buffer of the event bus
// - logging level and output format

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "tessera/v1";
pub const KIND: &str = "KernelConfig";
pub const CONFIG_PATH_ENV: &str = "TESSERA_CONFIG_PATH";

/// Top-level kernel configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfigManifest {
    /// API version (must be "tessera/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "KernelConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: KernelConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Content under `spec:`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KernelConfigSpec {
    #[serde(default)]
    pub clock: ClockConfig,

    #[serde(default)]
    pub ids: IdConfig,

    #[serde(default)]
    pub event_bus: EventBusConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    #[default]
    System,
    Virtual,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default)]
    pub mode: ClockMode,

    /// Initial virtual time in epoch milliseconds. Ignored for `system`.
    #[serde(default)]
    pub start_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    #[default]
    Uuid,
    Sequential,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdConfig {
    #[serde(default)]
    pub strategy: IdStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBusConfig {
    /// Buffered events per passive observer before the oldest are dropped
    #[serde(default = "default_observer_capacity")]
    pub observer_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_observer_capacity() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            observer_capacity: default_observer_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for KernelConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "tessera".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: KernelConfigSpec::default(),
        }
    }
}

impl KernelConfigManifest {
    /// Deterministic profile used by simulations: virtual time and sequential ids.
    pub fn simulation(start_ms: i64) -> Self {
        let mut manifest = Self::default();
        manifest.metadata.name = "simulation".to_string();
        manifest.spec.clock = ClockConfig {
            mode: ClockMode::Virtual,
            start_ms,
        };
        manifest.spec.ids.strategy = IdStrategy::Sequential;
        manifest
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load configuration, in order of precedence:
    /// 1. explicit path (fail if missing/invalid)
    /// 2. `TESSERA_CONFIG_PATH`
    /// 3. built-in defaults
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                tracing::info!("Loading configuration from {}: {:?}", CONFIG_PATH_ENV, path);
                let mut config = Self::from_yaml_file(&path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
            tracing::warn!("{} points to a missing file: {:?}", CONFIG_PATH_ENV, path);
        }

        tracing::debug!("No configuration file found. Using defaults.");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// `TESSERA_LOG_FORMAT` overrides the configured log format.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TESSERA_LOG_FORMAT") {
            match val.to_lowercase().as_str() {
                "json" => self.spec.logging.format = LogFormat::Json,
                "compact" => self.spec.logging.format = LogFormat::Compact,
                _ => tracing::warn!(
                    "Invalid value for TESSERA_LOG_FORMAT: '{}'. Expected json/compact. Ignoring.",
                    val
                ),
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.event_bus.observer_capacity == 0 {
            anyhow::bail!("spec.event_bus.observer_capacity must be greater than zero");
        }

        if self.spec.clock.mode == ClockMode::Virtual && self.spec.clock.start_ms < 0 {
            anyhow::bail!("spec.clock.start_ms cannot be negative");
        }

        Ok(())
    }
}
