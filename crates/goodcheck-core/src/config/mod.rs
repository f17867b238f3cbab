//! Configuration management for GoodCheck
//!
//! Provides a strongly-typed configuration system with TOML support.
//! Every table falls back to defaults, so an empty file is a valid config.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Highest number of passes per strategy
pub const MAX_PASSES: u8 = 9;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Probe tool settings
    pub probe: ProbeConfig,

    /// Evaluation loop settings
    pub evaluation: EvaluationConfig,

    /// Connectivity check run before evaluation
    pub preflight: PreflightConfig,

    /// Placeholder overrides for strategy files
    pub placeholders: PlaceholderConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ConfigNotFound {
                path: path.display().to_string(),
            },
            _ => Error::Io(e),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(Error::from)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.probe.timeout_secs == 0 {
            return Err(Error::config_value("probe.timeout_secs", "Must be at least 1"));
        }

        if self.probe.max_workers == 0 {
            return Err(Error::config_value("probe.max_workers", "Must be at least 1"));
        }

        if self.probe.executable.trim().is_empty() {
            return Err(Error::config_value("probe.executable", "Must not be empty"));
        }

        if !(1..=MAX_PASSES).contains(&self.evaluation.passes) {
            return Err(Error::config_value(
                "evaluation.passes",
                format!("Must be between 1 and {MAX_PASSES}"),
            ));
        }

        if self.preflight.enabled {
            if self.preflight.timeout_secs == 0 {
                return Err(Error::config_value("preflight.timeout_secs", "Must be at least 1"));
            }
            if self.preflight.url.trim().is_empty() {
                return Err(Error::config_value("preflight.url", "Must not be empty"));
            }
        }

        Ok(())
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Probe tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Probe executable (curl)
    pub executable: String,
    /// Per-probe timeout, used for both `--max-time` and `--connect-timeout`
    pub timeout_secs: u64,
    /// Maximum number of probes running at once
    pub max_workers: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            executable: "curl".to_string(),
            timeout_secs: 5,
            max_workers: 8,
        }
    }
}

/// Evaluation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Passes per strategy (1-9)
    pub passes: u8,
    /// Delay between shaper start and the first probe
    pub settle_delay_ms: u64,
    /// Grace period before a stopping shaper is force-killed
    pub stop_grace_ms: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            passes: 1,
            settle_delay_ms: 1000,
            stop_grace_ms: 3000,
        }
    }
}

/// Network pre-flight check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightConfig {
    /// Run the check before evaluating
    pub enabled: bool,
    /// URL fetched by the check
    pub url: String,
    /// Timeout for the check
    pub timeout_secs: u64,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "https://ya.ru".to_string(),
            timeout_secs: 2,
        }
    }
}

/// Placeholder overrides; empty values keep the built-in or environment value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    /// Override for `FAKESNI`
    pub fake_sni: String,
    /// Override for `FAKEHEX`
    pub fake_hex: String,
    /// Override for `FAKEHEXBYTES`
    pub fake_hex_bytes: String,
    /// Override for `%LISTDIR%`
    pub list_dir: String,
    /// Override for `%BIN%`
    pub bin_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log file path (None = stdout only)
    pub file: Option<String>,
    /// Enable JSON format logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json_format: false,
        }
    }
}
