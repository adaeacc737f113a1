//! Configuration management for the Zero screening tools.
//!
//! All tools share a configuration file at `~/.codecoder/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Command-line flags (applied by the binaries)
//! 2. Environment variables (ZERO_* prefix)
//! 3. Explicit config file values
//! 4. Default values
//!
//! # Environment Variable Mapping
//!
//! - `ZERO_LOG_LEVEL` → observability.log_level
//! - `ZERO_LOG_FORMAT` → observability.log_format
//! - `ZERO_SCREENER_SNAPSHOT` → screener.snapshot_path

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result, ResultExt};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".codecoder"),
        |dirs| dirs.home_dir().join(".codecoder"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Expand `~` and `$VAR` references in a configured path.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration shared by the screening tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Batch screener configuration
    #[serde(default)]
    pub screener: ScreenerConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    Error::NotFound(format!("config file {}", path.display()))
                }
                _ => Error::Io(e),
            })
            .context(format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(e.to_string()))
            .context(format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides applied.
    ///
    /// An explicit path must exist; the default path falls back to defaults.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("ZERO_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("ZERO_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Some(snapshot) = lookup("ZERO_SCREENER_SNAPSHOT") {
            self.screener.snapshot_path = Some(snapshot);
        }
    }
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets forced down to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Screener Configuration
// ============================================================================

/// Configuration for the batch screener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Pre-scored universe snapshot consumed by the snapshot screener.
    /// Defaults to `~/.codecoder/screener/universe.json`.
    #[serde(default)]
    pub snapshot_path: Option<String>,

    /// Exclude ST (Special Treatment) stocks
    #[serde(default = "default_true")]
    pub exclude_st: bool,

    /// Directories added to the export allow-list, on top of the working,
    /// home and temp directories.
    #[serde(default)]
    pub extra_output_dirs: Vec<String>,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            exclude_st: true,
            extra_output_dirs: Vec::new(),
        }
    }
}

impl ScreenerConfig {
    /// Resolved snapshot path with `~` expanded.
    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_path
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(|| config_dir().join("screener").join("universe.json"))
    }

    /// Resolved extra output directories.
    pub fn extra_output_dirs(&self) -> Vec<PathBuf> {
        self.extra_output_dirs
            .iter()
            .map(|d| expand_path(d))
            .collect()
    }
}

fn default_true() -> bool {
    true
}
