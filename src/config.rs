// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Harness configuration from environment variables and an optional TOML
//! file.
//!
//! Values come from `AUTHN_CONFORM_*` environment variables, layered over an
//! optional TOML file, layered over defaults. Invalid values fall back to
//! the next layer without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `AUTHN_CONFORM_RETRY_DELAY_MS` | 250 | Pause between probe attempts (ms) |
//! | `AUTHN_CONFORM_DEADLINE_SECS` | 30 | Per-case convergence deadline (secs) |
//! | `AUTHN_CONFORM_ROOT_NAMESPACE` | istio-system | Namespace of the root scope |
//! | `AUTHN_CONFORM_LOG_LEVEL` | info | Log filter directive |
//! | `AUTHN_CONFORM_LOG_FORMAT` | json | `json` or `pretty` |
//! | `AUTHN_CONFORM_LOG_FILE` | (stderr) | Write logs to this file instead |
//! | `AUTHN_CONFORM_CONFIG` | (unset) | Path to a TOML config file |
//!
//! # File format
//!
//! ```toml
//! [retry]
//! delay_ms = 250
//! deadline_secs = 30
//!
//! [scope]
//! root_namespace = "istio-system"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! file = "/var/log/authn-conform.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::convergence::RetryPolicy;
use crate::telemetry::{LogConfig, LogFormat};

pub const DEFAULT_RETRY_DELAY_MS: u64 = 250;
pub const DEFAULT_DEADLINE_SECS: u64 = 30;
pub const DEFAULT_ROOT_NAMESPACE: &str = "istio-system";

const MAX_DEADLINE_SECS: u64 = 3600;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of a TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub scope: ScopeSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    pub delay_ms: Option<u64>,
    pub deadline_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeSection {
    pub root_namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub format: Option<String>,
    pub file: Option<PathBuf>,
}

/// Effective configuration summary (serializable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    pub retry_delay_ms: u64,
    pub deadline_secs: u64,
    pub root_namespace: String,
    pub log_level: String,
    pub log_format: String,
    pub log_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

/// All harness configuration.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub retry_delay: Duration,
    pub deadline: Duration,
    pub root_namespace: String,
    pub logging: LogConfig,
    pub config_file: Option<PathBuf>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            root_namespace: DEFAULT_ROOT_NAMESPACE.to_string(),
            logging: LogConfig::default(),
            config_file: None,
        }
    }
}

impl EnvConfig {
    /// Retry policy for the convergence engine.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_delay, self.deadline)
    }

    /// Return a serializable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            retry_delay_ms: self.retry_delay.as_millis() as u64,
            deadline_secs: self.deadline.as_secs(),
            root_namespace: self.root_namespace.clone(),
            log_level: self.logging.level.clone(),
            log_format: self.logging.format.as_str().to_string(),
            log_file: self.logging.output_path.clone(),
            config_file: self.config_file.clone(),
        }
    }

    /// Overlay values from a parsed file.
    fn apply_file(&mut self, file: &FileConfig) {
        if let Some(ms) = file.retry.delay_ms {
            self.retry_delay = Duration::from_millis(clamp_delay(ms));
        }
        if let Some(secs) = file.retry.deadline_secs {
            self.deadline = Duration::from_secs(clamp_deadline(secs));
        }
        if let Some(ns) = non_empty(file.scope.root_namespace.as_deref()) {
            self.root_namespace = ns.to_string();
        }
        if let Some(level) = non_empty(file.logging.level.as_deref()) {
            self.logging.level = level.to_string();
        }
        if let Some(format) = file.logging.format.as_deref().and_then(|f| f.parse().ok()) {
            self.logging.format = format;
        }
        if let Some(path) = file.logging.file.as_ref().filter(|p| !p.as_os_str().is_empty()) {
            self.logging.output_path = Some(path.clone());
        }
    }

    /// Overlay values from `AUTHN_CONFORM_*` environment variables.
    fn apply_env(&mut self) {
        if let Some(ms) = parse_u64("AUTHN_CONFORM_RETRY_DELAY_MS") {
            self.retry_delay = Duration::from_millis(clamp_delay(ms));
        }
        if let Some(secs) = parse_u64("AUTHN_CONFORM_DEADLINE_SECS") {
            self.deadline = Duration::from_secs(clamp_deadline(secs));
        }
        if let Some(ns) = env_string("AUTHN_CONFORM_ROOT_NAMESPACE") {
            self.root_namespace = ns;
        }
        if let Some(level) = env_string("AUTHN_CONFORM_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) =
            env_string("AUTHN_CONFORM_LOG_FORMAT").and_then(|f| f.parse::<LogFormat>().ok())
        {
            self.logging.format = format;
        }
        if let Some(path) = env_string("AUTHN_CONFORM_LOG_FILE") {
            self.logging.output_path = Some(PathBuf::from(path));
        }
    }
}

fn clamp_delay(ms: u64) -> u64 {
    ms.max(1)
}

fn clamp_deadline(secs: u64) -> u64 {
    secs.clamp(1, MAX_DEADLINE_SECS)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a `u64` env var, returning `None` on missing or invalid.
fn parse_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.trim().parse::<u64>().ok()
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a TOML config file.
pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load configuration: defaults, then the file named by
/// `AUTHN_CONFORM_CONFIG` (if any), then environment overrides.
///
/// An unreadable or malformed file is skipped. Use [`load_checked`] when the
/// caller needs to know.
pub fn load() -> EnvConfig {
    let (cfg, file_error) = load_checked();
    if let Some(e) = file_error {
        tracing::warn!(error = %e, "ignoring config file");
    }
    cfg
}

/// Like [`load`], but also returns the error for a file named by
/// `AUTHN_CONFORM_CONFIG` that could not be read or parsed.
pub fn load_checked() -> (EnvConfig, Option<ConfigError>) {
    let mut cfg = EnvConfig::default();
    let mut file_error = None;
    if let Some(path) = env_string("AUTHN_CONFORM_CONFIG").map(PathBuf::from) {
        match load_file(&path) {
            Ok(file) => {
                cfg.apply_file(&file);
                cfg.config_file = Some(path);
            }
            Err(e) => file_error = Some(e),
        }
    }
    cfg.apply_env();
    (cfg, file_error)
}

/// Like [`load`], but with an explicit file whose errors are returned.
pub fn load_with_file(path: &Path) -> Result<EnvConfig, ConfigError> {
    let file = load_file(path)?;
    let mut cfg = EnvConfig::default();
    cfg.apply_file(&file);
    cfg.config_file = Some(path.to_path_buf());
    cfg.apply_env();
    Ok(cfg)
}

// Serialize env-mutating tests across modules.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
