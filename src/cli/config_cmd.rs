// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults, validate.

use std::path::Path;

use super::{EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_OK};
use crate::config::{self, EffectiveConfig, EnvConfig};

/// Print effective config as key-value pairs, or JSON with `json`.
pub fn run_show(json: bool) -> i32 {
    let cfg = config::load().effective_config();
    if json {
        match serde_json::to_string_pretty(&cfg) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize config: {}", e);
                return EXIT_FAILURE;
            }
        }
    } else {
        print_config(&cfg);
    }
    EXIT_OK
}

/// Print default config values (no env or file overrides).
pub fn run_defaults() {
    print_config(&EnvConfig::default().effective_config());
}

/// Validate configuration for obvious misconfigurations.
///
/// With `file`, that file must parse; otherwise the file named by
/// `AUTHN_CONFORM_CONFIG`, if set, must. Returns 0 if valid, 1 on warnings,
/// 2 if the file cannot be used.
pub fn run_validate(file: Option<&Path>) -> i32 {
    let cfg = match file {
        Some(path) => match config::load_with_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                return EXIT_CONFIG_ERROR;
            }
        },
        None => match config::load_checked() {
            (cfg, None) => cfg,
            (_, Some(e)) => {
                eprintln!("ERROR: {}", e);
                return EXIT_CONFIG_ERROR;
            }
        },
    };

    let warnings = validate(&cfg);
    for warning in &warnings {
        eprintln!("WARNING: {}", warning);
    }
    if warnings.is_empty() {
        println!("Configuration is valid.");
        EXIT_OK
    } else {
        EXIT_FAILURE
    }
}

/// Human-readable warnings for a loaded config.
pub fn validate(cfg: &EnvConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    if cfg.retry_delay >= cfg.deadline {
        warnings.push(format!(
            "AUTHN_CONFORM_RETRY_DELAY_MS ({}ms) is not below AUTHN_CONFORM_DEADLINE_SECS ({}s); \
             each case gets a single attempt",
            cfg.retry_delay.as_millis(),
            cfg.deadline.as_secs()
        ));
    }
    if let Err(e) = tracing_subscriber::EnvFilter::try_new(&cfg.logging.level) {
        warnings.push(format!(
            "AUTHN_CONFORM_LOG_LEVEL {:?} is not a valid filter: {}",
            cfg.logging.level, e
        ));
    }
    warnings
}

fn print_config(cfg: &EffectiveConfig) {
    println!("AUTHN_CONFORM_RETRY_DELAY_MS={}", cfg.retry_delay_ms);
    println!("AUTHN_CONFORM_DEADLINE_SECS={}", cfg.deadline_secs);
    println!("AUTHN_CONFORM_ROOT_NAMESPACE={}", cfg.root_namespace);
    println!("AUTHN_CONFORM_LOG_LEVEL={}", cfg.log_level);
    println!("AUTHN_CONFORM_LOG_FORMAT={}", cfg.log_format);
    if let Some(path) = &cfg.log_file {
        println!("AUTHN_CONFORM_LOG_FILE={}", path.display());
    }
    if let Some(path) = &cfg.config_file {
        println!("AUTHN_CONFORM_CONFIG={}", path.display());
    }
}
