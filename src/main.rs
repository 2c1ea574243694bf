// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! authn-conform command-line entry point.
//!
//! ## CLI Subcommands
//!
//! - `authn-conform-cli catalog list [--json]` - Print the built-in catalogs
//! - `authn-conform-cli config show|defaults|validate` - Inspect configuration
//! - `authn-conform-cli version` - Print the version

use std::path::Path;
use std::process::ExitCode;

use authn_conform::cli::{catalog_cmd, config_cmd, has_flag, EXIT_CONFIG_ERROR};
use authn_conform::{config, telemetry};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    let (cfg, file_error) = config::load_checked();
    if let Err(e) = telemetry::init_logging(&cfg.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::from(EXIT_CONFIG_ERROR as u8);
    }
    if let Some(e) = &file_error {
        tracing::warn!(error = %e, "ignoring config file");
    }
    telemetry::describe_metrics();

    match command {
        "catalog" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("list");
            match subcommand {
                "list" => {
                    let code = catalog_cmd::run_list(has_flag(&args, "--json"));
                    ExitCode::from(code as u8)
                }
                _ => {
                    eprintln!("Unknown catalog subcommand: {}", subcommand);
                    print_command_help("catalog");
                    ExitCode::FAILURE
                }
            }
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    let code = config_cmd::run_show(has_flag(&args, "--json"));
                    ExitCode::from(code as u8)
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => {
                    let file = flag_value(&args, "--file").map(Path::new);
                    let code = config_cmd::run_validate(file);
                    ExitCode::from(code as u8)
                }
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    ExitCode::FAILURE
                }
            }
        }
        "help" | "--help" | "-h" => {
            if let Some(subcommand) = args.get(2) {
                print_command_help(subcommand);
            } else {
                print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("authn-conform {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

/// Value following `flag`, e.g. `--file path.toml`.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "authn-conform - request authentication conformance harness v{}

USAGE:
    authn-conform-cli [COMMAND] [OPTIONS]

COMMANDS:
    catalog      Inspect the built-in fixture catalogs (list)
    config       Inspect configuration (show, defaults, validate)
    version      Show version information
    help         Show this help message

OPTIONS:
    -h, --help     Show help for command
    -V, --version  Show version information

EXAMPLES:
    authn-conform-cli catalog list
    authn-conform-cli catalog list --json
    authn-conform-cli config show
    authn-conform-cli config validate --file harness.toml

ENVIRONMENT:
    AUTHN_CONFORM_RETRY_DELAY_MS  Delay between probe attempts (default: 250)
    AUTHN_CONFORM_DEADLINE_SECS   Per-case convergence deadline (default: 30)
    AUTHN_CONFORM_ROOT_NAMESPACE  Mesh root namespace (default: istio-system)
    AUTHN_CONFORM_LOG_LEVEL       Log filter (default: info)
    AUTHN_CONFORM_LOG_FORMAT      json or pretty (default: json)
    AUTHN_CONFORM_CONFIG          Optional TOML config file

EXIT CODES:
    0  Success
    1  Failure
    2  Configuration error
",
        version
    );
}

/// Print detailed help for a specific command.
fn print_command_help(command: &str) {
    match command {
        "catalog" => {
            eprintln!(
                "authn-conform catalog - Inspect the built-in fixture catalogs

USAGE:
    authn-conform-cli catalog list [--json]

DESCRIPTION:
    Lists every case of every built-in catalog with its probe kind, target,
    path and expected status. Identities and tokens are placeholders; real
    runs receive them from the provisioner.

EXAMPLES:
    authn-conform-cli catalog list
    authn-conform-cli catalog list --json
"
            );
        }
        "config" => {
            eprintln!(
                "authn-conform config - Inspect configuration

USAGE:
    authn-conform-cli config show [--json]
    authn-conform-cli config defaults
    authn-conform-cli config validate [--file PATH]

DESCRIPTION:
    show      Print effective values after file and environment overrides
    defaults  Print built-in defaults
    validate  Check for misconfigurations; with --file, the file must parse

EXIT CODES:
    0  Valid
    1  Warnings found
    2  Config file unreadable or malformed
"
            );
        }
        "version" => {
            eprintln!(
                "authn-conform version - Show version information

USAGE:
    authn-conform-cli version
"
            );
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
        }
    }
}
