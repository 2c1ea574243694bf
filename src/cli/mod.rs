// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommands that need no mesh: inspecting configuration and the
//! built-in catalogs.
//!
//! ## Usage
//!
//! ```bash
//! authn-conform-cli catalog list         # Cases of every built-in catalog
//! authn-conform-cli catalog list --json  # Same, as JSON
//! authn-conform-cli config show          # Effective configuration
//! authn-conform-cli config validate      # Exit 1 on suspicious settings
//! ```

pub mod catalog_cmd;
pub mod config_cmd;

/// Exit code for success.
pub const EXIT_OK: i32 = 0;
/// Exit code for a failed command or validation warning.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for unusable configuration.
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// True if `flag` appears anywhere in `args`.
pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
