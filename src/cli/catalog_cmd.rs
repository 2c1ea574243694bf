// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! `catalog list`: print the built-in catalogs.
//!
//! Catalogs are built over placeholder identities and tokens, so the output
//! shows shape (names, targets, paths, expected status) rather than real
//! credentials.

use super::{EXIT_FAILURE, EXIT_OK};
use crate::catalogs;
use crate::fixture::{Catalog, FixtureError, TokenSet};
use crate::provision::Workloads;

const PLACEHOLDER_NAMESPACE: &str = "tenant";

fn placeholder_tokens() -> TokenSet {
    TokenSet {
        issuer1: "header.issuer1-payload.signature".to_string(),
        issuer2: "header.issuer2-payload.signature".to_string(),
        expired: "header.expired-payload.signature".to_string(),
        invalid: "header.invalid-payload.signature".to_string(),
    }
}

/// Built-in catalogs over placeholder workloads and tokens.
pub fn placeholder_catalogs() -> Result<Vec<Catalog>, FixtureError> {
    let workloads = Workloads::placeholder(catalogs::jwt::WORKLOADS, PLACEHOLDER_NAMESPACE);
    catalogs::builtin(&workloads, &placeholder_tokens())
}

pub fn run_list(json: bool) -> i32 {
    let catalogs = match placeholder_catalogs() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to build catalogs: {}", e);
            return EXIT_FAILURE;
        }
    };

    if json {
        return match serde_json::to_string_pretty(&catalogs) {
            Ok(text) => {
                println!("{}", text);
                EXIT_OK
            }
            Err(e) => {
                eprintln!("Failed to serialize catalogs: {}", e);
                EXIT_FAILURE
            }
        };
    }

    for catalog in &catalogs {
        print!("{}", render(catalog));
    }
    EXIT_OK
}

/// Plain-text table for one catalog.
pub fn render(catalog: &Catalog) -> String {
    let mut out = format!("{} ({} cases)\n", catalog.name(), catalog.len());
    for case in catalog.all_cases() {
        out.push_str(&format!(
            "  {:<55} {:<5} {:<34} {:<24} {}\n",
            case.fixture.name(),
            case.fixture.route().selector().as_str(),
            case.fixture.route().target_label(),
            case.fixture.path(),
            case.expected.status_code()
        ));
    }
    out
}
