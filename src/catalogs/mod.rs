// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Built-in catalogs for JWT request authentication policy.
//!
//! Catalogs are pure data over externally provisioned identities and
//! externally minted tokens. Each module also offers a [`Scenario`]
//! constructor that takes the rendered policy documents.
//!
//! [`Scenario`]: crate::runner::Scenario

pub mod ingress;
pub mod jwt;
pub mod request_authn;

use crate::fixture::{Catalog, FixtureError, TokenSet};
use crate::provision::Workloads;

pub use ingress::{ingress_edge, ingress_in_mesh, ingress_scenario};
pub use jwt::{authn_jwt, authn_jwt_scenario};
pub use request_authn::{request_authentication, request_authentication_scenario};

/// Every built-in catalog, built over `workloads`.
pub fn builtin(workloads: &Workloads, tokens: &TokenSet) -> Result<Vec<Catalog>, FixtureError> {
    Ok(vec![
        authn_jwt(workloads, tokens)?,
        request_authentication(workloads, tokens)?,
        ingress_in_mesh(workloads, tokens)?,
        ingress_edge(tokens)?,
    ])
}
