// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! JWT authentication policy catalog.
//!
//! Workload `a` calls:
//! - `b`: one issuer, token required everywhere
//! - `c`: token required except on excluded paths
//! - `d`: token required only on included paths
//! - `e`: two issuers, each restricted to its own paths

use crate::fixture::{Catalog, CatalogBuilder, ExpectedOutcome, Fixture, FixtureError, TokenSet};
use crate::policy::PolicyDocument;
use crate::probe::ProbeSelector;
use crate::provision::Workloads;
use crate::runner::Scenario;

pub const CATALOG_NAME: &str = "authn-jwt";
pub const WORKLOADS: &[&str] = &["a", "b", "c", "d", "e"];

pub fn authn_jwt(w: &Workloads, tokens: &TokenSet) -> Result<Catalog, FixtureError> {
    let a = w.get("a")?;
    let b = w.get("b")?;
    let c = w.get("c")?;
    let d = w.get("d")?;
    let e = w.get("e")?;

    CatalogBuilder::new(CATALOG_NAME)
        .case(
            Fixture::mesh("jwt-simple-valid-token", a, b).with_bearer(&tokens.issuer1),
            ExpectedOutcome::ok(),
        )
        .case(
            Fixture::mesh("jwt-simple-expired-token", a, b).with_bearer(&tokens.expired),
            ExpectedOutcome::unauthorized(),
        )
        .case(
            Fixture::mesh("jwt-simple-no-token", a, b),
            ExpectedOutcome::unauthorized(),
        )
        .case(
            Fixture::mesh("jwt-excluded-paths-no-token[/health_check]", a, c)
                .with_path("/health_check"),
            ExpectedOutcome::ok(),
        )
        .case(
            Fixture::mesh("jwt-excluded-paths-no-token[/guest-us]", a, c).with_path("/guest-us"),
            ExpectedOutcome::ok(),
        )
        .case(
            Fixture::mesh("jwt-excluded-paths-no-token[/index.html]", a, c)
                .with_path("/index.html"),
            ExpectedOutcome::unauthorized(),
        )
        .case(
            Fixture::mesh("jwt-excluded-paths-valid-token", a, c)
                .with_path("/index.html")
                .with_bearer(&tokens.issuer1),
            ExpectedOutcome::ok(),
        )
        .case(
            Fixture::mesh("jwt-included-paths-no-token[/index.html]", a, d)
                .with_path("/index.html"),
            ExpectedOutcome::ok(),
        )
        .case(
            Fixture::mesh("jwt-included-paths-no-token[/something-confidential]", a, d)
                .with_path("/something-confidential"),
            ExpectedOutcome::unauthorized(),
        )
        .case(
            Fixture::mesh("jwt-included-paths-valid-token", a, d)
                .with_path("/something-confidential")
                .with_bearer(&tokens.issuer1),
            ExpectedOutcome::ok(),
        )
        .case(
            Fixture::mesh("jwt-two-issuers-no-token", a, e),
            ExpectedOutcome::unauthorized(),
        )
        .case(
            Fixture::mesh("jwt-two-issuers-token2", a, e).with_bearer(&tokens.issuer2),
            ExpectedOutcome::ok(),
        )
        .case(
            Fixture::mesh("jwt-two-issuers-token1", a, e).with_bearer(&tokens.issuer1),
            ExpectedOutcome::unauthorized(),
        )
        .case(
            Fixture::mesh("jwt-two-issuers-invalid-token", a, e)
                .with_path("/testing-istio-jwt")
                .with_bearer(&tokens.invalid),
            ExpectedOutcome::unauthorized(),
        )
        .case(
            Fixture::mesh("jwt-two-issuers-token1[/testing-istio-jwt]", a, e)
                .with_path("/testing-istio-jwt")
                .with_bearer(&tokens.issuer1),
            ExpectedOutcome::ok(),
        )
        .case(
            Fixture::mesh("jwt-two-issuers-token2[/testing-istio-jwt]", a, e)
                .with_path("/testing-istio-jwt")
                .with_bearer(&tokens.issuer2),
            ExpectedOutcome::unauthorized(),
        )
        .case(
            Fixture::mesh("jwt-wrong-issuers", a, e)
                .with_path("/wrong_issuer")
                .with_bearer(&tokens.issuer1),
            ExpectedOutcome::unauthorized(),
        )
        .build()
}

/// Scenario binding rendered JWT policies to `namespace` and running the
/// catalog over mesh-internal calls.
pub fn authn_jwt_scenario(
    namespace: &str,
    policies: Vec<PolicyDocument>,
    tokens: TokenSet,
) -> Scenario {
    Scenario::new(CATALOG_NAME, namespace)
        .bind_tenant(policies)
        .with_workloads(WORKLOADS)
        .phase(ProbeSelector::Mesh, move |w| authn_jwt(w, &tokens))
}
