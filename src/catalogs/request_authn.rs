// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Request authentication catalog.
//!
//! `c` authenticates without authorizing, `b` also requires a request
//! principal, `d` has no policy, and `e` forwards the original token.
//! Authenticated requests reach the workload with `Authorization` stripped
//! (except on `e`) and the token payload echoed in `X-Test-Payload`.

use crate::fixture::{
    bearer, payload_segment, Catalog, CatalogBuilder, ExpectedOutcome, Fixture, FixtureError,
    TokenSet, AUTHORIZATION,
};
use crate::policy::PolicyDocument;
use crate::probe::ProbeSelector;
use crate::provision::Workloads;
use crate::runner::Scenario;

pub const CATALOG_NAME: &str = "req-authn";
pub const WORKLOADS: &[&str] = &["a", "b", "c", "d", "e"];

/// Header the policy uses to echo the verified token payload.
pub const PAYLOAD_HEADER: &str = "X-Test-Payload";

pub fn request_authentication(w: &Workloads, tokens: &TokenSet) -> Result<Catalog, FixtureError> {
    let a = w.get("a")?;
    let b = w.get("b")?;
    let c = w.get("c")?;
    let d = w.get("d")?;
    let e = w.get("e")?;
    let payload1 =
        payload_segment(&tokens.issuer1).ok_or(FixtureError::MalformedToken("issuer1"))?;
    let payload2 =
        payload_segment(&tokens.issuer2).ok_or(FixtureError::MalformedToken("issuer2"))?;

    CatalogBuilder::new(CATALOG_NAME)
        .case(
            Fixture::mesh("valid-token-noauthz", a, c).with_bearer(&tokens.issuer1),
            ExpectedOutcome::ok()
                .without_header(AUTHORIZATION)
                .with_header(PAYLOAD_HEADER, payload1),
        )
        .case(
            Fixture::mesh("valid-token-2-noauthz", a, c).with_bearer(&tokens.issuer2),
            ExpectedOutcome::ok()
                .without_header(AUTHORIZATION)
                .with_header(PAYLOAD_HEADER, payload2),
        )
        .case(
            Fixture::mesh("expired-token-noauthz", a, c).with_bearer(&tokens.expired),
            ExpectedOutcome::unauthorized(),
        )
        .case(
            Fixture::mesh("no-token-noauthz", a, c),
            ExpectedOutcome::ok(),
        )
        .case(
            Fixture::mesh("valid-token", a, b).with_bearer(&tokens.issuer1),
            ExpectedOutcome::ok().without_header(AUTHORIZATION),
        )
        .case(
            Fixture::mesh("expired-token", a, b).with_bearer(&tokens.expired),
            ExpectedOutcome::unauthorized(),
        )
        .case(Fixture::mesh("no-token", a, b), ExpectedOutcome::forbidden())
        .case(Fixture::mesh("no-authn-authz", a, d), ExpectedOutcome::ok())
        .case(
            Fixture::mesh("valid-token-forward", a, e).with_bearer(&tokens.issuer1),
            ExpectedOutcome::ok()
                .with_header(AUTHORIZATION, bearer(&tokens.issuer1))
                .with_header(PAYLOAD_HEADER, payload1),
        )
        .build()
}

pub fn request_authentication_scenario(
    namespace: &str,
    policies: Vec<PolicyDocument>,
    tokens: TokenSet,
) -> Scenario {
    Scenario::new(CATALOG_NAME, namespace)
        .bind_tenant(policies)
        .with_workloads(WORKLOADS)
        .phase(ProbeSelector::Mesh, move |w| request_authentication(w, &tokens))
}
