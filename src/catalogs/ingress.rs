// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Global request authentication enforced at the ingress gateway.
//!
//! The policy lives in the root namespace, so it also reaches in-mesh
//! traffic: a bad token is rejected there too, while a missing token is
//! let through. At the edge, authorization rules keyed on virtual host
//! decide which principals get in.

use crate::fixture::{
    Catalog, CatalogBuilder, ExpectedOutcome, Fixture, FixtureError, TokenSet,
};
use crate::policy::{PolicyDocument, Scope};
use crate::probe::ProbeSelector;
use crate::provision::Workloads;
use crate::runner::Scenario;

pub const MESH_CATALOG_NAME: &str = "req-authn-ingress-mesh";
pub const EDGE_CATALOG_NAME: &str = "req-authn-ingress-edge";
pub const WORKLOADS: &[&str] = &["a", "b"];

pub const EXAMPLE_HOST: &str = "example.com";
pub const ANY_PRINCIPAL_HOST: &str = "any-request-principlal-ok.com";
pub const OTHER_HOST: &str = "other-host.com";

pub fn ingress_in_mesh(w: &Workloads, tokens: &TokenSet) -> Result<Catalog, FixtureError> {
    let a = w.get("a")?;
    let b = w.get("b")?;

    CatalogBuilder::new(MESH_CATALOG_NAME)
        .case(
            Fixture::mesh("in-mesh-with-expired-token", a, b).with_bearer(&tokens.expired),
            ExpectedOutcome::unauthorized(),
        )
        .case(
            Fixture::mesh("in-mesh-without-token", a, b),
            ExpectedOutcome::ok(),
        )
        .build()
}

pub fn ingress_edge(tokens: &TokenSet) -> Result<Catalog, FixtureError> {
    CatalogBuilder::new(EDGE_CATALOG_NAME)
        .case(
            Fixture::edge("deny without token", EXAMPLE_HOST),
            ExpectedOutcome::forbidden(),
        )
        .case(
            Fixture::edge("allow with sub-1 token", EXAMPLE_HOST).with_bearer(&tokens.issuer1),
            ExpectedOutcome::ok(),
        )
        .case(
            Fixture::edge("deny with sub-2 token", EXAMPLE_HOST).with_bearer(&tokens.issuer2),
            ExpectedOutcome::forbidden(),
        )
        .case(
            Fixture::edge("deny with expired token", EXAMPLE_HOST).with_bearer(&tokens.expired),
            ExpectedOutcome::unauthorized(),
        )
        .case(
            Fixture::edge("allow with sub-1 token on any.com", ANY_PRINCIPAL_HOST)
                .with_bearer(&tokens.issuer1),
            ExpectedOutcome::ok(),
        )
        .case(
            Fixture::edge("allow with sub-2 token on any.com", ANY_PRINCIPAL_HOST)
                .with_bearer(&tokens.issuer2),
            ExpectedOutcome::ok(),
        )
        .case(
            Fixture::edge("deny without token on any.com", ANY_PRINCIPAL_HOST),
            ExpectedOutcome::forbidden(),
        )
        .case(
            Fixture::edge("deny with token on other host", OTHER_HOST)
                .with_bearer(&tokens.issuer1),
            ExpectedOutcome::forbidden(),
        )
        .case(
            Fixture::edge("allow healthz", EXAMPLE_HOST).with_path("/healthz"),
            ExpectedOutcome::ok(),
        )
        .build()
}

/// Scenario binding the global policy to the root namespace and the
/// gateway/routing config to the tenant, then probing in-mesh and edge.
///
/// The root binding is applied first and therefore released last.
pub fn ingress_scenario(
    namespace: &str,
    root_namespace: &str,
    global_policies: Vec<PolicyDocument>,
    ingress_config: Vec<PolicyDocument>,
    tokens: TokenSet,
) -> Scenario {
    let edge_tokens = tokens.clone();
    Scenario::new("req-authn-ingress", namespace)
        .bind(Scope::Root(root_namespace.to_string()), global_policies)
        .bind_tenant(ingress_config)
        .with_workloads(WORKLOADS)
        .phase(ProbeSelector::Mesh, move |w| ingress_in_mesh(w, &tokens))
        .phase(ProbeSelector::Edge, move |_| ingress_edge(&edge_tokens))
}
