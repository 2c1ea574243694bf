// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! authn-conform
//!
//! A conformance harness for request authentication and authorization
//! policy in a service mesh. Policy takes effect asynchronously, so every
//! assertion polls until the observed response matches or a deadline
//! passes.
//!
//! # Components
//!
//! - **Fixtures** ([`fixture`]): immutable case catalogs pairing a request
//!   with its expected status and headers
//! - **Policy binding** ([`policy`]): scoped apply/release of policy
//!   documents, released in reverse order on every exit path
//! - **Probes** ([`probe`]): in-mesh and edge request execution
//! - **Convergence** ([`convergence`]): retry-until-deadline assertions
//! - **Runner** ([`runner`]): sequential, isolated case execution and
//!   scenario lifecycle
//!
//! The mesh itself (policy store, workloads, call surface, gateway) is
//! reached through the collaborator traits in [`policy`], [`probe`] and
//! [`provision`].

pub mod catalogs;
pub mod cli;
pub mod config;
pub mod convergence;
pub mod fixture;
pub mod policy;
pub mod probe;
pub mod provision;
pub mod runner;
pub mod telemetry;

pub use convergence::{CaseVerdict, ConvergenceEngine, RetryPolicy, Verdict};
pub use fixture::{Catalog, ExpectedOutcome, Fixture, TokenSet};
pub use policy::{PolicyBinding, PolicyDocument, PolicyStore, Scope};
pub use probe::{EdgeProbe, MeshProbe, Probe, ProbeResult, ProbeSelector};
pub use provision::{Provisioner, Workloads};
pub use runner::{HarnessError, RunContext, RunReport, Scenario, ScenarioReport, ScenarioRunner};
