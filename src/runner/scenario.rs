// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scenario description: what to bind, what to provision, what to probe.

use std::fmt;

use crate::fixture::{Catalog, FixtureError};
use crate::policy::{PolicyDocument, PolicyPlan, Scope};
use crate::probe::ProbeSelector;
use crate::provision::Workloads;

/// Builds a phase's catalog once workloads exist.
pub type CatalogFactory = Box<dyn Fn(&Workloads) -> Result<Catalog, FixtureError> + Send + Sync>;

/// One homogeneous catalog run inside a scenario.
pub struct ScenarioPhase {
    pub selector: ProbeSelector,
    factory: CatalogFactory,
}

impl ScenarioPhase {
    pub fn build(&self, workloads: &Workloads) -> Result<Catalog, FixtureError> {
        (self.factory)(workloads)
    }
}

impl fmt::Debug for ScenarioPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioPhase")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

/// A complete conformance scenario.
#[derive(Debug)]
pub struct Scenario {
    name: String,
    tenant_namespace: String,
    plan: PolicyPlan,
    workloads: Vec<String>,
    phases: Vec<ScenarioPhase>,
}

impl Scenario {
    /// New scenario whose workloads live in `tenant_namespace`.
    pub fn new(name: impl Into<String>, tenant_namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tenant_namespace: tenant_namespace.into(),
            plan: PolicyPlan::new(),
            workloads: Vec::new(),
            phases: Vec::new(),
        }
    }

    /// Bind documents to the scenario's tenant namespace.
    pub fn bind_tenant(self, documents: Vec<PolicyDocument>) -> Self {
        let scope = self.tenant_scope();
        self.bind(scope, documents)
    }

    /// Bind documents to an explicit scope.
    pub fn bind(mut self, scope: Scope, documents: Vec<PolicyDocument>) -> Self {
        self.plan = self.plan.bind(scope, documents);
        self
    }

    pub fn with_workloads(mut self, names: &[&str]) -> Self {
        self.workloads.extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn phase<F>(mut self, selector: ProbeSelector, factory: F) -> Self
    where
        F: Fn(&Workloads) -> Result<Catalog, FixtureError> + Send + Sync + 'static,
    {
        self.phases.push(ScenarioPhase {
            selector,
            factory: Box::new(factory),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tenant_scope(&self) -> Scope {
        Scope::Tenant(self.tenant_namespace.clone())
    }

    pub fn plan(&self) -> &PolicyPlan {
        &self.plan
    }

    pub fn workloads(&self) -> &[String] {
        &self.workloads
    }

    pub fn phases(&self) -> &[ScenarioPhase] {
        &self.phases
    }

    /// True if any phase runs with `selector`.
    pub fn uses(&self, selector: ProbeSelector) -> bool {
        self.phases.iter().any(|p| p.selector == selector)
    }
}
