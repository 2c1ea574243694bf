// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scenario runner.
//!
//! A run walks a catalog in order, asserting each case independently with
//! one probe variant. A scenario wraps one or more runs with the policy and
//! provisioning lifecycle: bindings are applied first and released in
//! reverse order on every exit path, panics included.

mod report;
mod scenario;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use thiserror::Error;
use tracing::Instrument;

use crate::convergence::{CaseVerdict, ConvergenceEngine, RetryPolicy};
use crate::fixture::{Catalog, CatalogCase, FixtureError};
use crate::policy::{BindingError, PolicyBinding, PolicyStore, ReleaseStack};
use crate::probe::{EdgeProbe, MeshProbe, Probe, ProbeSelector};
use crate::provision::{ProvisionError, Provisioner, Workloads};
use crate::telemetry::{self, CaseSpan, ScenarioSpan, SpanExt};

pub use report::{RunReport, ScenarioReport, EXIT_FAILED, EXIT_PASSED, EXIT_SETUP_ERROR};
pub use scenario::{CatalogFactory, Scenario, ScenarioPhase};

/// Errors that stop a run before any case can be evaluated.
///
/// Per-case failures never surface here; they become [`CaseVerdict`]s.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Policy binding failed: {0}")]
    Binding(#[from] BindingError),

    #[error("Provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    #[error("Invalid catalog: {0}")]
    Catalog(#[from] FixtureError),

    #[error("Catalog '{catalog}' mixes routes: case '{case}' is not a {probe} fixture")]
    MixedRoutes {
        catalog: String,
        case: String,
        probe: ProbeSelector,
    },

    #[error("No {0} probe available for this run")]
    ProbeUnavailable(ProbeSelector),
}

impl HarnessError {
    /// Setup-phase errors abort the invocation; a failed release alone
    /// leaves the verdicts intact.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HarnessError::Binding(BindingError::Release { .. }))
    }

    pub fn exit_code(&self) -> i32 {
        EXIT_SETUP_ERROR
    }
}

/// Collaborators and settings for one scenario invocation.
///
/// Each invocation gets its own context; nothing is shared through globals.
#[derive(Clone)]
pub struct RunContext {
    pub store: Arc<dyn PolicyStore>,
    pub provisioner: Arc<dyn Provisioner>,
    pub retry: RetryPolicy,
}

impl RunContext {
    pub fn new(store: Arc<dyn PolicyStore>, provisioner: Arc<dyn Provisioner>) -> Self {
        Self {
            store,
            provisioner,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// The probe variants available to a runner.
#[derive(Clone, Default)]
pub struct ProbeSet {
    mesh: Option<Arc<dyn Probe>>,
    edge: Option<Arc<dyn Probe>>,
}

impl ProbeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mesh(mut self, probe: Arc<dyn Probe>) -> Self {
        self.mesh = Some(probe);
        self
    }

    pub fn with_edge(mut self, probe: Arc<dyn Probe>) -> Self {
        self.edge = Some(probe);
        self
    }

    pub fn select(&self, selector: ProbeSelector) -> Result<&Arc<dyn Probe>, HarnessError> {
        let slot = match selector {
            ProbeSelector::Mesh => &self.mesh,
            ProbeSelector::Edge => &self.edge,
        };
        slot.as_ref().ok_or(HarnessError::ProbeUnavailable(selector))
    }
}

/// Runs catalogs case by case.
pub struct ScenarioRunner {
    engine: ConvergenceEngine,
    probes: ProbeSet,
}

impl ScenarioRunner {
    pub fn new(engine: ConvergenceEngine, probes: ProbeSet) -> Self {
        Self { engine, probes }
    }

    /// Assert every case of `catalog` in order with the `selector` probe.
    ///
    /// Cases run sequentially and report independently: a failing case
    /// never stops the ones after it. The catalog must be homogeneous.
    pub async fn run(
        &self,
        catalog: &Catalog,
        selector: ProbeSelector,
    ) -> Result<RunReport, HarnessError> {
        let probe = self.probes.select(selector)?;
        check_homogeneous(catalog, selector)?;

        let mut report = RunReport::begin(catalog.name(), selector);
        let run_id = report.run_id.to_string();
        tracing::info!(
            run_id = %run_id,
            catalog = catalog.name(),
            probe = selector.as_str(),
            cases = catalog.len(),
            deadline_ms = self.engine.policy().deadline.as_millis() as u64,
            "run started"
        );

        for case in catalog.all_cases() {
            let span = CaseSpan::new(&run_id, case.fixture.name(), selector);
            let verdict = self
                .assert_case(case, probe.as_ref())
                .instrument(span.clone())
                .await;
            span.record_verdict(&verdict);
            telemetry::record_case_verdict(&verdict);
            report.push(verdict);
        }

        report.finish();
        tracing::info!(
            run_id = %run_id,
            catalog = catalog.name(),
            passed = report.passed_count(),
            failed = report.failed_count(),
            "run finished"
        );
        Ok(report)
    }

    async fn assert_case(&self, case: &CatalogCase, probe: &dyn Probe) -> CaseVerdict {
        self.engine
            .assert(&case.fixture, &case.expected, probe)
            .await
    }

    /// Execute a scenario end to end: bind policy, provision, run every
    /// phase, then release all bindings.
    ///
    /// Release runs even when setup fails or a collaborator panics; a panic
    /// is resumed once teardown is done.
    pub async fn run_scenario(
        ctx: &RunContext,
        scenario: &Scenario,
    ) -> Result<ScenarioReport, HarnessError> {
        let span = ScenarioSpan::new(scenario.name(), scenario.tenant_scope().namespace());
        let result = Self::scenario_lifecycle(ctx, scenario)
            .instrument(span.clone())
            .await;
        span.record_result(&result);
        result
    }

    async fn scenario_lifecycle(
        ctx: &RunContext,
        scenario: &Scenario,
    ) -> Result<ScenarioReport, HarnessError> {
        scenario.plan().validate()?;

        let mut stack = ReleaseStack::new(PolicyBinding::new(ctx.store.clone()));
        let outcome = AssertUnwindSafe(execute(ctx, scenario, &mut stack))
            .catch_unwind()
            .await;

        let teardown = stack.release_all().await;
        for error in &teardown {
            tracing::error!(scenario = scenario.name(), error = %error, "teardown failed");
        }

        match outcome {
            Err(panic) => {
                tracing::error!(scenario = scenario.name(), "scenario panicked, policy released");
                std::panic::resume_unwind(panic)
            }
            Ok(Err(error)) => {
                tracing::error!(
                    scenario = scenario.name(),
                    error = %error,
                    fatal = error.is_fatal(),
                    "scenario aborted"
                );
                Err(error)
            }
            Ok(Ok(runs)) => Ok(ScenarioReport::new(
                scenario.name(),
                runs,
                teardown.iter().map(ToString::to_string).collect(),
            )),
        }
    }
}

fn check_homogeneous(catalog: &Catalog, selector: ProbeSelector) -> Result<(), HarnessError> {
    match catalog
        .all_cases()
        .iter()
        .find(|c| c.fixture.route().selector() != selector)
    {
        Some(case) => Err(HarnessError::MixedRoutes {
            catalog: catalog.name().to_string(),
            case: case.fixture.name().to_string(),
            probe: selector,
        }),
        None => Ok(()),
    }
}

async fn execute(
    ctx: &RunContext,
    scenario: &Scenario,
    stack: &mut ReleaseStack,
) -> Result<Vec<RunReport>, HarnessError> {
    for (scope, documents) in scenario.plan().bindings() {
        stack.apply(scope.clone(), documents.clone()).await?;
    }

    let tenant = scenario.tenant_scope();
    let mut workloads = Workloads::new();
    for name in scenario.workloads() {
        let identity = ctx.provisioner.workload(name, &tenant).await?;
        workloads.insert(name.clone(), identity);
    }

    let mut probes = ProbeSet::new();
    if scenario.uses(ProbeSelector::Mesh) {
        let surface = ctx.provisioner.call_surface().await?;
        probes = probes.with_mesh(Arc::new(MeshProbe::new(surface)));
    }
    if scenario.uses(ProbeSelector::Edge) {
        let gateway = ctx.provisioner.edge_gateway().await?;
        probes = probes.with_edge(Arc::new(EdgeProbe::resolve(gateway).await?));
    }

    let runner = ScenarioRunner::new(ConvergenceEngine::new(ctx.retry), probes);
    let mut runs = Vec::with_capacity(scenario.phases().len());
    for phase in scenario.phases() {
        let catalog = phase.build(&workloads)?;
        runs.push(runner.run(&catalog, phase.selector).await?);
    }
    Ok(runs)
}
