// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Aggregate reporting.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::convergence::{describe, CaseVerdict};
use crate::probe::ProbeSelector;

/// Every case passed.
pub const EXIT_PASSED: i32 = 0;
/// At least one case failed, or teardown left policy behind.
pub const EXIT_FAILED: i32 = 1;
/// Setup failed before any case ran.
pub const EXIT_SETUP_ERROR: i32 = 2;

/// Verdicts of one catalog run, in catalog order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub catalog: String,
    pub probe: ProbeSelector,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub verdicts: Vec<CaseVerdict>,
}

impl RunReport {
    pub(crate) fn begin(catalog: &str, probe: ProbeSelector) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            catalog: catalog.to_string(),
            probe,
            started_at: Utc::now(),
            finished_at: None,
            verdicts: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, verdict: CaseVerdict) {
        self.verdicts.push(verdict);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(CaseVerdict::passed)
    }

    pub fn passed_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.verdicts.len() - self.passed_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseVerdict> {
        self.verdicts.iter().filter(|v| !v.passed())
    }

    pub fn verdict(&self, name: &str) -> Option<&CaseVerdict> {
        self.verdicts.iter().find(|v| v.name == name)
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            EXIT_PASSED
        } else {
            EXIT_FAILED
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary: one line per case, with the last observation
    /// of each failing case.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} [{}] {}/{} passed",
            self.catalog,
            self.probe,
            self.passed_count(),
            self.verdicts.len()
        );
        for verdict in &self.verdicts {
            if verdict.passed() {
                let _ = writeln!(
                    out,
                    "  PASS {} ({} attempt(s), {}ms)",
                    verdict.name,
                    verdict.attempts,
                    verdict.elapsed.as_millis()
                );
            } else {
                let _ = writeln!(
                    out,
                    "  FAIL {} after {} attempt(s), {}ms: {}",
                    verdict.name,
                    verdict.attempts,
                    verdict.elapsed.as_millis(),
                    describe(&verdict.mismatches)
                );
                if let Some(last) = &verdict.last {
                    let _ = writeln!(out, "       last observed: {}", last);
                }
            }
        }
        out
    }
}

/// Reports of every phase of a scenario plus teardown problems.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub runs: Vec<RunReport>,
    pub teardown_errors: Vec<String>,
}

impl ScenarioReport {
    pub(crate) fn new(scenario: &str, runs: Vec<RunReport>, teardown_errors: Vec<String>) -> Self {
        Self {
            scenario: scenario.to_string(),
            runs,
            teardown_errors,
        }
    }

    /// All cases passed and every binding was released.
    pub fn passed(&self) -> bool {
        self.teardown_errors.is_empty() && self.runs.iter().all(RunReport::passed)
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            EXIT_PASSED
        } else {
            EXIT_FAILED
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn summary(&self) -> String {
        let mut out = format!("scenario {}\n", self.scenario);
        for run in &self.runs {
            out.push_str(&run.summary());
        }
        for error in &self.teardown_errors {
            let _ = writeln!(out, "  TEARDOWN {}", error);
        }
        out
    }
}
