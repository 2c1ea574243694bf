// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Span utilities for case execution.

use tracing::{info_span, Span};

use crate::convergence::{describe, CaseVerdict};
use crate::probe::ProbeSelector;

/// Extension trait for recording outcomes into spans.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;

    /// Record a case verdict into the span.
    fn record_verdict(&self, verdict: &CaseVerdict);
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }

    fn record_verdict(&self, verdict: &CaseVerdict) {
        self.record("attempts", verdict.attempts);
        if verdict.passed() {
            self.record("status", "pass");
        } else {
            self.record("status", "fail");
            self.record("error.message", describe(&verdict.mismatches).as_str());
        }
    }
}

/// Factory for per-case spans.
pub struct CaseSpan;

impl CaseSpan {
    /// Span for one case.
    ///
    /// `status`, `attempts` and `error.message` are filled by
    /// [`SpanExt::record_verdict`].
    pub fn new(run_id: &str, case: &str, probe: ProbeSelector) -> Span {
        info_span!(
            "case",
            run_id = %run_id,
            case = %case,
            probe = probe.as_str(),
            attempts = tracing::field::Empty,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    }
}

/// Factory for per-scenario spans.
pub struct ScenarioSpan;

impl ScenarioSpan {
    /// `status` and `error.message` are filled by [`SpanExt::record_result`].
    pub fn new(scenario: &str, tenant: &str) -> Span {
        info_span!(
            "scenario",
            scenario = %scenario,
            tenant = %tenant,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    }
}
