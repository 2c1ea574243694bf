// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Metrics emitted through the `metrics` facade.
//!
//! No recorder is installed by the harness; embedders that want the numbers
//! install one. Without a recorder these calls are no-ops.

use std::time::Duration;

use ::metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

use crate::convergence::CaseVerdict;
use crate::probe::ProbeSelector;

pub const PROBE_ATTEMPTS_TOTAL: &str = "authn_conform_probe_attempts_total";
pub const CASES_PASSED_TOTAL: &str = "authn_conform_cases_passed_total";
pub const CASES_FAILED_TOTAL: &str = "authn_conform_cases_failed_total";
pub const CONVERGENCE_SECONDS: &str = "authn_conform_convergence_seconds";

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(PROBE_ATTEMPTS_TOTAL, "Probe attempts issued, including retries");
    describe_counter!(CASES_PASSED_TOTAL, "Cases that converged before the deadline");
    describe_counter!(CASES_FAILED_TOTAL, "Cases that hit the deadline");
    describe_histogram!(
        CONVERGENCE_SECONDS,
        Unit::Seconds,
        "Time from first attempt to first matching observation"
    );
}

pub fn record_probe_attempt(probe: ProbeSelector) {
    counter!(PROBE_ATTEMPTS_TOTAL, "probe" => probe.as_str()).increment(1);
}

pub fn record_convergence(probe: ProbeSelector, elapsed: Duration) {
    histogram!(CONVERGENCE_SECONDS, "probe" => probe.as_str()).record(elapsed.as_secs_f64());
}

pub fn record_case_verdict(verdict: &CaseVerdict) {
    let name = if verdict.passed() {
        CASES_PASSED_TOTAL
    } else {
        CASES_FAILED_TOTAL
    };
    counter!(name, "probe" => verdict.probe.as_str()).increment(1);
}
