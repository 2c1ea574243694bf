// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Telemetry for the harness.
//!
//! Structured logging through `tracing`, one span per asserted case, and
//! counters/histograms through the `metrics` facade. Nothing here affects a
//! verdict.

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use self::metrics::{
    describe_metrics, record_case_verdict, record_convergence, record_probe_attempt,
    CASES_FAILED_TOTAL, CASES_PASSED_TOTAL, CONVERGENCE_SECONDS, PROBE_ATTEMPTS_TOTAL,
};
pub use spans::{CaseSpan, ScenarioSpan, SpanExt};
