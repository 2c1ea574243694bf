// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-case outcome.

use std::time::Duration;

use serde::{Serialize, Serializer};

use super::Mismatch;
use crate::probe::{ProbeResult, ProbeSelector};

/// Pass/fail outcome of one fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    /// Retries ran out before the observation matched.
    AssertionTimeout,
}

/// Outcome of asserting one fixture, with diagnostics on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseVerdict {
    pub name: String,
    pub probe: ProbeSelector,
    pub verdict: Verdict,
    pub attempts: u32,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// Last observation; only kept on failure.
    pub last: Option<ProbeResult>,
    /// Differences seen on the last attempt; empty on pass.
    pub mismatches: Vec<Mismatch>,
}

impl CaseVerdict {
    pub fn pass(name: &str, probe: ProbeSelector, attempts: u32, elapsed: Duration) -> Self {
        Self {
            name: name.to_string(),
            probe,
            verdict: Verdict::Pass,
            attempts,
            elapsed,
            last: None,
            mismatches: Vec::new(),
        }
    }

    pub fn timed_out(
        name: &str,
        probe: ProbeSelector,
        attempts: u32,
        elapsed: Duration,
        last: ProbeResult,
        mismatches: Vec<Mismatch>,
    ) -> Self {
        Self {
            name: name.to_string(),
            probe,
            verdict: Verdict::AssertionTimeout,
            attempts,
            elapsed,
            last: Some(last),
            mismatches,
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
