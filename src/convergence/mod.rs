// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Convergence-aware assertion engine.
//!
//! Policy applied to the control plane reaches enforcement points at
//! different times, so a mismatching observation right after apply is
//! expected. The engine re-probes on a fixed delay until the observation
//! matches or an overall deadline passes, then reports the last observation.
//!
//! "Never converges" and "unreachable" share one outcome,
//! [`Verdict::AssertionTimeout`]. The attached last observation is what
//! tells them apart.

mod engine;
mod verdict;

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::fixture::ExpectedOutcome;
use crate::probe::{ProbeResult, TransportError};

pub use engine::ConvergenceEngine;
pub use verdict::{CaseVerdict, Verdict};

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Default overall deadline, measured from the first attempt.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Delay/deadline pair bounding one assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub deadline: Duration,
}

impl RetryPolicy {
    pub fn new(delay: Duration, deadline: Duration) -> Self {
        Self { delay, deadline }
    }

    /// Latest point after the first attempt at which a failure is reported.
    pub fn worst_case(&self) -> Duration {
        self.deadline + self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RETRY_DELAY,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

/// One way an observation differs from its expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    Transport {
        error: TransportError,
    },
    Status {
        expected: u16,
        observed: Option<u16>,
    },
    Header {
        name: String,
        expected: String,
        observed: Option<String>,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { error } => write!(f, "{}", error),
            Self::Status {
                expected,
                observed: Some(code),
            } => write!(f, "expected status {}, got {}", expected, code),
            Self::Status {
                expected,
                observed: None,
            } => write!(f, "expected status {}, got no status", expected),
            Self::Header {
                name,
                expected,
                observed,
            } if expected.is_empty() => {
                write!(f, "expected header {} absent or empty, got {:?}", name, observed)
            }
            Self::Header {
                name,
                expected,
                observed,
            } => write!(f, "expected header {} = {:?}, got {:?}", name, expected, observed),
        }
    }
}

/// Compare an observation against an expectation.
///
/// Returns every mismatch found; an empty result means the case converged.
/// A transport failure is reported alone since there is no response to
/// inspect.
pub fn evaluate(expected: &ExpectedOutcome, observed: &ProbeResult) -> Vec<Mismatch> {
    if let Some(error) = &observed.error {
        return vec![Mismatch::Transport {
            error: error.clone(),
        }];
    }

    let mut mismatches = Vec::new();
    if observed.status != Some(expected.status_code()) {
        mismatches.push(Mismatch::Status {
            expected: expected.status_code(),
            observed: observed.status,
        });
    }

    for (name, want) in expected.header_expectations() {
        let got = observed.headers.get_joined(name);
        let matches = if want.is_empty() {
            got.as_deref().map_or(true, str::is_empty)
        } else {
            got.as_deref() == Some(want)
        };
        if !matches {
            mismatches.push(Mismatch::Header {
                name: name.to_string(),
                expected: want.to_string(),
                observed: got,
            });
        }
    }
    mismatches
}

/// Render mismatches on one line for logs.
pub fn describe(mismatches: &[Mismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
