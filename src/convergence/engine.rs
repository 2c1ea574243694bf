// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bounded retry loop around a probe.

use tokio::time::Instant;

use super::{describe, evaluate, CaseVerdict, RetryPolicy};
use crate::fixture::{ExpectedOutcome, Fixture};
use crate::probe::{Probe, ProbeResult, TransportError};
use crate::telemetry;

/// Asserts fixtures against expectations, tolerating propagation delay.
#[derive(Debug, Clone, Default)]
pub struct ConvergenceEngine {
    policy: RetryPolicy,
}

impl ConvergenceEngine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Probe `fixture` until the observation matches `expected` or the
    /// deadline passes.
    ///
    /// Succeeds on the first matching attempt. A failure is reported no
    /// earlier than the deadline and no later than deadline + delay. A probe
    /// still in flight at the deadline is abandoned and recorded as a
    /// transport timeout.
    pub async fn assert(
        &self,
        fixture: &Fixture,
        expected: &ExpectedOutcome,
        probe: &dyn Probe,
    ) -> CaseVerdict {
        let selector = probe.selector();
        let started = Instant::now();
        let deadline = started + self.policy.deadline;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let observed = attempt(fixture, probe, deadline).await;
            telemetry::record_probe_attempt(selector);

            let mismatches = evaluate(expected, &observed);
            if mismatches.is_empty() {
                let elapsed = started.elapsed();
                telemetry::record_convergence(selector, elapsed);
                tracing::debug!(
                    case = fixture.name(),
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "converged"
                );
                return CaseVerdict::pass(fixture.name(), selector, attempts, elapsed);
            }

            tracing::debug!(
                case = fixture.name(),
                attempt = attempts,
                mismatch = %describe(&mismatches),
                "not converged yet"
            );

            if Instant::now() < deadline {
                tokio::time::sleep(self.policy.delay).await;
            }
            if Instant::now() >= deadline {
                let elapsed = started.elapsed();
                tracing::warn!(
                    case = fixture.name(),
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    last = %observed,
                    "deadline exceeded"
                );
                return CaseVerdict::timed_out(
                    fixture.name(),
                    selector,
                    attempts,
                    elapsed,
                    observed,
                    mismatches,
                );
            }
        }
    }
}

/// One probe, bounded by the time left before `deadline`.
async fn attempt(fixture: &Fixture, probe: &dyn Probe, deadline: Instant) -> ProbeResult {
    let remaining = deadline.saturating_duration_since(Instant::now());
    match tokio::time::timeout(remaining, probe.probe(fixture)).await {
        Ok(result) => result,
        Err(_) => ProbeResult::from_error(TransportError::Timeout(remaining.as_millis() as u64)),
    }
}
