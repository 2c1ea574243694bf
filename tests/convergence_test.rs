//! Convergence-aware assertion tests, driven on paused tokio time.

mod common;

use std::sync::Arc;
use std::time::Duration;

use authn_conform::convergence::{
    ConvergenceEngine, Mismatch, RetryPolicy, Verdict, DEFAULT_DEADLINE, DEFAULT_RETRY_DELAY,
};
use authn_conform::fixture::AUTHORIZATION;
use authn_conform::probe::{CallResponse, MeshProbe, ProbeResult, TransportError};
use authn_conform::{ExpectedOutcome, Fixture};
use common::{identity, status, FlipProbe, HangingProbe, ScriptedSurface};
use tokio::time::Instant;

fn fixture(name: &str) -> Fixture {
    Fixture::mesh(name, &identity("a"), &identity("b"))
}

// =============================================================================
// Timing Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn passes_on_first_matching_attempt() {
    let probe = FlipProbe::statuses(0, 500, 200);
    let engine = ConvergenceEngine::default();

    let started = Instant::now();
    let verdict = engine
        .assert(&fixture("instant"), &ExpectedOutcome::ok(), &probe)
        .await;

    assert!(verdict.passed());
    assert_eq!(verdict.attempts, 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(verdict.last.is_none());
}

#[tokio::test(start_paused = true)]
async fn converges_after_propagation_delay() {
    // Stale 200s for 4 attempts before the policy lands.
    let probe = FlipProbe::statuses(4, 200, 401);
    let engine = ConvergenceEngine::default();

    let verdict = engine
        .assert(&fixture("late"), &ExpectedOutcome::unauthorized(), &probe)
        .await;

    assert!(verdict.passed());
    assert_eq!(verdict.attempts, 5);
    assert_eq!(verdict.elapsed, DEFAULT_RETRY_DELAY * 4);
    assert!(verdict.mismatches.is_empty());
}

#[tokio::test(start_paused = true)]
async fn never_converging_fails_within_deadline_window() {
    let probe = FlipProbe::statuses(u32::MAX, 200, 200);
    let engine = ConvergenceEngine::default();

    let started = Instant::now();
    let verdict = engine
        .assert(&fixture("stuck"), &ExpectedOutcome::forbidden(), &probe)
        .await;
    let elapsed = started.elapsed();

    assert_eq!(verdict.verdict, Verdict::AssertionTimeout);
    assert!(elapsed >= DEFAULT_DEADLINE);
    assert!(elapsed <= DEFAULT_DEADLINE + DEFAULT_RETRY_DELAY);
    assert_eq!(verdict.attempts, 120);
    assert_eq!(verdict.last, Some(status(200)));
    assert_eq!(
        verdict.mismatches,
        vec![Mismatch::Status {
            expected: 403,
            observed: Some(200),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn hanging_probe_is_bounded_by_deadline() {
    let engine = ConvergenceEngine::default();

    let started = Instant::now();
    let verdict = engine
        .assert(&fixture("hung"), &ExpectedOutcome::ok(), &HangingProbe)
        .await;
    let elapsed = started.elapsed();

    assert!(!verdict.passed());
    assert_eq!(verdict.attempts, 1);
    assert!(elapsed >= DEFAULT_DEADLINE);
    assert!(elapsed <= DEFAULT_DEADLINE + DEFAULT_RETRY_DELAY);
    let last = verdict.last.unwrap();
    assert!(matches!(last.error, Some(TransportError::Timeout(_))));
}

#[tokio::test(start_paused = true)]
async fn slow_probe_never_overruns_deadline() {
    // Each call takes 7s; the fifth is cut off by the deadline.
    struct SlowProbe;

    #[async_trait::async_trait]
    impl authn_conform::Probe for SlowProbe {
        fn selector(&self) -> authn_conform::ProbeSelector {
            authn_conform::ProbeSelector::Mesh
        }

        async fn probe(&self, _fixture: &Fixture) -> ProbeResult {
            tokio::time::sleep(Duration::from_secs(7)).await;
            status(200)
        }
    }

    let engine = ConvergenceEngine::default();
    let started = Instant::now();
    let verdict = engine
        .assert(&fixture("slow"), &ExpectedOutcome::forbidden(), &SlowProbe)
        .await;
    let elapsed = started.elapsed();

    assert!(!verdict.passed());
    assert!(elapsed >= DEFAULT_DEADLINE);
    assert!(elapsed <= DEFAULT_DEADLINE + DEFAULT_RETRY_DELAY);
}

#[tokio::test(start_paused = true)]
async fn custom_policy_is_honored() {
    let policy = RetryPolicy::new(Duration::from_millis(100), Duration::from_secs(2));
    let engine = ConvergenceEngine::new(policy);
    let probe = FlipProbe::statuses(u32::MAX, 200, 200);

    let started = Instant::now();
    let verdict = engine
        .assert(&fixture("short"), &ExpectedOutcome::unauthorized(), &probe)
        .await;

    assert!(!verdict.passed());
    assert_eq!(verdict.attempts, 20);
    assert_eq!(started.elapsed(), Duration::from_secs(2));
    assert_eq!(policy.worst_case(), Duration::from_millis(2100));
}

#[tokio::test(start_paused = true)]
async fn transport_errors_are_retried() {
    let surface = Arc::new(ScriptedSurface::new(vec![
        Err(TransportError::ConnectionRefused("b".to_string())),
        Err(TransportError::ConnectionRefused("b".to_string())),
        Ok(CallResponse::new(200)),
    ]));
    let probe = MeshProbe::new(surface.clone());

    let verdict = ConvergenceEngine::default()
        .assert(&fixture("sidecar-starting"), &ExpectedOutcome::ok(), &probe)
        .await;

    assert!(verdict.passed());
    assert_eq!(verdict.attempts, 3);
    assert_eq!(surface.calls().len(), 3);
}

// =============================================================================
// Header Assertion Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn header_expectations_must_hold_together_with_status() {
    // Status already 200, header catches up on the third attempt.
    let surface = Arc::new(ScriptedSurface::new(vec![
        Ok(CallResponse::new(200).with_header(AUTHORIZATION, "Bearer t")),
        Ok(CallResponse::new(200).with_header(AUTHORIZATION, "Bearer t")),
        Ok(CallResponse::new(200).with_header("x-test-payload", "cGF5")),
    ]));
    let probe = MeshProbe::new(surface);
    let expected = ExpectedOutcome::ok()
        .without_header(AUTHORIZATION)
        .with_header("X-Test-Payload", "cGF5");

    let verdict = ConvergenceEngine::default()
        .assert(&fixture("strip"), &expected, &probe)
        .await;

    assert!(verdict.passed());
    assert_eq!(verdict.attempts, 3);
}

#[tokio::test(start_paused = true)]
async fn header_mismatch_is_reported_on_timeout() {
    let policy = RetryPolicy::new(Duration::from_millis(250), Duration::from_secs(1));
    let probe = FlipProbe::new(
        u32::MAX,
        ProbeResult::from_response(CallResponse::new(200).with_header(AUTHORIZATION, "Bearer t")),
        status(200),
    );

    let verdict = ConvergenceEngine::new(policy)
        .assert(
            &fixture("leaky"),
            &ExpectedOutcome::ok().without_header(AUTHORIZATION),
            &probe,
        )
        .await;

    assert!(!verdict.passed());
    assert_eq!(
        verdict.mismatches,
        vec![Mismatch::Header {
            name: AUTHORIZATION.to_string(),
            expected: String::new(),
            observed: Some("Bearer t".to_string()),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn multi_valued_header_compares_joined() {
    let surface = Arc::new(ScriptedSurface::new(vec![Ok(CallResponse::new(200)
        .with_header("X-Forwarded-For", "10.0.0.1")
        .with_header("x-forwarded-for", "10.0.0.2"))]));
    let probe = MeshProbe::new(surface);

    let verdict = ConvergenceEngine::default()
        .assert(
            &fixture("xff"),
            &ExpectedOutcome::ok().with_header("X-Forwarded-For", "10.0.0.1,10.0.0.2"),
            &probe,
        )
        .await;

    assert!(verdict.passed());
}

// =============================================================================
// Verdict serialization
// =============================================================================

#[tokio::test(start_paused = true)]
async fn verdict_serializes_elapsed_in_millis() {
    let probe = FlipProbe::statuses(2, 200, 403);
    let verdict = ConvergenceEngine::default()
        .assert(&fixture("json"), &ExpectedOutcome::forbidden(), &probe)
        .await;

    let json = serde_json::to_value(&verdict).unwrap();
    assert_eq!(json["verdict"], "pass");
    assert_eq!(json["elapsed_ms"], 500);
    assert_eq!(json["attempts"], 3);
}
