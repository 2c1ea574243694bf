//! Fakes for the mesh collaborators shared by integration tests.
//!
//! `SimulatedMesh` enforces the built-in catalogs' policies based on which
//! documents are active in an `InMemoryPolicyStore`, optionally lagging a
//! fixed number of calls behind the store to model propagation.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use authn_conform::fixture::{bearer, payload_segment, HeaderSet, Identity, AUTHORIZATION};
use authn_conform::policy::{InMemoryPolicyStore, PolicyDocument, Scope};
use authn_conform::probe::{
    CallResponse, CallSurface, EdgeCall, EdgeGateway, MeshCall, Probe, ProbeResult,
    ProbeSelector, TransportError,
};
use authn_conform::provision::{ProvisionError, Provisioner};
use authn_conform::{Fixture, TokenSet};
use parking_lot::Mutex;

pub const TENANT: &str = "authn-test";
pub const ROOT: &str = "istio-system";

pub const JWT_POLICY: &str = "kind: RequestAuthentication\nname: authn-jwt";
pub const REQ_AUTHN_POLICY: &str = "kind: RequestAuthentication\nname: req-authn";
pub const GLOBAL_POLICY: &str = "kind: RequestAuthentication\nname: global-jwt";
pub const INGRESS_CONFIG: &str = "kind: Gateway\nname: ingress";

pub fn tokens() -> TokenSet {
    TokenSet {
        issuer1: "eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJzdWItMSJ9.c2lnLTE".to_string(),
        issuer2: "eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiJzdWItMiJ9.c2lnLTI".to_string(),
        expired: "eyJhbGciOiJSUzI1NiJ9.eyJleHAiOjB9.c2lnLTM".to_string(),
        invalid: "eyJhbGciOiJub25lIn0.eyJzdWIiOiJib2d1cyJ9.bm9wZQ".to_string(),
    }
}

pub fn doc(body: &str) -> PolicyDocument {
    PolicyDocument::new(body)
}

pub fn identity(name: &str) -> Identity {
    Identity::new(name, TENANT)
}

// =============================================================================
// Simulated mesh
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    None,
    Issuer1,
    Issuer2,
    Expired,
    Invalid,
}

/// A mesh whose enforcement follows the policy store.
pub struct SimulatedMesh {
    store: Arc<InMemoryPolicyStore>,
    tokens: TokenSet,
    lag: u32,
    enforced_calls: AtomicU32,
    calls: AtomicU32,
}

impl SimulatedMesh {
    pub fn new(store: Arc<InMemoryPolicyStore>, tokens: TokenSet) -> Self {
        Self {
            store,
            tokens,
            lag: 0,
            enforced_calls: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }

    /// Serve stale (unenforced) responses for the first `calls` calls made
    /// while policy is active.
    pub fn with_lag(mut self, calls: u32) -> Self {
        self.lag = calls;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn active(&self, scope: Scope, body: &str) -> bool {
        self.store.active(&scope).iter().any(|d| d.as_str() == body)
    }

    /// True once any policy is active and the lag has elapsed.
    fn propagated(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.store.is_clean() {
            self.enforced_calls.store(0, Ordering::SeqCst);
            return false;
        }
        self.enforced_calls.fetch_add(1, Ordering::SeqCst) >= self.lag
    }

    fn classify(&self, headers: &HeaderSet) -> Token {
        let Some(value) = headers.get_joined(AUTHORIZATION) else {
            return Token::None;
        };
        if value == bearer(&self.tokens.issuer1) {
            Token::Issuer1
        } else if value == bearer(&self.tokens.issuer2) {
            Token::Issuer2
        } else if value == bearer(&self.tokens.expired) {
            Token::Expired
        } else {
            Token::Invalid
        }
    }

    fn payload(&self, token: Token) -> Option<&str> {
        match token {
            Token::Issuer1 => payload_segment(&self.tokens.issuer1),
            Token::Issuer2 => payload_segment(&self.tokens.issuer2),
            _ => None,
        }
    }

    /// The echo workload reflects the headers it received.
    fn echo(status: u16, headers: &HeaderSet) -> CallResponse {
        CallResponse {
            status,
            headers: headers.clone(),
        }
    }

    fn authenticated(&self, headers: &HeaderSet, token: Token, keep_token: bool) -> CallResponse {
        let mut seen: HeaderSet = headers
            .iter()
            .filter(|(k, _)| keep_token || !k.eq_ignore_ascii_case(AUTHORIZATION))
            .collect();
        if let Some(payload) = self.payload(token) {
            seen.append("X-Test-Payload", payload);
        }
        Self::echo(200, &seen)
    }

    fn jwt(&self, target: &str, path: &str, token: Token, headers: &HeaderSet) -> CallResponse {
        let rejected = match (target, token) {
            (_, Token::Expired | Token::Invalid) => true,
            ("b", t) => t != Token::Issuer1,
            ("c", Token::None) => !matches!(path, "/health_check" | "/guest-us"),
            ("d", Token::None) => path == "/something-confidential",
            ("e", t) if path == "/testing-istio-jwt" => t != Token::Issuer1,
            ("e", t) => t != Token::Issuer2,
            _ => false,
        };
        if rejected {
            Self::echo(401, &HeaderSet::new())
        } else {
            Self::echo(200, headers)
        }
    }

    fn req_authn(&self, target: &str, token: Token, headers: &HeaderSet) -> CallResponse {
        match (target, token) {
            ("d", _) => Self::echo(200, headers),
            (_, Token::Expired | Token::Invalid) => Self::echo(401, &HeaderSet::new()),
            ("b", Token::None) => Self::echo(403, &HeaderSet::new()),
            (_, Token::None) => Self::echo(200, headers),
            ("e", t) => self.authenticated(headers, t, true),
            (_, t) => self.authenticated(headers, t, false),
        }
    }

    fn edge(&self, host: &str, path: &str, token: Token) -> CallResponse {
        let status = match (host, token) {
            (_, Token::Expired | Token::Invalid) => 401,
            ("example.com", _) if path == "/healthz" => 200,
            ("example.com", Token::Issuer1) => 200,
            ("any-request-principlal-ok.com", Token::Issuer1 | Token::Issuer2) => 200,
            _ => 403,
        };
        CallResponse::new(status)
    }
}

#[async_trait::async_trait]
impl CallSurface for SimulatedMesh {
    async fn call(&self, request: MeshCall<'_>) -> Result<CallResponse, TransportError> {
        let token = self.classify(request.headers);
        if !self.propagated() {
            return Ok(Self::echo(200, request.headers));
        }
        let target = request.target.name();
        if self.active(Scope::Tenant(TENANT.into()), JWT_POLICY) {
            return Ok(self.jwt(target, request.path, token, request.headers));
        }
        if self.active(Scope::Tenant(TENANT.into()), REQ_AUTHN_POLICY) {
            return Ok(self.req_authn(target, token, request.headers));
        }
        if self.active(Scope::Root(ROOT.into()), GLOBAL_POLICY)
            && matches!(token, Token::Expired | Token::Invalid)
        {
            return Ok(Self::echo(401, &HeaderSet::new()));
        }
        Ok(Self::echo(200, request.headers))
    }
}

#[async_trait::async_trait]
impl EdgeGateway for SimulatedMesh {
    async fn address(&self) -> Result<String, ProvisionError> {
        Ok("10.0.0.1:80".to_string())
    }

    async fn call(&self, request: EdgeCall<'_>) -> Result<CallResponse, TransportError> {
        let token = self.classify(request.headers);
        if !self.propagated() {
            return Ok(CallResponse::new(200));
        }
        let gateway_configured = self.active(Scope::Tenant(TENANT.into()), INGRESS_CONFIG)
            && self.active(Scope::Root(ROOT.into()), GLOBAL_POLICY);
        if !gateway_configured {
            return Err(TransportError::ConnectionRefused(request.address.to_string()));
        }
        Ok(self.edge(request.host, request.path, token))
    }
}

// =============================================================================
// Provisioner
// =============================================================================

/// Hands out identities in the requested scope and shares one mesh.
pub struct FakeProvisioner {
    mesh: Arc<SimulatedMesh>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    provisioned: Mutex<Vec<(String, Scope)>>,
}

impl FakeProvisioner {
    pub fn new(mesh: Arc<SimulatedMesh>) -> Self {
        Self {
            mesh,
            failing: HashSet::new(),
            panicking: HashSet::new(),
            provisioned: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn panicking_on(mut self, name: &str) -> Self {
        self.panicking.insert(name.to_string());
        self
    }

    pub fn provisioned(&self) -> Vec<(String, Scope)> {
        self.provisioned.lock().clone()
    }
}

#[async_trait::async_trait]
impl Provisioner for FakeProvisioner {
    async fn workload(&self, name: &str, scope: &Scope) -> Result<Identity, ProvisionError> {
        if self.panicking.contains(name) {
            panic!("workload {} crashed", name);
        }
        if self.failing.contains(name) {
            return Err(ProvisionError::Workload {
                name: name.to_string(),
                scope: scope.clone(),
                reason: "image pull backoff".to_string(),
            });
        }
        self.provisioned
            .lock()
            .push((name.to_string(), scope.clone()));
        Ok(Identity::new(name, scope.namespace()))
    }

    async fn call_surface(&self) -> Result<Arc<dyn CallSurface>, ProvisionError> {
        Ok(self.mesh.clone())
    }

    async fn edge_gateway(&self) -> Result<Arc<dyn EdgeGateway>, ProvisionError> {
        Ok(self.mesh.clone())
    }
}

// =============================================================================
// Scripted collaborators
// =============================================================================

/// What a scripted surface saw for one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub target: String,
    pub path: String,
    pub headers: HeaderSet,
}

/// Replays a script of responses, repeating the last one.
pub struct ScriptedSurface {
    script: Vec<Result<CallResponse, TransportError>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedSurface {
    pub fn new(script: Vec<Result<CallResponse, TransportError>>) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(status: u16) -> Self {
        Self::new(vec![Ok(CallResponse::new(status))])
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    fn next(&self, recorded: RecordedCall) -> Result<CallResponse, TransportError> {
        let mut calls = self.calls.lock();
        let index = calls.len().min(self.script.len().saturating_sub(1));
        calls.push(recorded);
        self.script
            .get(index)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Other("empty script".to_string())))
    }
}

#[async_trait::async_trait]
impl CallSurface for ScriptedSurface {
    async fn call(&self, request: MeshCall<'_>) -> Result<CallResponse, TransportError> {
        self.next(RecordedCall {
            target: request.target.to_string(),
            path: request.path.to_string(),
            headers: request.headers.clone(),
        })
    }
}

/// Gateway that counts address lookups.
pub struct ScriptedGateway {
    surface: ScriptedSurface,
    lookups: AtomicU32,
}

impl ScriptedGateway {
    pub fn new(surface: ScriptedSurface) -> Self {
        Self {
            surface,
            lookups: AtomicU32::new(0),
        }
    }

    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.surface.calls()
    }
}

#[async_trait::async_trait]
impl EdgeGateway for ScriptedGateway {
    async fn address(&self) -> Result<String, ProvisionError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok("203.0.113.7:443".to_string())
    }

    async fn call(&self, request: EdgeCall<'_>) -> Result<CallResponse, TransportError> {
        self.surface.next(RecordedCall {
            target: request.host.to_string(),
            path: request.path.to_string(),
            headers: request.headers.clone(),
        })
    }
}

/// Probe returning `before` for the first `flip_after` attempts, then `after`.
pub struct FlipProbe {
    flip_after: u32,
    before: ProbeResult,
    after: ProbeResult,
    attempts: AtomicU32,
    per_case: Mutex<HashMap<String, u32>>,
}

impl FlipProbe {
    pub fn new(flip_after: u32, before: ProbeResult, after: ProbeResult) -> Self {
        Self {
            flip_after,
            before,
            after,
            attempts: AtomicU32::new(0),
            per_case: Mutex::new(HashMap::new()),
        }
    }

    pub fn statuses(flip_after: u32, before: u16, after: u16) -> Self {
        Self::new(flip_after, status(before), status(after))
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn attempts_for(&self, case: &str) -> u32 {
        self.per_case.lock().get(case).copied().unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl Probe for FlipProbe {
    fn selector(&self) -> ProbeSelector {
        ProbeSelector::Mesh
    }

    async fn probe(&self, fixture: &Fixture) -> ProbeResult {
        let n = {
            let mut per_case = self.per_case.lock();
            let n = per_case.entry(fixture.name().to_string()).or_insert(0);
            *n += 1;
            *n
        };
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if n > self.flip_after {
            self.after.clone()
        } else {
            self.before.clone()
        }
    }
}

/// Probe that never answers.
pub struct HangingProbe;

#[async_trait::async_trait]
impl Probe for HangingProbe {
    fn selector(&self) -> ProbeSelector {
        ProbeSelector::Mesh
    }

    async fn probe(&self, _fixture: &Fixture) -> ProbeResult {
        std::future::pending().await
    }
}

pub fn status(code: u16) -> ProbeResult {
    ProbeResult::from_response(CallResponse::new(code))
}
