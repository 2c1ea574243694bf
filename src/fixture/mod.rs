// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Request fixtures and their expected outcomes.
//!
//! A fixture names one request scenario: who calls whom, on which path,
//! with which headers. Fixtures are immutable once built and carry no
//! behavior; the convergence engine decides what an observation means.

pub mod catalog;
pub mod token;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::probe::ProbeSelector;

pub use catalog::{Catalog, CatalogBuilder, CatalogCase};
pub use token::{bearer, payload_segment, TokenSet};

/// Header carrying bearer credentials.
pub const AUTHORIZATION: &str = "Authorization";

/// Path used when a fixture does not declare one.
pub const DEFAULT_PATH: &str = "/";

/// Port name used when a fixture does not declare one.
pub const DEFAULT_PORT: &str = "http";

/// Well-known status codes used by the built-in catalogs.
pub mod status {
    pub const OK: u16 = 200;
    pub const UNAUTHORIZED: u16 = 401;
    pub const FORBIDDEN: u16 = 403;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FixtureError {
    #[error("Fixture name must not be empty")]
    EmptyName,

    #[error("Duplicate fixture name in catalog '{catalog}': {name}")]
    DuplicateName { catalog: String, name: String },

    #[error("Invalid header name: {0:?}")]
    InvalidHeaderName(String),

    #[error("Unknown workload: {0}")]
    UnknownWorkload(String),

    #[error("Token {0} is not a compact JWS with a payload segment")]
    MalformedToken(&'static str),
}

/// Opaque handle to a provisioned workload.
///
/// Identities are produced by the provisioning collaborator and live for the
/// duration of one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    name: String,
    namespace: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.namespace)
    }
}

/// Protocol used for a mesh-internal call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallScheme {
    #[default]
    Http,
    Https,
    Grpc,
}

impl CallScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Grpc => "grpc",
        }
    }
}

/// Ordered header multimap.
///
/// Insertion order is preserved and names may repeat. Lookups ignore ASCII
/// case, as HTTP header names do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, keeping any existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Builder form of [`append`](Self::append).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    /// All values recorded for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Values for `name` joined with `,`, or `None` when the header is absent.
    pub fn get_joined(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self.get_all(name).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(","))
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_all(name).next().is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = HeaderSet::new();
        for (k, v) in iter {
            set.append(k, v);
        }
        set
    }
}

/// Where a fixture's request enters the mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    /// Peer-to-peer call between two workloads.
    Mesh {
        source: Identity,
        target: Identity,
        port: String,
        scheme: CallScheme,
    },
    /// Call through the external gateway for a virtual host.
    Edge { host: String, token: Option<String> },
}

impl Route {
    /// The probe variant able to execute this route.
    pub fn selector(&self) -> ProbeSelector {
        match self {
            Self::Mesh { .. } => ProbeSelector::Mesh,
            Self::Edge { .. } => ProbeSelector::Edge,
        }
    }

    /// Short description of the callee for reports.
    pub fn target_label(&self) -> String {
        match self {
            Self::Mesh { target, .. } => target.to_string(),
            Self::Edge { host, .. } => host.clone(),
        }
    }
}

/// A named request scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    name: String,
    route: Route,
    path: String,
    headers: HeaderSet,
}

impl Fixture {
    /// Mesh-internal fixture from `source` to `target` on the default port.
    pub fn mesh(name: impl Into<String>, source: &Identity, target: &Identity) -> Self {
        Self {
            name: name.into(),
            route: Route::Mesh {
                source: source.clone(),
                target: target.clone(),
                port: DEFAULT_PORT.to_string(),
                scheme: CallScheme::Http,
            },
            path: DEFAULT_PATH.to_string(),
            headers: HeaderSet::new(),
        }
    }

    /// Edge fixture addressed to the gateway with virtual host `host`.
    pub fn edge(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            route: Route::Edge {
                host: host.into(),
                token: None,
            },
            path: DEFAULT_PATH.to_string(),
            headers: HeaderSet::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Present `token` as bearer credentials.
    ///
    /// Mesh fixtures carry the header directly; edge fixtures hand the token
    /// to the edge probe, which injects the header itself.
    pub fn with_bearer(mut self, token: &str) -> Self {
        match &mut self.route {
            Route::Mesh { .. } => self.headers.append(AUTHORIZATION, bearer(token)),
            Route::Edge { token: slot, .. } => *slot = Some(token.to_string()),
        }
        self
    }

    /// Override the scheme of a mesh fixture. No effect on edge fixtures.
    pub fn with_scheme(mut self, scheme: CallScheme) -> Self {
        if let Route::Mesh { scheme: slot, .. } = &mut self.route {
            *slot = scheme;
        }
        self
    }

    /// Override the port name of a mesh fixture. No effect on edge fixtures.
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        if let Route::Mesh { port: slot, .. } = &mut self.route {
            *slot = port.into();
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub(crate) fn validate(&self) -> Result<(), FixtureError> {
        if self.name.trim().is_empty() {
            return Err(FixtureError::EmptyName);
        }
        for (name, _) in self.headers.iter() {
            if !is_valid_header_name(name) {
                return Err(FixtureError::InvalidHeaderName(name.to_string()));
            }
        }
        Ok(())
    }
}

// RFC 7230 token characters.
fn is_valid_header_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// What a fixture must observe once policy has converged.
///
/// The status code is mandatory. Header expectations are sparse: only the
/// named headers are checked, and an empty expected value means the header
/// must be absent or empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedOutcome {
    status: u16,
    headers: Vec<(String, String)>,
}

impl ExpectedOutcome {
    pub fn status(code: u16) -> Self {
        Self {
            status: code,
            headers: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::status(status::OK)
    }

    pub fn unauthorized() -> Self {
        Self::status(status::UNAUTHORIZED)
    }

    pub fn forbidden() -> Self {
        Self::status(status::FORBIDDEN)
    }

    /// Require `name` to be observed with exactly `value`.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Require `name` to be absent or empty.
    pub fn without_header(self, name: impl Into<String>) -> Self {
        self.with_header(name, "")
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn header_expectations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
