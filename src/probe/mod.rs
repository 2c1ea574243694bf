// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Probe executor: one request per fixture, no retries.
//!
//! Two probe variants share the [`Probe`] capability: [`MeshProbe`] issues a
//! peer-to-peer call between workloads, [`EdgeProbe`] enters through the
//! external gateway. Transport failures are captured in the [`ProbeResult`]
//! so the convergence engine treats them like any other mismatch.

mod edge;
mod mesh;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fixture::{Fixture, HeaderSet};

pub use edge::{EdgeCall, EdgeGateway, EdgeProbe};
pub use mesh::{CallSurface, MeshCall, MeshProbe};

/// Probe variant used for a run. Runs never mix variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeSelector {
    Mesh,
    Edge,
}

impl ProbeSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::Edge => "edge",
        }
    }
}

impl fmt::Display for ProbeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request that did not produce a response.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TransportError {
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("Probe timed out after {0}ms")]
    Timeout(u64),

    #[error("Fixture route not supported by {probe} probe: {fixture}")]
    Unroutable { probe: ProbeSelector, fixture: String },

    #[error("Transport error: {0}")]
    Other(String),
}

/// Response returned by a call collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResponse {
    pub status: u16,
    pub headers: HeaderSet,
}

impl CallResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderSet::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }
}

/// What one probe attempt observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub status: Option<u16>,
    pub headers: HeaderSet,
    pub error: Option<TransportError>,
}

impl ProbeResult {
    pub fn from_response(response: CallResponse) -> Self {
        Self {
            status: Some(response.status),
            headers: response.headers,
            error: None,
        }
    }

    pub fn from_error(error: TransportError) -> Self {
        Self {
            status: None,
            headers: HeaderSet::new(),
            error: Some(error),
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        self.error.is_some()
    }
}

impl From<Result<CallResponse, TransportError>> for ProbeResult {
    fn from(result: Result<CallResponse, TransportError>) -> Self {
        match result {
            Ok(response) => Self::from_response(response),
            Err(e) => Self::from_error(e),
        }
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.error) {
            (_, Some(e)) => write!(f, "{}", e),
            (Some(code), None) => {
                write!(f, "status {}", code)?;
                for (k, v) in self.headers.iter() {
                    write!(f, ", {}: {:?}", k, v)?;
                }
                Ok(())
            }
            (None, None) => f.write_str("no response"),
        }
    }
}

/// Issue exactly one request for a fixture.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    fn selector(&self) -> ProbeSelector;

    async fn probe(&self, fixture: &Fixture) -> ProbeResult;
}

fn unroutable(probe: ProbeSelector, fixture: &Fixture) -> ProbeResult {
    ProbeResult::from_error(TransportError::Unroutable {
        probe,
        fixture: fixture.name().to_string(),
    })
}
