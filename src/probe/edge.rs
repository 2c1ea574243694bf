// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Edge probe: requests enter through the mesh's external gateway.

use std::sync::Arc;

use super::{unroutable, CallResponse, Probe, ProbeResult, ProbeSelector, TransportError};
use crate::fixture::{bearer, Fixture, HeaderSet, Route, AUTHORIZATION};
use crate::provision::ProvisionError;

/// A single gateway request.
#[derive(Debug, Clone, Copy)]
pub struct EdgeCall<'a> {
    /// Network address of the gateway, resolved once per run.
    pub address: &'a str,
    /// Virtual host presented to the gateway.
    pub host: &'a str,
    pub path: &'a str,
    pub headers: &'a HeaderSet,
}

/// Provisioned external entry point.
#[async_trait::async_trait]
pub trait EdgeGateway: Send + Sync {
    /// Network address clients use to reach the gateway.
    async fn address(&self) -> Result<String, ProvisionError>;

    async fn call(&self, request: EdgeCall<'_>) -> Result<CallResponse, TransportError>;
}

/// Probe that sends each fixture through the gateway.
#[derive(Clone)]
pub struct EdgeProbe {
    gateway: Arc<dyn EdgeGateway>,
    address: String,
}

impl EdgeProbe {
    /// Resolve the gateway address; it is reused for every probe of the run.
    pub async fn resolve(gateway: Arc<dyn EdgeGateway>) -> Result<Self, ProvisionError> {
        let address = gateway.address().await?;
        tracing::info!(address = %address, "edge gateway resolved");
        Ok(Self { gateway, address })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait::async_trait]
impl Probe for EdgeProbe {
    fn selector(&self) -> ProbeSelector {
        ProbeSelector::Edge
    }

    async fn probe(&self, fixture: &Fixture) -> ProbeResult {
        let (host, token) = match fixture.route() {
            Route::Edge { host, token } => (host, token),
            Route::Mesh { .. } => return unroutable(ProbeSelector::Edge, fixture),
        };

        let mut headers = fixture.headers().clone();
        if let Some(token) = token {
            headers.append(AUTHORIZATION, bearer(token));
        }

        let request = EdgeCall {
            address: &self.address,
            host,
            path: fixture.path(),
            headers: &headers,
        };
        tracing::trace!(host = %host, path = fixture.path(), "edge probe");
        self.gateway.call(request).await.into()
    }
}
