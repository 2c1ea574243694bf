// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Mesh-internal probe: a workload calls another workload directly.

use std::sync::Arc;

use super::{unroutable, CallResponse, Probe, ProbeResult, ProbeSelector, TransportError};
use crate::fixture::{CallScheme, Fixture, HeaderSet, Identity, Route};

/// A single peer-to-peer call as handed to the call surface.
#[derive(Debug, Clone, Copy)]
pub struct MeshCall<'a> {
    pub source: &'a Identity,
    pub target: &'a Identity,
    pub port: &'a str,
    pub scheme: CallScheme,
    pub path: &'a str,
    pub headers: &'a HeaderSet,
}

/// Transport used by workloads to reach each other.
#[async_trait::async_trait]
pub trait CallSurface: Send + Sync {
    async fn call(&self, request: MeshCall<'_>) -> Result<CallResponse, TransportError>;
}

/// Probe that sends each fixture from its source workload to its target.
#[derive(Clone)]
pub struct MeshProbe {
    surface: Arc<dyn CallSurface>,
}

impl MeshProbe {
    pub fn new(surface: Arc<dyn CallSurface>) -> Self {
        Self { surface }
    }
}

#[async_trait::async_trait]
impl Probe for MeshProbe {
    fn selector(&self) -> ProbeSelector {
        ProbeSelector::Mesh
    }

    async fn probe(&self, fixture: &Fixture) -> ProbeResult {
        let (source, target, port, scheme) = match fixture.route() {
            Route::Mesh {
                source,
                target,
                port,
                scheme,
            } => (source, target, port, *scheme),
            Route::Edge { .. } => return unroutable(ProbeSelector::Mesh, fixture),
        };

        let request = MeshCall {
            source,
            target,
            port,
            scheme,
            path: fixture.path(),
            headers: fixture.headers(),
        };
        tracing::trace!(
            source = %source,
            target = %target,
            path = fixture.path(),
            scheme = scheme.as_str(),
            "mesh probe"
        );
        self.surface.call(request).await.into()
    }
}
