// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Provisioning collaborator: workloads, the call surface between them, and
//! the edge gateway.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::fixture::{FixtureError, Identity};
use crate::policy::Scope;
use crate::probe::{CallSurface, EdgeGateway};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("Failed to provision workload {name} in {scope}: {reason}")]
    Workload {
        name: String,
        scope: Scope,
        reason: String,
    },

    #[error("Call surface unavailable: {0}")]
    CallSurface(String),

    #[error("Edge gateway unavailable: {0}")]
    Edge(String),
}

/// Builds the workloads and entry points a scenario probes.
#[async_trait::async_trait]
pub trait Provisioner: Send + Sync {
    /// Create (or look up) the workload `name` inside `scope`.
    async fn workload(&self, name: &str, scope: &Scope) -> Result<Identity, ProvisionError>;

    /// Transport workloads use to call each other.
    async fn call_surface(&self) -> Result<Arc<dyn CallSurface>, ProvisionError>;

    /// The mesh's external gateway.
    async fn edge_gateway(&self) -> Result<Arc<dyn EdgeGateway>, ProvisionError>;
}

/// Provisioned workloads of one run, keyed by symbolic name.
#[derive(Debug, Clone, Default)]
pub struct Workloads {
    by_name: BTreeMap<String, Identity>,
}

impl Workloads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identities named `names` in `namespace` without provisioning anything.
    pub fn placeholder(names: &[&str], namespace: &str) -> Self {
        let mut workloads = Self::new();
        for name in names {
            workloads.insert(*name, Identity::new(*name, namespace));
        }
        workloads
    }

    pub fn insert(&mut self, name: impl Into<String>, identity: Identity) {
        self.by_name.insert(name.into(), identity);
    }

    pub fn get(&self, name: &str) -> Result<&Identity, FixtureError> {
        self.by_name
            .get(name)
            .ok_or_else(|| FixtureError::UnknownWorkload(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
