// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Policy binding: applying rendered policy documents to a scope and
//! guaranteeing their removal.
//!
//! Documents arrive already rendered. The harness never interprets them; it
//! only submits them to the control plane through a [`PolicyStore`] and
//! removes them again when the run ends.

mod binding;
mod memory;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use binding::{PolicyBinding, ReleaseStack};
pub use memory::{InMemoryPolicyStore, StoreOp};

/// Blast radius of an applied policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "namespace", rename_all = "lowercase")]
pub enum Scope {
    /// Isolated namespace owned by one run.
    Tenant(String),
    /// Mesh-wide root namespace shared by every run.
    Root(String),
}

impl Scope {
    pub fn namespace(&self) -> &str {
        match self {
            Self::Tenant(ns) | Self::Root(ns) => ns,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root(_))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tenant(ns) => write!(f, "tenant:{}", ns),
            Self::Root(ns) => write!(f, "root:{}", ns),
        }
    }
}

/// One rendered policy document, opaque to the harness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyDocument(String);

impl PolicyDocument {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PolicyDocument {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}

impl From<String> for PolicyDocument {
    fn from(body: String) -> Self {
        Self(body)
    }
}

/// Error reported by the control plane.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StoreError(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("Failed to apply {documents} document(s) to {scope}: {source}")]
    Apply {
        scope: Scope,
        documents: usize,
        #[source]
        source: StoreError,
    },

    #[error("Failed to release bundle {digest} from {scope}: {source}")]
    Release {
        scope: Scope,
        digest: String,
        #[source]
        source: StoreError,
    },

    #[error("Root scope {0} bound without a tenant-scope counterpart")]
    UnpairedRootScope(Scope),
}

/// Control-plane policy submission.
#[async_trait::async_trait]
pub trait PolicyStore: Send + Sync {
    /// Submit `documents` to `scope`.
    async fn apply(&self, scope: &Scope, documents: &[PolicyDocument]) -> Result<(), StoreError>;

    /// Remove `documents` from `scope`. Removing absent documents succeeds.
    async fn delete(&self, scope: &Scope, documents: &[PolicyDocument]) -> Result<(), StoreError>;
}

/// Documents that have been accepted by a scope.
///
/// A bundle is released at most once; later releases are no-ops.
#[derive(Debug)]
pub struct PolicyBundle {
    scope: Scope,
    documents: Vec<PolicyDocument>,
    digest: String,
    released: AtomicBool,
}

impl PolicyBundle {
    pub(crate) fn new(scope: Scope, documents: Vec<PolicyDocument>) -> Self {
        let digest = bundle_digest(&scope, &documents);
        Self {
            scope,
            documents,
            digest,
            released: AtomicBool::new(false),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn documents(&self) -> &[PolicyDocument] {
        &self.documents
    }

    /// Short hex digest identifying the bundle in logs.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Claim the release. Returns false if already claimed.
    pub(crate) fn mark_released(&self) -> bool {
        !self.released.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn unmark_released(&self) {
        self.released.store(false, Ordering::SeqCst);
    }
}

fn bundle_digest(scope: &Scope, documents: &[PolicyDocument]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.to_string().as_bytes());
    for doc in documents {
        hasher.update([0u8]);
        hasher.update(doc.as_str().as_bytes());
    }
    let full = hex::encode(hasher.finalize());
    full[..12].to_string()
}

/// Ordered list of (scope, documents) bindings for one scenario.
///
/// Application follows declaration order; release runs in reverse.
#[derive(Debug, Clone, Default)]
pub struct PolicyPlan {
    bindings: Vec<(Scope, Vec<PolicyDocument>)>,
}

impl PolicyPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, scope: Scope, documents: Vec<PolicyDocument>) -> Self {
        self.bindings.push((scope, documents));
        self
    }

    pub fn bindings(&self) -> &[(Scope, Vec<PolicyDocument>)] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Root-scope bindings must travel with at least one tenant binding.
    pub fn validate(&self) -> Result<(), BindingError> {
        let has_tenant = self.bindings.iter().any(|(s, _)| !s.is_root());
        match self.bindings.iter().find(|(s, _)| s.is_root()) {
            Some((root, _)) if !has_tenant => Err(BindingError::UnpairedRootScope(root.clone())),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_depends_on_scope() {
        let docs = vec![PolicyDocument::new("kind: X")];
        let a = PolicyBundle::new(Scope::Tenant("ns".into()), docs.clone());
        let b = PolicyBundle::new(Scope::Root("ns".into()), docs);
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 12);
    }

    #[test]
    fn test_mark_released_once() {
        let bundle = PolicyBundle::new(Scope::Tenant("ns".into()), vec![]);
        assert!(bundle.mark_released());
        assert!(!bundle.mark_released());
        assert!(bundle.is_released());
    }

    #[test]
    fn test_plan_rejects_lone_root() {
        let plan = PolicyPlan::new().bind(Scope::Root("istio-system".into()), vec![]);
        assert_eq!(
            plan.validate(),
            Err(BindingError::UnpairedRootScope(Scope::Root(
                "istio-system".into()
            )))
        );
    }

    #[test]
    fn test_plan_accepts_paired_root() {
        let plan = PolicyPlan::new()
            .bind(Scope::Root("istio-system".into()), vec![])
            .bind(Scope::Tenant("ns".into()), vec![]);
        assert!(plan.validate().is_ok());
    }
}
