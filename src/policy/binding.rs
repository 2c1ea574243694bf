// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Apply/release lifecycle around a policy store.

use std::sync::Arc;

use super::{BindingError, PolicyBundle, PolicyDocument, PolicyStore, Scope};

/// Submits documents to a scope and removes them again.
#[derive(Clone)]
pub struct PolicyBinding {
    store: Arc<dyn PolicyStore>,
}

impl PolicyBinding {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }

    /// Apply already-rendered `documents` to `scope`.
    pub async fn apply(
        &self,
        scope: Scope,
        documents: Vec<PolicyDocument>,
    ) -> Result<PolicyBundle, BindingError> {
        if let Err(source) = self.store.apply(&scope, &documents).await {
            tracing::error!(scope = %scope, error = %source, "policy apply failed");
            return Err(BindingError::Apply {
                documents: documents.len(),
                scope,
                source,
            });
        }
        let bundle = PolicyBundle::new(scope, documents);
        tracing::info!(
            scope = %bundle.scope(),
            digest = bundle.digest(),
            documents = bundle.documents().len(),
            "policy applied"
        );
        Ok(bundle)
    }

    /// Remove a bundle. Releasing an already released bundle is a no-op.
    ///
    /// A failed release leaves the bundle unreleased so it can be retried.
    pub async fn release(&self, bundle: &PolicyBundle) -> Result<(), BindingError> {
        if !bundle.mark_released() {
            tracing::debug!(digest = bundle.digest(), "policy bundle already released");
            return Ok(());
        }
        match self.store.delete(bundle.scope(), bundle.documents()).await {
            Ok(()) => {
                tracing::info!(scope = %bundle.scope(), digest = bundle.digest(), "policy released");
                Ok(())
            }
            Err(source) => {
                bundle.unmark_released();
                tracing::error!(
                    scope = %bundle.scope(),
                    digest = bundle.digest(),
                    error = %source,
                    "policy release failed"
                );
                Err(BindingError::Release {
                    scope: bundle.scope().clone(),
                    digest: bundle.digest().to_string(),
                    source,
                })
            }
        }
    }
}

/// Bundles applied during one run, released last-in first-out.
///
/// The runner drains the stack on every exit path. Bundles whose release
/// fails stay on the stack; a stack dropped while still holding unreleased
/// bundles logs each one, since residual policy leaks into later runs.
pub struct ReleaseStack {
    binding: PolicyBinding,
    bundles: Vec<PolicyBundle>,
}

impl ReleaseStack {
    pub fn new(binding: PolicyBinding) -> Self {
        Self {
            binding,
            bundles: Vec::new(),
        }
    }

    /// Apply and record a bundle for later release.
    pub async fn apply(
        &mut self,
        scope: Scope,
        documents: Vec<PolicyDocument>,
    ) -> Result<&PolicyBundle, BindingError> {
        let bundle = self.binding.apply(scope, documents).await?;
        self.bundles.push(bundle);
        Ok(&self.bundles[self.bundles.len() - 1])
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Release every bundle in reverse application order.
    ///
    /// Every bundle gets a release attempt even if an earlier one fails; all
    /// failures are returned. Bundles that failed to release stay on the
    /// stack, in application order, so a later call retries them.
    pub async fn release_all(&mut self) -> Vec<BindingError> {
        let mut errors = Vec::new();
        let mut retained = Vec::new();
        while let Some(bundle) = self.bundles.pop() {
            if let Err(e) = self.binding.release(&bundle).await {
                errors.push(e);
                retained.push(bundle);
            }
        }
        retained.reverse();
        self.bundles = retained;
        errors
    }
}

impl Drop for ReleaseStack {
    fn drop(&mut self) {
        for bundle in self.bundles.iter().filter(|b| !b.is_released()) {
            tracing::warn!(
                scope = %bundle.scope(),
                digest = bundle.digest(),
                "policy bundle dropped without release"
            );
        }
    }
}
