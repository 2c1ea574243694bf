// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-process policy store.
//!
//! Records every operation so callers can inspect ordering, and can be told
//! to reject operations against a scope. Useful for dry runs and tests.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use super::{PolicyDocument, PolicyStore, Scope, StoreError};

/// One recorded store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Apply { scope: Scope, documents: usize },
    Delete { scope: Scope, documents: usize },
}

#[derive(Default)]
struct StoreState {
    active: HashMap<Scope, Vec<PolicyDocument>>,
    log: Vec<StoreOp>,
    failing_apply: HashSet<Scope>,
    failing_delete: HashSet<Scope>,
}

/// Policy store held in memory.
#[derive(Default)]
pub struct InMemoryPolicyStore {
    state: Mutex<StoreState>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every apply against `scope` fail.
    pub fn fail_apply(&self, scope: Scope) {
        self.state.lock().failing_apply.insert(scope);
    }

    /// Make every delete against `scope` fail.
    pub fn fail_delete(&self, scope: Scope) {
        self.state.lock().failing_delete.insert(scope);
    }

    /// Stop rejecting operations against `scope`.
    pub fn recover(&self, scope: &Scope) {
        let mut state = self.state.lock();
        state.failing_apply.remove(scope);
        state.failing_delete.remove(scope);
    }

    /// Documents currently active in `scope`.
    pub fn active(&self, scope: &Scope) -> Vec<PolicyDocument> {
        self.state
            .lock()
            .active
            .get(scope)
            .cloned()
            .unwrap_or_default()
    }

    /// True when no scope holds any document.
    pub fn is_clean(&self) -> bool {
        self.state.lock().active.values().all(|docs| docs.is_empty())
    }

    /// Operations performed so far, in order.
    pub fn log(&self) -> Vec<StoreOp> {
        self.state.lock().log.clone()
    }
}

#[async_trait::async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn apply(&self, scope: &Scope, documents: &[PolicyDocument]) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if state.failing_apply.contains(scope) {
            return Err(StoreError(format!("{} rejected apply", scope)));
        }
        state.log.push(StoreOp::Apply {
            scope: scope.clone(),
            documents: documents.len(),
        });
        state
            .active
            .entry(scope.clone())
            .or_default()
            .extend(documents.iter().cloned());
        Ok(())
    }

    async fn delete(&self, scope: &Scope, documents: &[PolicyDocument]) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if state.failing_delete.contains(scope) {
            return Err(StoreError(format!("{} rejected delete", scope)));
        }
        state.log.push(StoreOp::Delete {
            scope: scope.clone(),
            documents: documents.len(),
        });
        if let Some(active) = state.active.get_mut(scope) {
            for doc in documents {
                if let Some(pos) = active.iter().position(|d| d == doc) {
                    active.remove(pos);
                }
            }
        }
        Ok(())
    }
}
