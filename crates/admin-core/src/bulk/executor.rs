//! BulkActionExecutor: sends every target id and every action as one
//! request, then reconciles the cache.
//!
//! The server alone decides per-id success; nothing here retries or
//! resubmits a subset. On failure the selection and the cache are left as
//! they were so the operator can retry.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::{AdminError, Result};
use crate::reactive::RefreshHook;
use crate::selection::SharedSelection;
use crate::session::SessionGuard;
use crate::store::OptimisticStateStore;
use crate::transport::{wire, with_deadline, BulkActionTransport};

use super::action::BulkAction;

// ============================================================================
// Request / outcome
// ============================================================================

/// A validated bulk submission: at least one target and at least one action.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkActionRequest {
    ids: Vec<String>,
    actions: Vec<BulkAction>,
}

impl BulkActionRequest {
    /// Duplicate ids are dropped, keeping first occurrence order.
    pub fn new(ids: impl IntoIterator<Item = String>, actions: Vec<BulkAction>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        let ids: Vec<String> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
        if ids.is_empty() {
            return Err(AdminError::EmptyTarget);
        }
        if actions.is_empty() {
            return Err(AdminError::NoActions);
        }
        Ok(Self { ids, actions })
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn actions(&self) -> &[BulkAction] {
        &self.actions
    }
}

/// Server acknowledgement plus what the cache reconciliation touched.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOutcome {
    pub message: String,
    pub result: Value,
    /// Cached records patched in place.
    pub patched: usize,
    /// Cached records dropped by a delete action.
    pub removed: usize,
}

pub struct BulkActionExecutorOptions {
    pub transport: Arc<dyn BulkActionTransport>,
    pub store: Arc<OptimisticStateStore>,
    pub selection: SharedSelection,
    pub session: SessionGuard,
    pub request_timeout: Duration,
    /// Awaited after a successful submission (metrics refresh).
    pub after_mutation: Option<RefreshHook>,
}

// ============================================================================
// BulkActionExecutor
// ============================================================================

pub struct BulkActionExecutor {
    transport: Arc<dyn BulkActionTransport>,
    store: Arc<OptimisticStateStore>,
    selection: SharedSelection,
    session: SessionGuard,
    request_timeout: Duration,
    after_mutation: Option<RefreshHook>,
}

impl BulkActionExecutor {
    pub fn new(options: BulkActionExecutorOptions) -> Self {
        Self {
            transport: options.transport,
            store: options.store,
            selection: options.selection,
            session: options.session,
            request_timeout: options.request_timeout,
            after_mutation: options.after_mutation,
        }
    }

    /// Build a request from the current selection and execute it.
    pub async fn execute_on_selection(&self, actions: Vec<BulkAction>) -> Result<BulkOutcome> {
        let ids = self.selection.lock().ids();
        let request = BulkActionRequest::new(ids, actions)?;
        self.execute(&request).await
    }

    pub async fn execute(&self, request: &BulkActionRequest) -> Result<BulkOutcome> {
        let ctx = self.session.context();
        let body = with_deadline(
            "bulk action",
            self.request_timeout,
            self.transport.submit(&ctx, request.ids(), request.actions()),
        )
        .await
        .inspect_err(|err| {
            self.session.observe(err);
            tracing::warn!(targets = request.ids().len(), error = %err, "bulk action rejected");
        })?;
        let response = wire::bulk_response(body)?;

        let (patched, removed) = self.store.apply_actions(request.ids(), request.actions());
        self.selection.lock().clear();
        tracing::info!(
            targets = request.ids().len(),
            actions = request.actions().len(),
            patched,
            removed,
            "bulk action applied"
        );

        if let Some(hook) = &self.after_mutation {
            hook().await;
        }

        Ok(BulkOutcome {
            message: response.message,
            result: response.result,
            patched,
            removed,
        })
    }
}
