//! Collaborator contracts consumed by the core.
//!
//! Implementations live in the host application (HTTP clients, test
//! doubles). Every method returns the raw JSON body; decoding against the
//! canonical schema happens in [`super::wire`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::bulk::BulkAction;
use crate::error::TransportError;
use crate::query::Query;
use crate::session::CallContext;

/// Fetch one page of a collection. Expected body: `{ "items": [...], "total": n }`.
#[async_trait]
pub trait ListFetch: Send + Sync {
    async fn fetch(&self, ctx: &CallContext, query: &Query) -> Result<Value, TransportError>;
}

/// Submit every target id and every action in a single request.
/// Expected body: `{ "message": "...", "result": {...} }`.
#[async_trait]
pub trait BulkActionTransport: Send + Sync {
    async fn submit(
        &self,
        ctx: &CallContext,
        ids: &[String],
        actions: &[BulkAction],
    ) -> Result<Value, TransportError>;
}

/// Save a partial record. Expected body: `{ "data": { ...record } }`.
#[async_trait]
pub trait FieldUpdateTransport: Send + Sync {
    async fn update(
        &self,
        ctx: &CallContext,
        id: &str,
        payload: &Map<String, Value>,
    ) -> Result<Value, TransportError>;
}

#[async_trait]
pub trait RecordDelete: Send + Sync {
    async fn delete(&self, ctx: &CallContext, id: &str) -> Result<(), TransportError>;
}

/// One analytics endpoint. Expected body: a number, or an object of numbers.
#[async_trait]
pub trait MetricEndpoint: Send + Sync {
    async fn fetch(&self, ctx: &CallContext) -> Result<Value, TransportError>;
}

/// Race `fut` against `limit`. Elapsing maps to `TransportError::Timeout`.
pub async fn with_deadline<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout {
            operation: operation.to_string(),
            after_ms: limit.as_millis() as u64,
        }),
    }
}
