//! FieldUpdateRetrier: single-field saves with a bounded candidate retry.
//!
//! The attempt sequence is the primary value followed by each entry of the
//! [`CandidateTable`] once. Only a validation rejection naming the field
//! being saved advances to the next candidate; every other failure ends the
//! save immediately.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::{AdminError, Result, TransportError};
use crate::reactive::RefreshHook;
use crate::session::SessionGuard;
use crate::store::OptimisticStateStore;
use crate::transport::{wire, with_deadline, FieldUpdateTransport};
use crate::types::Record;

use super::candidates::{CandidateTable, FieldUpdateAttempt};
use super::payload::build_payload;

pub struct FieldUpdateRetrierOptions {
    pub transport: Arc<dyn FieldUpdateTransport>,
    pub store: Arc<OptimisticStateStore>,
    pub session: SessionGuard,
    pub table: CandidateTable,
    /// Siblings re-sent with every save when any of them holds a value.
    pub preserved_fields: Vec<String>,
    pub request_timeout: Duration,
    pub after_mutation: Option<RefreshHook>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSaveOutcome {
    /// The server's copy of the record.
    pub record: Record,
    /// The encoding the server finally accepted.
    pub accepted_value: Value,
    pub attempts: usize,
}

pub struct FieldUpdateRetrier {
    transport: Arc<dyn FieldUpdateTransport>,
    store: Arc<OptimisticStateStore>,
    session: SessionGuard,
    table: CandidateTable,
    preserved_fields: Vec<String>,
    request_timeout: Duration,
    after_mutation: Option<RefreshHook>,
}

impl FieldUpdateRetrier {
    pub fn new(options: FieldUpdateRetrierOptions) -> Self {
        Self {
            transport: options.transport,
            store: options.store,
            session: options.session,
            table: options.table,
            preserved_fields: options.preserved_fields,
            request_timeout: options.request_timeout,
            after_mutation: options.after_mutation,
        }
    }

    pub fn table(&self) -> &CandidateTable {
        &self.table
    }

    /// Save `field = value` on record `id`.
    pub async fn save(&self, id: &str, field: &str, value: Value) -> Result<FieldSaveOutcome> {
        let candidates = self.table.candidates_for(field, &value);
        let mut attempt = FieldUpdateAttempt::new(field, value, candidates);

        loop {
            let current = self.store.get(id);
            let payload = build_payload(
                id,
                field,
                attempt.current_value(),
                current.as_ref(),
                &self.preserved_fields,
            );

            let ctx = self.session.context();
            let response = with_deadline(
                "field update",
                self.request_timeout,
                self.transport.update(&ctx, id, &payload),
            )
            .await;

            let err = match response {
                Ok(body) => {
                    let record = wire::field_update(body)?.data;
                    return self.commit(id, record, &attempt).await;
                }
                Err(err) => err,
            };

            if self.session.observe(&err) || err.validation_field() != Some(field) {
                return Err(err.into());
            }

            if !attempt.advance() {
                tracing::warn!(
                    id,
                    field,
                    attempts = attempt.attempts(),
                    "field save rejected after exhausting candidates"
                );
                return Err(rejected(&attempt, &err));
            }
            tracing::warn!(
                id,
                field,
                attempt = attempt.attempts(),
                max_attempts = attempt.max_attempts(),
                "field value rejected; retrying with alternate encoding"
            );
        }
    }

    /// The saved record replaces the cached copy only when its id matches the
    /// one requested; a mismatch leaves the cache untouched.
    async fn commit(
        &self,
        id: &str,
        record: Record,
        attempt: &FieldUpdateAttempt,
    ) -> Result<FieldSaveOutcome> {
        if record.id != id {
            tracing::warn!(requested = id, returned = %record.id, "field update returned a different record id");
            return Err(AdminError::decode(
                "field update",
                format!("requested record {id}, server returned {}", record.id),
            ));
        }
        self.store.replace(record.clone());
        tracing::info!(id, field = %attempt.field, attempts = attempt.attempts(), "field saved");

        if let Some(hook) = &self.after_mutation {
            hook().await;
        }

        Ok(FieldSaveOutcome {
            record,
            accepted_value: attempt.current_value().clone(),
            attempts: attempt.attempts(),
        })
    }
}

fn rejected(attempt: &FieldUpdateAttempt, err: &TransportError) -> AdminError {
    let original = match &attempt.primary_value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    AdminError::FieldRejected {
        field: attempt.field.clone(),
        original,
        attempts: attempt.attempts(),
        message: err.message(),
    }
}
