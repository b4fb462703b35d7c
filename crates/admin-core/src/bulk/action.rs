//! Bulk action vocabulary and its local (optimistic) effect on a record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Record, RecordStatus, Role};

/// One entry of a bulk request's ordered action list.
///
/// Serializes as `{ "type": "changeRole", "payload": { "role": "admin" } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum BulkAction {
    ChangeRole {
        role: Role,
    },
    /// Also patches `isActive` when the new status is `active` or `inactive`.
    ChangeStatus {
        status: RecordStatus,
    },
    SetActive {
        #[serde(rename = "isActive")]
        is_active: bool,
    },
    /// Arbitrary field assignments, keyed by wire name.
    SetFields {
        fields: Map<String, Value>,
    },
    Delete,
}

impl BulkAction {
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete)
    }

    /// Apply this action to a cached record. `Delete` is a no-op here; the
    /// store removes deleted records itself.
    pub fn apply_to(&self, record: &mut Record) {
        match self {
            Self::ChangeRole { role } => record.role = Some(role.clone()),
            Self::ChangeStatus { status } => {
                match status {
                    RecordStatus::Active => record.is_active = Some(true),
                    RecordStatus::Inactive => record.is_active = Some(false),
                    _ => {}
                }
                record.status = Some(status.clone());
            }
            Self::SetActive { is_active } => record.is_active = Some(*is_active),
            Self::SetFields { fields } => {
                for (name, value) in fields {
                    record.set(name, value.clone());
                }
            }
            Self::Delete => {}
        }
    }
}
