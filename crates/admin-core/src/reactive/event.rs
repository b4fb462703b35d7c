//! Events published to the render layer.

use crate::query::Query;

/// A change to the cached list, emitted by `OptimisticStateStore` after the
/// write has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A list response replaced the cached page.
    Committed { generation: u64, ids: Vec<String>, total: u64 },
    /// Records were patched in place (bulk action or field save).
    Patched { ids: Vec<String> },
    /// Records were dropped from the cache (delete).
    Removed { ids: Vec<String> },
}

impl StoreEvent {
    /// IDs of the records that were affected.
    pub fn ids(&self) -> &[String] {
        match self {
            Self::Committed { ids, .. } | Self::Patched { ids } | Self::Removed { ids } => ids,
        }
    }
}

/// Lifecycle of list requests, emitted by `QueryController`.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    Issued { generation: u64, query: Query },
    Committed { generation: u64, total: u64 },
    /// The response arrived after a newer request had been issued.
    Discarded { generation: u64 },
    Failed { generation: u64, message: String },
}
