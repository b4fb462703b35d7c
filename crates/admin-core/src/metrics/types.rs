use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::transport::MetricEndpoint;
use crate::types::ResourceKind;

// ============================================================================
// Snapshot
// ============================================================================

/// How a snapshot was produced when it did not come entirely from the remote
/// endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsStatus {
    /// Some remote probes failed and were replaced by their defaults.
    Partial,
    /// Recomputed from the loaded page only; not the full collection.
    LocalApproximation,
    StaticDefaults,
}

/// `category -> metric -> value`, plus an optional degradation flag
/// serialized as `_status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    #[serde(flatten)]
    pub categories: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(rename = "_status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MetricsStatus>,
}

impl MetricsSnapshot {
    pub fn get(&self, category: &str, key: &str) -> Option<f64> {
        self.categories.get(category)?.get(key).copied()
    }

    pub fn set(&mut self, category: &str, key: &str, value: f64) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Insert `value` only when the key is absent.
    pub fn set_default(&mut self, category: &str, key: &str, value: f64) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .entry(key.to_string())
            .or_insert(value);
    }

    pub fn category(&self, category: &str) -> Option<&BTreeMap<String, f64>> {
        self.categories.get(category)
    }

    pub fn is_degraded(&self) -> bool {
        self.status.is_some()
    }

    /// Every metric key of `kind` set to zero.
    pub fn zeroed(kind: ResourceKind) -> Self {
        let mut snapshot = Self::default();
        snapshot.fill_missing(kind);
        snapshot
    }

    /// Give every metric key of `kind` a value, zero when absent.
    pub fn fill_missing(&mut self, kind: ResourceKind) {
        for key in kind.metric_keys() {
            self.set_default(kind.name(), key, 0.0);
        }
    }
}

// ============================================================================
// Remote probes
// ============================================================================

/// Decoded body of one metric endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Scalar(f64),
    /// Each entry lands under the probe's category by its own key.
    Breakdown(BTreeMap<String, f64>),
}

/// One remote endpoint and where its answer goes in the snapshot.
#[derive(Clone)]
pub struct MetricProbe {
    pub category: String,
    pub key: String,
    pub endpoint: Arc<dyn MetricEndpoint>,
    /// Written under `category.key` when the probe fails or times out.
    pub default: f64,
}

impl MetricProbe {
    pub fn new(
        category: impl Into<String>,
        key: impl Into<String>,
        endpoint: Arc<dyn MetricEndpoint>,
    ) -> Self {
        Self {
            category: category.into(),
            key: key.into(),
            endpoint,
            default: 0.0,
        }
    }

    pub fn with_default(mut self, default: f64) -> Self {
        self.default = default;
        self
    }
}

impl fmt::Debug for MetricProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricProbe")
            .field("category", &self.category)
            .field("key", &self.key)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}
