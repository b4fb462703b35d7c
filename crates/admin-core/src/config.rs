//! Tunables for the administration core.
//!
//! Every field has a default, so an empty document is a valid configuration.
//!
//! # Example
//!
//! ```toml
//! debounce_ms = 300
//! metric_timeout_ms = 2000
//!
//! [page_size]
//! orders = 25
//!
//! [[candidates]]
//! field = "role"
//! value = "moderator"
//! candidates = ["Moderator", "MODERATOR"]
//!
//! [[breakdowns]]
//! category = "users"
//! total = "total"
//! parts = ["active", "inactive"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AdminError, Result};
use crate::types::{RecordStatus, ResourceKind};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One row of the field-value retry table: when saving `field = value` is
/// rejected, try `candidates` in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRule {
    pub field: String,
    pub value: String,
    pub candidates: Vec<String>,
}

/// Declares that `total` in `category` must equal the sum of `parts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRule {
    pub category: String,
    pub total: String,
    pub parts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Quiet period before a burst of query patches becomes one fetch.
    pub debounce_ms: u64,
    /// Per-endpoint bound for metric probes.
    pub metric_timeout_ms: u64,
    /// Transport ceiling for list, bulk, field-update, and delete calls.
    pub request_timeout_ms: u64,
    /// Page size overrides keyed by resource name.
    pub page_size: BTreeMap<String, usize>,
    /// Order field summed for revenue metrics.
    pub amount_field: String,
    pub revenue_statuses: Vec<RecordStatus>,
    pub pending_statuses: Vec<RecordStatus>,
    /// Sibling fields re-sent with every single-field save when any of them
    /// currently holds a value.
    pub preserved_fields: Vec<String>,
    pub candidates: Vec<CandidateRule>,
    pub breakdowns: Vec<BreakdownRule>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            metric_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
            page_size: BTreeMap::new(),
            amount_field: "amount".to_string(),
            revenue_statuses: vec![RecordStatus::Shipped, RecordStatus::Delivered],
            pending_statuses: vec![RecordStatus::Pending, RecordStatus::Processing],
            preserved_fields: vec!["phone".to_string(), "address".to_string()],
            candidates: vec![
                CandidateRule {
                    field: "role".to_string(),
                    value: "moderator".to_string(),
                    candidates: vec!["Moderator".to_string()],
                },
                CandidateRule {
                    field: "role".to_string(),
                    value: "customer".to_string(),
                    candidates: vec!["Customer".to_string(), "user".to_string()],
                },
            ],
            breakdowns: vec![
                BreakdownRule {
                    category: "users".to_string(),
                    total: "total".to_string(),
                    parts: vec!["active".to_string(), "inactive".to_string()],
                },
                BreakdownRule {
                    category: "subscribers".to_string(),
                    total: "total".to_string(),
                    parts: vec!["active".to_string(), "unsubscribed".to_string()],
                },
            ],
        }
    }
}

impl AdminConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| AdminError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AdminError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.metric_timeout_ms == 0 {
            return Err(AdminError::Config("metric_timeout_ms must be positive".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(AdminError::Config("request_timeout_ms must be positive".into()));
        }
        if let Some((name, _)) = self.page_size.iter().find(|(_, size)| **size == 0) {
            return Err(AdminError::Config(format!(
                "page_size for \"{name}\" must be positive"
            )));
        }
        if let Some(overlap) = self
            .revenue_statuses
            .iter()
            .find(|s| self.pending_statuses.contains(s))
        {
            return Err(AdminError::Config(format!(
                "status \"{overlap}\" is listed as both revenue and pending"
            )));
        }
        if let Some(rule) = self.candidates.iter().find(|r| r.candidates.is_empty()) {
            return Err(AdminError::Config(format!(
                "candidate rule for {} = \"{}\" has no candidates",
                rule.field, rule.value
            )));
        }
        Ok(())
    }

    pub fn page_size_for(&self, kind: ResourceKind) -> usize {
        self.page_size
            .get(kind.name())
            .copied()
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn metric_timeout(&self) -> Duration {
        Duration::from_millis(self.metric_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
