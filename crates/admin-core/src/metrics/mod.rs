//! Dashboard metrics: snapshot types, local recomputation, breakdown
//! cross-validation, and the tiered aggregator.

pub mod aggregator;
pub mod local;
pub mod reconcile;
pub mod types;

pub use aggregator::{MetricsAggregator, MetricsAggregatorOptions};
pub use local::{recompute, summarize_revenue, RevenueRules, RevenueSummary};
pub use reconcile::reconcile_breakdowns;
pub use types::{MetricProbe, MetricValue, MetricsSnapshot, MetricsStatus};
