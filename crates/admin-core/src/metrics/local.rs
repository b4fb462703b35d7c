//! Local recomputation from the records already resident in the store.
//!
//! Figures cover the loaded page only. Divisions with a zero denominator
//! yield 0 instead of NaN.

use std::collections::BTreeMap;

use crate::config::AdminConfig;
use crate::types::{Record, RecordStatus, ResourceKind, Role};

/// Which order statuses count towards which revenue figure.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueRules {
    pub amount_field: String,
    pub revenue_statuses: Vec<RecordStatus>,
    pub pending_statuses: Vec<RecordStatus>,
}

impl RevenueRules {
    pub fn from_config(config: &AdminConfig) -> Self {
        Self {
            amount_field: config.amount_field.clone(),
            revenue_statuses: config.revenue_statuses.clone(),
            pending_statuses: config.pending_statuses.clone(),
        }
    }
}

impl Default for RevenueRules {
    fn default() -> Self {
        Self::from_config(&AdminConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RevenueSummary {
    pub total_revenue: f64,
    pub pending_revenue: f64,
    pub average_order_value: f64,
    /// Orders whose status counts as revenue.
    pub revenue_orders: usize,
}

/// Safe division: 0 when the denominator is 0.
fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

/// Sum order amounts by status bucket. Records with no status or an
/// unreadable amount contribute nothing.
pub fn summarize_revenue(orders: &[Record], rules: &RevenueRules) -> RevenueSummary {
    let mut summary = RevenueSummary::default();
    for order in orders {
        let Some(status) = &order.status else { continue };
        let amount = order.amount(&rules.amount_field).unwrap_or(0.0);
        if rules.revenue_statuses.contains(status) {
            summary.total_revenue += amount;
            summary.revenue_orders += 1;
        } else if rules.pending_statuses.contains(status) {
            summary.pending_revenue += amount;
        }
    }
    summary.average_order_value = ratio(summary.total_revenue, summary.revenue_orders);
    summary
}

fn is_active(record: &Record) -> bool {
    record.is_active.unwrap_or(false) || record.status == Some(RecordStatus::Active)
}

fn is_inactive(record: &Record) -> bool {
    record.is_active == Some(false) || record.status == Some(RecordStatus::Inactive)
}

fn count(records: &[Record], pred: impl Fn(&Record) -> bool) -> f64 {
    records.iter().filter(|&r| pred(r)).count() as f64
}

/// Metrics for one resource kind computed from `records`.
pub fn recompute(kind: ResourceKind, records: &[Record], rules: &RevenueRules) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    out.insert("total".to_string(), records.len() as f64);

    match kind {
        ResourceKind::Users => {
            out.insert("active".to_string(), count(records, is_active));
            out.insert("inactive".to_string(), count(records, |r| !is_active(r)));
            out.insert(
                "admins".to_string(),
                count(records, |r| r.role == Some(Role::Admin)),
            );
        }
        ResourceKind::Orders => {
            let summary = summarize_revenue(records, rules);
            out.insert("totalRevenue".to_string(), summary.total_revenue);
            out.insert("pendingRevenue".to_string(), summary.pending_revenue);
            out.insert("averageOrderValue".to_string(), summary.average_order_value);
            for status in records.iter().filter_map(|r| r.status.as_ref()) {
                *out.entry(status.as_str().to_string()).or_insert(0.0) += 1.0;
            }
        }
        ResourceKind::Coupons => {
            let expired = |r: &Record| r.status == Some(RecordStatus::Expired);
            out.insert("active".to_string(), count(records, |r| is_active(r) && !expired(r)));
            out.insert("expired".to_string(), count(records, expired));
        }
        ResourceKind::Subscribers => {
            let unsubscribed =
                |r: &Record| r.status == Some(RecordStatus::Unsubscribed) || is_inactive(r);
            out.insert("active".to_string(), count(records, |r| !unsubscribed(r)));
            out.insert("unsubscribed".to_string(), count(records, unsubscribed));
        }
    }
    out
}
