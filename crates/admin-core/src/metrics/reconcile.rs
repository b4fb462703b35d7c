//! Cross-validation of aggregate totals against their breakdowns.

use crate::config::BreakdownRule;

use super::types::MetricsSnapshot;

/// For each rule whose total and every part are present, overwrite a
/// mismatched total with the sum of the parts. Returns how many totals were
/// corrected.
pub fn reconcile_breakdowns(snapshot: &mut MetricsSnapshot, rules: &[BreakdownRule]) -> usize {
    let mut corrected = 0;
    for rule in rules {
        let Some(reported) = snapshot.get(&rule.category, &rule.total) else {
            continue;
        };
        let parts: Option<Vec<f64>> = rule
            .parts
            .iter()
            .map(|part| snapshot.get(&rule.category, part))
            .collect();
        let Some(parts) = parts else { continue };
        if parts.is_empty() {
            continue;
        }
        let sum: f64 = parts.iter().sum();
        if (sum - reported).abs() > f64::EPSILON {
            tracing::warn!(
                category = %rule.category,
                total = %rule.total,
                reported,
                sum,
                "aggregate total disagrees with breakdown; using breakdown sum"
            );
            snapshot.set(&rule.category, &rule.total, sum);
            corrected += 1;
        }
    }
    corrected
}
