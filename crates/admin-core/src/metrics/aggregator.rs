//! MetricsAggregator: dashboard figures with a three-tier fallback.
//!
//! 1. Remote: every probe runs concurrently, each under its own timeout. A
//!    failed probe contributes its default; the others still count. Defaults
//!    are filled in after cross-validation, so they never correct a total.
//! 2. Local: when no probe answered, recompute from the loaded page.
//! 3. Static: when nothing is loaded either, every key is zero.
//!
//! `refresh` never fails. The tier that produced a snapshot is recorded in
//! its `status`.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;

use crate::config::BreakdownRule;
use crate::error::{AdminError, Result};
use crate::reactive::EventEmitter;
use crate::session::SessionGuard;
use crate::store::OptimisticStateStore;
use crate::transport::{wire, with_deadline};
use crate::types::ResourceKind;

use super::local::{recompute, RevenueRules};
use super::reconcile::reconcile_breakdowns;
use super::types::{MetricProbe, MetricValue, MetricsSnapshot, MetricsStatus};

pub struct MetricsAggregatorOptions {
    pub kind: ResourceKind,
    pub probes: Vec<MetricProbe>,
    pub store: Arc<OptimisticStateStore>,
    pub session: SessionGuard,
    pub probe_timeout: Duration,
    pub revenue: RevenueRules,
    pub breakdowns: Vec<BreakdownRule>,
}

struct AggregatorState {
    snapshot: Option<MetricsSnapshot>,
    /// Sequence of the refresh that produced `snapshot`.
    committed: u64,
    issued: u64,
}

pub struct MetricsAggregator {
    kind: ResourceKind,
    probes: Vec<MetricProbe>,
    store: Arc<OptimisticStateStore>,
    session: SessionGuard,
    probe_timeout: Duration,
    revenue: RevenueRules,
    breakdowns: Vec<BreakdownRule>,
    state: Mutex<AggregatorState>,
    events: EventEmitter<MetricsSnapshot>,
}

impl MetricsAggregator {
    pub fn new(options: MetricsAggregatorOptions) -> Self {
        Self {
            kind: options.kind,
            probes: options.probes,
            store: options.store,
            session: options.session,
            probe_timeout: options.probe_timeout,
            revenue: options.revenue,
            breakdowns: options.breakdowns,
            state: Mutex::new(AggregatorState {
                snapshot: None,
                committed: 0,
                issued: 0,
            }),
            events: EventEmitter::new(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Latest committed snapshot, `None` before the first refresh.
    pub fn snapshot(&self) -> Option<MetricsSnapshot> {
        self.state.lock().snapshot.clone()
    }

    pub fn events(&self) -> &EventEmitter<MetricsSnapshot> {
        &self.events
    }

    /// Recompute every figure. A refresh that finishes after a newer one has
    /// already committed is dropped and the newer snapshot is returned.
    pub async fn refresh(&self) -> MetricsSnapshot {
        let seq = {
            let mut state = self.state.lock();
            state.issued += 1;
            state.issued
        };

        let (mut snapshot, failed) = match self.remote_tier().await {
            Some(remote) => remote,
            None => match self.local_tier() {
                Ok(snapshot) => (snapshot, Vec::new()),
                Err(err) => {
                    tracing::warn!(kind = %self.kind, error = %err, "local metrics unavailable; using static defaults");
                    (self.static_tier(), Vec::new())
                }
            },
        };
        reconcile_breakdowns(&mut snapshot, &self.breakdowns);
        for probe in failed {
            snapshot.set_default(&probe.category, &probe.key, probe.default);
        }
        snapshot.fill_missing(self.kind);

        self.commit(seq, snapshot)
    }

    fn commit(&self, seq: u64, snapshot: MetricsSnapshot) -> MetricsSnapshot {
        {
            let mut state = self.state.lock();
            if seq < state.committed {
                tracing::debug!(seq, committed = state.committed, "discarding superseded metrics refresh");
                return state.snapshot.clone().unwrap_or(snapshot);
            }
            state.committed = seq;
            state.snapshot = Some(snapshot.clone());
        }
        self.events.emit(&snapshot);
        snapshot
    }

    // -----------------------------------------------------------------------
    // Tiers
    // -----------------------------------------------------------------------

    /// Received values plus the probes that failed. `None` when there are no
    /// probes or every probe failed.
    async fn remote_tier(&self) -> Option<(MetricsSnapshot, Vec<&MetricProbe>)> {
        if self.probes.is_empty() {
            return None;
        }

        let ctx = self.session.context();
        let calls = self.probes.iter().map(|probe| {
            let ctx = &ctx;
            async move {
                match with_deadline("metric probe", self.probe_timeout, probe.endpoint.fetch(ctx)).await {
                    Ok(body) => wire::metric_value(body),
                    Err(err) => {
                        self.session.observe(&err);
                        Err(AdminError::from(err))
                    }
                }
            }
        });
        let results: Vec<Result<MetricValue>> = join_all(calls).await;

        let mut snapshot = MetricsSnapshot::default();
        let mut failed = Vec::new();
        for (probe, result) in self.probes.iter().zip(results) {
            match result {
                Ok(MetricValue::Scalar(value)) => snapshot.set(&probe.category, &probe.key, value),
                Ok(MetricValue::Breakdown(parts)) => {
                    for (key, value) in parts {
                        snapshot.set(&probe.category, &key, value);
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        category = %probe.category,
                        key = %probe.key,
                        timed_out = err.is_timeout(),
                        error = %err,
                        "metric probe failed; using default"
                    );
                    failed.push(probe);
                }
            }
        }

        if failed.len() == self.probes.len() {
            tracing::warn!(kind = %self.kind, probes = failed.len(), "every metric probe failed; recomputing locally");
            return None;
        }
        if !failed.is_empty() {
            snapshot.status = Some(MetricsStatus::Partial);
        }
        Some((snapshot, failed))
    }

    fn local_tier(&self) -> Result<MetricsSnapshot> {
        if !self.store.is_loaded() {
            return Err(AdminError::NoResidentData);
        }
        let records = self.store.records();
        let mut snapshot = MetricsSnapshot::default();
        snapshot
            .categories
            .insert(self.kind.name().to_string(), recompute(self.kind, &records, &self.revenue));
        snapshot.status = Some(MetricsStatus::LocalApproximation);
        tracing::debug!(kind = %self.kind, records = records.len(), "metrics recomputed from loaded page");
        Ok(snapshot)
    }

    fn static_tier(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::zeroed(self.kind);
        snapshot.status = Some(MetricsStatus::StaticDefaults);
        snapshot
    }
}
