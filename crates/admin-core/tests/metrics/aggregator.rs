//! MetricsAggregator tests: settle-all remote tier, per-probe timeouts,
//! fallback tiers, and breakdown cross-validation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::json;

use admin_core::config::AdminConfig;
use admin_core::metrics::{
    MetricProbe, MetricsAggregator, MetricsAggregatorOptions, MetricsSnapshot, MetricsStatus,
    RevenueRules,
};
use admin_core::session::SessionGuard;
use admin_core::store::OptimisticStateStore;
use admin_core::types::{Record, ResourceKind};
use admin_core::TransportError;

use crate::common::*;

fn aggregator(
    kind: ResourceKind,
    probes: Vec<MetricProbe>,
    store: Arc<OptimisticStateStore>,
    session: SessionGuard,
) -> MetricsAggregator {
    MetricsAggregator::new(MetricsAggregatorOptions {
        kind,
        probes,
        store,
        session,
        probe_timeout: Duration::from_millis(50),
        revenue: RevenueRules::default(),
        breakdowns: AdminConfig::default().breakdowns,
    })
}

fn loaded_orders() -> Arc<OptimisticStateStore> {
    let store = Arc::new(OptimisticStateStore::new());
    store.commit_page(
        1,
        vec![
            Record::new("o1").with_status("pending").with_field("amount", 100),
            Record::new("o2").with_status("shipped").with_field("amount", 200),
            Record::new("o3").with_status("delivered").with_field("amount", 300),
        ],
        3,
        10,
    );
    store
}

// ============================================================================
// Remote tier
// ============================================================================

#[tokio::test]
async fn all_probes_answering_is_not_degraded() {
    let probes = vec![
        MetricProbe::new("users", "total", MockMetric::ok(json!(20))),
        MetricProbe::new("users", "admins", MockMetric::ok(json!(2))),
    ];
    let agg = aggregator(
        ResourceKind::Users,
        probes,
        Arc::new(OptimisticStateStore::new()),
        SessionGuard::default(),
    );

    let snapshot = agg.refresh().await;

    assert_eq!(snapshot.status, None);
    assert_eq!(snapshot.get("users", "total"), Some(20.0));
    assert_eq!(snapshot.get("users", "admins"), Some(2.0));
    // Keys nobody reported read as zero.
    assert_eq!(snapshot.get("users", "active"), Some(0.0));
}

#[tokio::test]
async fn slow_probe_times_out_without_blocking_others() {
    let slow = MockMetric::slow(json!(999), Duration::from_millis(500));
    let probes = vec![
        MetricProbe::new("orders", "total", MockMetric::ok(json!(42))),
        MetricProbe::new("orders", "totalRevenue", slow.clone()).with_default(-1.0),
    ];
    let agg = aggregator(
        ResourceKind::Orders,
        probes,
        Arc::new(OptimisticStateStore::new()),
        SessionGuard::default(),
    );

    let started = Instant::now();
    let snapshot = agg.refresh().await;

    assert!(started.elapsed() < Duration::from_millis(400));
    assert_eq!(slow.calls(), 1);
    assert_eq!(snapshot.status, Some(MetricsStatus::Partial));
    assert_eq!(snapshot.get("orders", "total"), Some(42.0));
    assert_eq!(snapshot.get("orders", "totalRevenue"), Some(-1.0));
}

#[tokio::test]
async fn probes_run_concurrently() {
    let probes = vec![
        MetricProbe::new("coupons", "total", MockMetric::slow(json!(5), Duration::from_millis(100))),
        MetricProbe::new("coupons", "active", MockMetric::slow(json!(3), Duration::from_millis(100))),
        MetricProbe::new("coupons", "expired", MockMetric::slow(json!(2), Duration::from_millis(100))),
    ];
    let agg = MetricsAggregator::new(MetricsAggregatorOptions {
        kind: ResourceKind::Coupons,
        probes,
        store: Arc::new(OptimisticStateStore::new()),
        session: SessionGuard::default(),
        probe_timeout: Duration::from_millis(500),
        revenue: RevenueRules::default(),
        breakdowns: Vec::new(),
    });

    let started = Instant::now();
    let snapshot = agg.refresh().await;

    assert!(started.elapsed() < Duration::from_millis(250));
    assert_eq!(snapshot.status, None);
    assert_eq!(snapshot.get("coupons", "expired"), Some(2.0));
}

#[tokio::test]
async fn mismatched_total_is_replaced_by_breakdown_sum() {
    let probes = vec![MetricProbe::new(
        "users",
        "total",
        MockMetric::ok(json!({ "total": 24, "active": 10, "inactive": 10 })),
    )];
    let agg = aggregator(
        ResourceKind::Users,
        probes,
        Arc::new(OptimisticStateStore::new()),
        SessionGuard::default(),
    );

    let snapshot = agg.refresh().await;
    assert_eq!(snapshot.get("users", "total"), Some(20.0));
    assert_eq!(snapshot.status, None);
}

#[tokio::test]
async fn failed_breakdown_part_does_not_correct_reported_total() {
    let probes = vec![
        MetricProbe::new("users", "total", MockMetric::ok(json!(24))),
        MetricProbe::new("users", "active", MockMetric::ok(json!(10))),
        MetricProbe::new(
            "users",
            "inactive",
            MockMetric::failing(TransportError::server("503")),
        ),
    ];
    let agg = aggregator(
        ResourceKind::Users,
        probes,
        Arc::new(OptimisticStateStore::new()),
        SessionGuard::default(),
    );

    let snapshot = agg.refresh().await;

    assert_eq!(snapshot.status, Some(MetricsStatus::Partial));
    assert_eq!(snapshot.get("users", "total"), Some(24.0));
    assert_eq!(snapshot.get("users", "active"), Some(10.0));
    assert_eq!(snapshot.get("users", "inactive"), Some(0.0));
}

#[tokio::test]
async fn malformed_probe_body_counts_as_failure() {
    let probes = vec![
        MetricProbe::new("subscribers", "total", MockMetric::ok(json!("lots"))),
        MetricProbe::new("subscribers", "active", MockMetric::ok(json!(7))),
    ];
    let agg = aggregator(
        ResourceKind::Subscribers,
        probes,
        Arc::new(OptimisticStateStore::new()),
        SessionGuard::default(),
    );

    let snapshot = agg.refresh().await;
    assert_eq!(snapshot.status, Some(MetricsStatus::Partial));
    assert_eq!(snapshot.get("subscribers", "total"), Some(0.0));
}

// ============================================================================
// Fallback tiers
// ============================================================================

#[tokio::test]
async fn failed_remote_tier_recomputes_from_loaded_page() {
    let probes = vec![
        MetricProbe::new("orders", "totalRevenue", MockMetric::failing(TransportError::server("503"))),
        MetricProbe::new("orders", "total", MockMetric::slow(json!(1), Duration::from_secs(2))),
    ];
    let agg = aggregator(ResourceKind::Orders, probes, loaded_orders(), SessionGuard::default());

    let snapshot = agg.refresh().await;

    assert_eq!(snapshot.status, Some(MetricsStatus::LocalApproximation));
    assert_eq!(snapshot.get("orders", "total"), Some(3.0));
    assert_eq!(snapshot.get("orders", "totalRevenue"), Some(500.0));
    assert_eq!(snapshot.get("orders", "pendingRevenue"), Some(100.0));
    assert_eq!(snapshot.get("orders", "averageOrderValue"), Some(250.0));
}

#[tokio::test]
async fn no_probes_goes_straight_to_local() {
    let agg = aggregator(ResourceKind::Orders, Vec::new(), loaded_orders(), SessionGuard::default());
    let snapshot = agg.refresh().await;
    assert_eq!(snapshot.status, Some(MetricsStatus::LocalApproximation));
}

#[tokio::test]
async fn nothing_loaded_falls_back_to_static_defaults() {
    let probes = vec![MetricProbe::new(
        "users",
        "total",
        MockMetric::failing(TransportError::server("down")),
    )];
    let agg = aggregator(
        ResourceKind::Users,
        probes,
        Arc::new(OptimisticStateStore::new()),
        SessionGuard::default(),
    );

    let snapshot = agg.refresh().await;

    let mut expected = MetricsSnapshot::zeroed(ResourceKind::Users);
    expected.status = Some(MetricsStatus::StaticDefaults);
    assert_eq!(snapshot, expected);
    assert!(snapshot.is_degraded());
}

#[tokio::test]
async fn auth_failure_on_probe_terminates_session() {
    let terminator = RecordingTerminator::new();
    let probes = vec![MetricProbe::new(
        "users",
        "total",
        MockMetric::failing(TransportError::auth("expired")),
    )];
    let agg = aggregator(
        ResourceKind::Users,
        probes,
        Arc::new(OptimisticStateStore::new()),
        SessionGuard::new(None, Some(terminator.clone())),
    );

    agg.refresh().await;
    assert_eq!(terminator.reasons(), vec!["expired"]);
}

// ============================================================================
// Snapshot publication
// ============================================================================

#[tokio::test]
async fn refresh_publishes_snapshot() {
    let agg = aggregator(ResourceKind::Orders, Vec::new(), loaded_orders(), SessionGuard::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    agg.events().on(move |snap: &MetricsSnapshot| {
        s.lock().push(snap.get("orders", "total"));
    });

    assert!(agg.snapshot().is_none());
    agg.refresh().await;

    assert_eq!(*seen.lock(), vec![Some(3.0)]);
    assert_eq!(agg.snapshot().and_then(|s| s.get("orders", "total")), Some(3.0));
}
