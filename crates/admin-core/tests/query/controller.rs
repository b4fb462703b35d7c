//! QueryController tests: debounce, stale-response guard, and failure
//! handling against mock list collaborators.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;

use admin_core::query::{
    FetchOutcome, FetchStatus, Query, QueryController, QueryControllerOptions, QueryPatch,
};
use admin_core::reactive::{ListEvent, RefreshHook};
use admin_core::session::SessionGuard;
use admin_core::store::OptimisticStateStore;
use admin_core::transport::ListFetch;
use admin_core::{AdminError, TransportError};

use crate::common::*;

// ============================================================================
// Helpers
// ============================================================================

struct Harness {
    controller: QueryController,
    store: Arc<OptimisticStateStore>,
}

fn harness(
    fetcher: Arc<dyn ListFetch>,
    session: SessionGuard,
    debounce: Duration,
    after_commit: Option<RefreshHook>,
) -> Harness {
    let store = Arc::new(OptimisticStateStore::new());
    let controller = QueryController::new(QueryControllerOptions {
        fetcher,
        store: Arc::clone(&store),
        session,
        initial: Query::new(10),
        debounce,
        request_timeout: Duration::from_secs(5),
        after_commit,
    });
    Harness { controller, store }
}

fn simple(fetcher: Arc<dyn ListFetch>) -> Harness {
    harness(fetcher, SessionGuard::default(), Duration::from_millis(30), None)
}

// ============================================================================
// Stale-response guard
// ============================================================================

#[tokio::test]
async fn out_of_order_response_is_discarded() {
    let fetch = Arc::new(GatedListFetch::new());
    let release_a = fetch.gate(1);
    let release_b = fetch.gate(2);
    let h = simple(fetch.clone());

    let a = tokio::spawn(h.controller.refresh());
    let b = tokio::spawn(h.controller.update_now(QueryPatch::page(2)));

    release_b.send(page_body(&["b1", "b2"], 20)).unwrap();
    let b_out = b.await.unwrap().unwrap();
    release_a.send(page_body(&["a1", "a2"], 20)).unwrap();
    let a_out = a.await.unwrap().unwrap();

    assert_eq!(b_out, FetchOutcome::Committed { generation: 2, total: 20 });
    assert_eq!(a_out, FetchOutcome::Superseded { generation: 1 });
    assert_eq!(h.store.page_ids(), vec!["b1", "b2"]);
    assert_eq!(h.store.committed_generation(), Some(2));
    assert_eq!(h.controller.status(), FetchStatus::Ready);
}

#[tokio::test]
async fn stale_failure_does_not_touch_status() {
    let fetch = Arc::new(GatedListFetch::new());
    let release_a = fetch.gate(1);
    let release_b = fetch.gate(2);
    let h = simple(fetch.clone());

    let a = tokio::spawn(h.controller.refresh());
    let b = tokio::spawn(h.controller.update_now(QueryPatch::page(2)));

    release_b.send(page_body(&["b1"], 11)).unwrap();
    b.await.unwrap().unwrap();
    // Dropping the sender fails request A after B has committed.
    drop(release_a);
    let a_out = a.await.unwrap().unwrap();

    assert_eq!(a_out, FetchOutcome::Superseded { generation: 1 });
    assert_eq!(h.controller.status(), FetchStatus::Ready);
}

#[tokio::test]
async fn discarded_response_is_reported_on_event_stream() {
    let fetch = Arc::new(GatedListFetch::new());
    let release_a = fetch.gate(1);
    let release_b = fetch.gate(2);
    let h = simple(fetch.clone());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    h.controller.events().on(move |e: &ListEvent| {
        if let ListEvent::Discarded { generation } = e {
            s.lock().push(*generation);
        }
    });

    let a = tokio::spawn(h.controller.refresh());
    let b = tokio::spawn(h.controller.update_now(QueryPatch::page(2)));
    release_b.send(page_body(&["b1"], 2)).unwrap();
    b.await.unwrap().unwrap();
    release_a.send(page_body(&["a1"], 2)).unwrap();
    a.await.unwrap().unwrap();

    assert_eq!(*seen.lock(), vec![1]);
}

// ============================================================================
// Debounce
// ============================================================================

#[tokio::test]
async fn burst_of_patches_issues_one_fetch() {
    let fetch = Arc::new(MockListFetch::new());
    let h = simple(fetch.clone());

    assert!(h.controller.update(QueryPatch::search("a")));
    assert!(h.controller.update(QueryPatch::search("al")));
    assert!(h.controller.update(QueryPatch::search("ali")));
    assert!(h.controller.has_pending());
    assert!(fetch.calls().is_empty());

    tokio::time::sleep(Duration::from_millis(150)).await;

    let calls = fetch.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].search, "ali");
    assert!(!h.controller.has_pending());
    assert_eq!(h.controller.generation(), 1);
    assert_eq!(h.store.len(), 2);
}

#[tokio::test]
async fn unchanged_patch_schedules_nothing() {
    let fetch = Arc::new(MockListFetch::new());
    let h = simple(fetch.clone());

    assert!(!h.controller.update(QueryPatch::page(1)));
    assert!(!h.controller.has_pending());
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(fetch.calls().is_empty());
}

#[tokio::test]
async fn immediate_refresh_cancels_pending_timer() {
    let fetch = Arc::new(MockListFetch::new());
    let h = simple(fetch.clone());

    h.controller.update(QueryPatch::search("bob"));
    h.controller.refresh().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let calls = fetch.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].search, "bob");
}

#[tokio::test]
async fn dispose_cancels_pending_fetch() {
    let fetch = Arc::new(MockListFetch::new());
    let h = simple(fetch.clone());

    h.controller.update(QueryPatch::filter("role", "admin"));
    h.controller.dispose();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(fetch.calls().is_empty());
}

// ============================================================================
// Query shape
// ============================================================================

#[tokio::test]
async fn filter_change_resets_to_first_page() {
    let fetch = Arc::new(MockListFetch::new());
    let h = simple(fetch.clone());

    h.controller.update_now(QueryPatch::page(3)).await.unwrap();
    h.controller
        .update_now(QueryPatch::filter("status", "pending"))
        .await
        .unwrap();

    let calls = fetch.calls();
    assert_eq!(calls[0].page, 3);
    assert_eq!(calls[1].page, 1);
    assert_eq!(calls[1].filters.get("status").map(String::as_str), Some("pending"));
}

#[tokio::test]
async fn oversized_response_is_truncated_to_page_size() {
    let fetch = Arc::new(MockListFetch::new());
    let ids: Vec<String> = (0..15).map(|i| format!("u{i}")).collect();
    fetch.on_fetch(move |_| {
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        Ok(page_body(&refs, 15))
    });
    let h = simple(fetch.clone());

    h.controller.refresh().await.unwrap();
    assert_eq!(h.store.len(), 10);
    assert_eq!(h.store.total(), 15);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn failure_keeps_previous_page() {
    let fetch = Arc::new(MockListFetch::new());
    let h = simple(fetch.clone());
    h.controller.refresh().await.unwrap();

    fetch.on_fetch(|_| Err(TransportError::server("database unavailable")));
    let err = h.controller.refresh().await.unwrap_err();

    assert!(matches!(err, AdminError::Transport(TransportError::Server { .. })));
    assert_eq!(
        h.controller.status(),
        FetchStatus::Failed("database unavailable".to_string())
    );
    assert_eq!(h.store.page_ids(), vec!["u1", "u2"]);
    assert_eq!(h.store.total(), 2);
}

#[tokio::test]
async fn retry_after_failure_recovers() {
    let fetch = Arc::new(MockListFetch::new());
    fetch.on_fetch(|_| Err(TransportError::server("down")));
    let h = simple(fetch.clone());
    assert!(h.controller.refresh().await.is_err());

    fetch.on_fetch(|_| Ok(page_body(&["x"], 1)));
    h.controller.refresh().await.unwrap();
    assert_eq!(h.controller.status(), FetchStatus::Ready);
    assert_eq!(h.store.page_ids(), vec!["x"]);
}

#[tokio::test]
async fn auth_failure_terminates_session() {
    let fetch = Arc::new(MockListFetch::new());
    fetch.on_fetch(|_| Err(TransportError::auth("token expired")));
    let terminator = RecordingTerminator::new();
    let session = SessionGuard::new(None, Some(terminator.clone()));
    let h = harness(fetch.clone(), session.clone(), Duration::from_millis(30), None);

    let err = h.controller.refresh().await.unwrap_err();
    assert!(err.is_auth());
    assert_eq!(terminator.reasons(), vec!["token expired"]);
    assert!(session.is_terminated());
    // No local retry.
    assert_eq!(fetch.calls().len(), 1);
}

#[tokio::test]
async fn alternate_response_layout_is_a_decode_error() {
    let fetch = Arc::new(MockListFetch::new());
    fetch.on_fetch(|_| Ok(json!({ "data": { "users": [] }, "pagination": { "total": 0 } })));
    let h = simple(fetch.clone());

    let err = h.controller.refresh().await.unwrap_err();
    assert!(matches!(err, AdminError::Decode { what: "list", .. }));
    assert!(!h.store.is_loaded());
}

#[tokio::test]
async fn timeout_fails_the_fetch() {
    struct Hanging;

    #[async_trait::async_trait]
    impl ListFetch for Hanging {
        async fn fetch(
            &self,
            _ctx: &admin_core::session::CallContext,
            _query: &Query,
        ) -> Result<serde_json::Value, TransportError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(page_body(&[], 0))
        }
    }

    let store = Arc::new(OptimisticStateStore::new());
    let controller = QueryController::new(QueryControllerOptions {
        fetcher: Arc::new(Hanging),
        store,
        session: SessionGuard::default(),
        initial: Query::new(10),
        debounce: Duration::from_millis(10),
        request_timeout: Duration::from_millis(20),
        after_commit: None,
    });

    let err = controller.refresh().await.unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(controller.status(), FetchStatus::Failed(_)));
}

// ============================================================================
// Hooks
// ============================================================================

#[tokio::test]
async fn commit_runs_after_commit_hook() {
    let fetch = Arc::new(MockListFetch::new());
    let (hook, count) = counting_hook();
    let h = harness(fetch, SessionGuard::default(), Duration::from_millis(30), Some(hook));

    h.controller.refresh().await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_fetch_skips_hook() {
    let fetch = Arc::new(MockListFetch::new());
    fetch.on_fetch(|_| Err(TransportError::server("down")));
    let (hook, count) = counting_hook();
    let h = harness(fetch, SessionGuard::default(), Duration::from_millis(30), Some(hook));

    let _ = h.controller.refresh().await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
}
