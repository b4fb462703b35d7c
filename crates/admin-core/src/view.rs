//! AdminView: composition root for one administered collection.
//!
//! Owns the store, selection, controller, executor, retrier, and metrics
//! aggregator for a single [`ResourceKind`] and wires the metrics refresh in
//! as the post-commit and post-mutation hook. Nothing here is global; a view
//! is built on mount and dropped on navigation.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;

use crate::bulk::{BulkAction, BulkActionExecutor, BulkActionExecutorOptions, BulkOutcome};
use crate::config::AdminConfig;
use crate::error::Result;
use crate::field_update::{
    CandidateTable, FieldSaveOutcome, FieldUpdateRetrier, FieldUpdateRetrierOptions,
};
use crate::metrics::{
    MetricProbe, MetricsAggregator, MetricsAggregatorOptions, MetricsSnapshot, RevenueRules,
};
use crate::query::{
    total_pages, FetchOutcome, Query, QueryController, QueryControllerOptions, QueryPatch,
};
use crate::reactive::RefreshHook;
use crate::selection::{SelectionSet, SharedSelection};
use crate::session::{CredentialSupplier, SessionGuard, SessionTerminator};
use crate::store::OptimisticStateStore;
use crate::transport::{
    with_deadline, BulkActionTransport, FieldUpdateTransport, ListFetch, RecordDelete,
};
use crate::types::ResourceKind;

pub struct AdminViewOptions {
    pub kind: ResourceKind,
    pub config: AdminConfig,
    pub list: Arc<dyn ListFetch>,
    pub bulk: Arc<dyn BulkActionTransport>,
    pub field_update: Arc<dyn FieldUpdateTransport>,
    pub delete: Arc<dyn RecordDelete>,
    pub metric_probes: Vec<MetricProbe>,
    pub credentials: Option<Arc<dyn CredentialSupplier>>,
    pub terminator: Option<Arc<dyn SessionTerminator>>,
}

pub struct AdminView {
    kind: ResourceKind,
    config: AdminConfig,
    store: Arc<OptimisticStateStore>,
    selection: SharedSelection,
    session: SessionGuard,
    controller: QueryController,
    executor: BulkActionExecutor,
    retrier: FieldUpdateRetrier,
    metrics: Arc<MetricsAggregator>,
    delete: Arc<dyn RecordDelete>,
}

impl AdminView {
    /// Validate the configuration and wire every component. Nothing is
    /// fetched until [`AdminView::load`] or a query update.
    pub fn new(options: AdminViewOptions) -> Result<Self> {
        let AdminViewOptions {
            kind,
            config,
            list,
            bulk,
            field_update,
            delete,
            metric_probes,
            credentials,
            terminator,
        } = options;
        config.validate()?;

        let store = Arc::new(OptimisticStateStore::new());
        let selection = SelectionSet::shared();
        let session = SessionGuard::new(credentials, terminator);

        let metrics = Arc::new(MetricsAggregator::new(MetricsAggregatorOptions {
            kind,
            probes: metric_probes,
            store: Arc::clone(&store),
            session: session.clone(),
            probe_timeout: config.metric_timeout(),
            revenue: RevenueRules::from_config(&config),
            breakdowns: config.breakdowns.clone(),
        }));

        let hook_metrics = Arc::clone(&metrics);
        let refresh_metrics: RefreshHook = Arc::new(move || {
            let metrics = Arc::clone(&hook_metrics);
            async move {
                metrics.refresh().await;
            }
            .boxed()
        });

        let controller = QueryController::new(QueryControllerOptions {
            fetcher: list,
            store: Arc::clone(&store),
            session: session.clone(),
            initial: Query::new(config.page_size_for(kind)),
            debounce: config.debounce(),
            request_timeout: config.request_timeout(),
            after_commit: Some(Arc::clone(&refresh_metrics)),
        });

        let executor = BulkActionExecutor::new(BulkActionExecutorOptions {
            transport: bulk,
            store: Arc::clone(&store),
            selection: Arc::clone(&selection),
            session: session.clone(),
            request_timeout: config.request_timeout(),
            after_mutation: Some(Arc::clone(&refresh_metrics)),
        });

        let retrier = FieldUpdateRetrier::new(FieldUpdateRetrierOptions {
            transport: field_update,
            store: Arc::clone(&store),
            session: session.clone(),
            table: CandidateTable::from_rules(&config.candidates),
            preserved_fields: config.preserved_fields.clone(),
            request_timeout: config.request_timeout(),
            after_mutation: Some(refresh_metrics),
        });

        tracing::debug!(kind = %kind, page_size = config.page_size_for(kind), "admin view created");

        Ok(Self {
            kind,
            config,
            store,
            selection,
            session,
            controller,
            executor,
            retrier,
            metrics,
            delete,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<OptimisticStateStore> {
        &self.store
    }

    pub fn selection(&self) -> SharedSelection {
        Arc::clone(&self.selection)
    }

    pub fn controller(&self) -> &QueryController {
        &self.controller
    }

    pub fn metrics(&self) -> &Arc<MetricsAggregator> {
        &self.metrics
    }

    pub fn session(&self) -> &SessionGuard {
        &self.session
    }

    pub fn metrics_snapshot(&self) -> Option<MetricsSnapshot> {
        self.metrics.snapshot()
    }

    /// Page count for the committed total.
    pub fn total_pages(&self) -> u32 {
        total_pages(self.store.total(), self.controller.query().page_size)
    }

    // -----------------------------------------------------------------------
    // Query
    // -----------------------------------------------------------------------

    /// Initial fetch on mount.
    pub fn load(&self) -> impl Future<Output = Result<FetchOutcome>> + Send + 'static {
        self.controller.refresh()
    }

    /// Debounced query edit.
    pub fn update_query(&self, patch: QueryPatch) -> bool {
        self.controller.update(patch)
    }

    /// Retry after a page-level error.
    pub fn refresh(&self) -> impl Future<Output = Result<FetchOutcome>> + Send + 'static {
        self.controller.refresh()
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn toggle(&self, id: &str) -> bool {
        self.selection.lock().toggle(id)
    }

    /// Header checkbox over the currently loaded page.
    pub fn select_all_on_page(&self) -> bool {
        let page_ids = self.store.page_ids();
        self.selection.lock().select_all_on_page(&page_ids)
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.lock().ids()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Apply `actions` to the current selection in one request.
    pub async fn bulk(&self, actions: Vec<BulkAction>) -> Result<BulkOutcome> {
        self.executor.execute_on_selection(actions).await
    }

    pub async fn save_field(&self, id: &str, field: &str, value: Value) -> Result<FieldSaveOutcome> {
        self.retrier.save(id, field, value).await
    }

    /// Delete one record. On success the record leaves the cache, the
    /// selection is cleared, and metrics are refreshed; on failure nothing
    /// changes.
    pub async fn delete_one(&self, id: &str) -> Result<()> {
        let ctx = self.session.context();
        with_deadline(
            "delete",
            self.config.request_timeout(),
            self.delete.delete(&ctx, id),
        )
        .await
        .inspect_err(|err| {
            self.session.observe(err);
            tracing::warn!(id, error = %err, "delete rejected");
        })?;

        self.store.remove(&[id.to_string()]);
        self.selection.lock().clear();
        tracing::info!(kind = %self.kind, id, "record deleted");
        self.metrics.refresh().await;
        Ok(())
    }
}
