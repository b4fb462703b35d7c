//! QueryController: owns the current [`Query`], debounces edits into list
//! requests, and commits only the newest response.
//!
//! Every request is tagged with a generation number when it is issued. A
//! response is committed only if its generation is still the latest one;
//! older responses are dropped without touching the store or the status.
//!
//! Debounced updates run on a spawned `tokio` task, so [`QueryController::update`]
//! must be called from within a runtime.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::error::{AdminError, Result};
use crate::reactive::{EventEmitter, ListEvent, RefreshHook};
use crate::session::SessionGuard;
use crate::store::OptimisticStateStore;
use crate::transport::{wire, with_deadline, ListFetch};

use super::types::{Query, QueryPatch};

// ============================================================================
// Public types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Ready,
    /// Page-level error. The previously committed page stays in the store.
    Failed(String),
}

/// What happened to a request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Committed { generation: u64, total: u64 },
    /// A newer request was issued before this one resolved.
    Superseded { generation: u64 },
}

pub struct QueryControllerOptions {
    pub fetcher: Arc<dyn ListFetch>,
    pub store: Arc<OptimisticStateStore>,
    pub session: SessionGuard,
    pub initial: Query,
    pub debounce: Duration,
    pub request_timeout: Duration,
    /// Awaited after every successful commit.
    pub after_commit: Option<RefreshHook>,
}

// ============================================================================
// Internal state
// ============================================================================

struct ControllerState {
    query: Query,
    generation: u64,
    status: FetchStatus,
    /// Debounce timer that has not fired yet, tagged with its sequence number.
    pending: Option<(u64, JoinHandle<()>)>,
    timer_seq: u64,
}

struct Ticket {
    generation: u64,
    query: Query,
}

struct Shared {
    fetcher: Arc<dyn ListFetch>,
    store: Arc<OptimisticStateStore>,
    session: SessionGuard,
    debounce: Duration,
    request_timeout: Duration,
    after_commit: Option<RefreshHook>,
    state: Mutex<ControllerState>,
    events: EventEmitter<ListEvent>,
}

// ============================================================================
// QueryController
// ============================================================================

/// Cheap to clone; clones share the same query and generation counter.
#[derive(Clone)]
pub struct QueryController {
    shared: Arc<Shared>,
}

impl QueryController {
    pub fn new(options: QueryControllerOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                fetcher: options.fetcher,
                store: options.store,
                session: options.session,
                debounce: options.debounce,
                request_timeout: options.request_timeout,
                after_commit: options.after_commit,
                state: Mutex::new(ControllerState {
                    query: options.initial,
                    generation: 0,
                    status: FetchStatus::Idle,
                    pending: None,
                    timer_seq: 0,
                }),
                events: EventEmitter::new(),
            }),
        }
    }

    pub fn query(&self) -> Query {
        self.shared.state.lock().query.clone()
    }

    pub fn status(&self) -> FetchStatus {
        self.shared.state.lock().status.clone()
    }

    /// Generation of the most recently issued request (0 before any).
    pub fn generation(&self) -> u64 {
        self.shared.state.lock().generation
    }

    pub fn events(&self) -> &EventEmitter<ListEvent> {
        &self.shared.events
    }

    /// Whether a debounce timer is waiting to fire.
    pub fn has_pending(&self) -> bool {
        self.shared
            .state
            .lock()
            .pending
            .as_ref()
            .is_some_and(|(_, h)| !h.is_finished())
    }

    /// Merge `patch` and schedule a fetch after the debounce window. A patch
    /// arriving inside the window restarts it, so a burst of edits produces
    /// one request. Returns `false` (and schedules nothing) when the patch
    /// leaves the query unchanged.
    pub fn update(&self, patch: QueryPatch) -> bool {
        let mut state = self.shared.state.lock();
        if !state.query.apply(&patch) {
            return false;
        }
        if let Some((_, timer)) = state.pending.take() {
            timer.abort();
        }
        state.timer_seq += 1;
        let seq = state.timer_seq;

        let shared = Arc::clone(&self.shared);
        let debounce = self.shared.debounce;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            {
                let mut state = shared.state.lock();
                if state.pending.as_ref().is_some_and(|(id, _)| *id == seq) {
                    state.pending = None;
                }
            }
            let ticket = shared.issue();
            // Failures are recorded in `status` and on the event stream.
            let _ = shared.run(ticket).await;
        });
        state.pending = Some((seq, timer));
        true
    }

    /// Merge `patch` and fetch immediately, skipping the debounce window.
    ///
    /// The request is issued (and its generation assigned) when this method
    /// is called, not when the returned future is first polled.
    pub fn update_now(
        &self,
        patch: QueryPatch,
    ) -> impl Future<Output = Result<FetchOutcome>> + Send + 'static {
        self.shared.state.lock().query.apply(&patch);
        self.refresh()
    }

    /// Re-issue the current query now. Used for the initial load and for the
    /// operator's retry after a page-level error.
    pub fn refresh(&self) -> impl Future<Output = Result<FetchOutcome>> + Send + 'static {
        self.dispose();
        let shared = Arc::clone(&self.shared);
        let ticket = shared.issue();
        async move { shared.run(ticket).await }
    }

    pub fn go_to_page(&self, page: u32) -> bool {
        self.update(QueryPatch::page(page))
    }

    /// Cancel any pending debounce timer. In-flight requests are left to
    /// finish; their results are still subject to the generation check.
    pub fn dispose(&self) {
        if let Some((_, timer)) = self.shared.state.lock().pending.take() {
            timer.abort();
        }
    }
}

impl Shared {
    fn issue(&self) -> Ticket {
        let ticket = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.status = FetchStatus::Loading;
            Ticket {
                generation: state.generation,
                query: state.query.clone(),
            }
        };
        tracing::debug!(
            generation = ticket.generation,
            page = ticket.query.page,
            search = %ticket.query.search,
            "list fetch issued"
        );
        self.events.emit(&ListEvent::Issued {
            generation: ticket.generation,
            query: ticket.query.clone(),
        });
        ticket
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state.lock().generation == generation
    }

    async fn run(&self, ticket: Ticket) -> Result<FetchOutcome> {
        let ctx = self.session.context();
        let response = with_deadline(
            "list fetch",
            self.request_timeout,
            self.fetcher.fetch(&ctx, &ticket.query),
        )
        .await;

        if let Err(err) = &response {
            self.session.observe(err);
        }

        let page = response
            .map_err(AdminError::from)
            .and_then(wire::list_page);

        if !self.is_current(ticket.generation) {
            return Ok(self.discard(ticket.generation));
        }

        match page {
            Ok(page) => {
                let total = page.total;
                let committed = self.store.commit_page(
                    ticket.generation,
                    page.items,
                    total,
                    ticket.query.page_size,
                );
                if !committed {
                    return Ok(self.discard(ticket.generation));
                }
                {
                    let mut state = self.state.lock();
                    if state.generation == ticket.generation {
                        state.status = FetchStatus::Ready;
                    }
                }
                tracing::debug!(generation = ticket.generation, total, "list page committed");
                self.events.emit(&ListEvent::Committed {
                    generation: ticket.generation,
                    total,
                });
                if let Some(hook) = &self.after_commit {
                    hook().await;
                }
                Ok(FetchOutcome::Committed {
                    generation: ticket.generation,
                    total,
                })
            }
            Err(err) => {
                let message = match &err {
                    AdminError::Transport(t) => t.message(),
                    other => other.to_string(),
                };
                {
                    let mut state = self.state.lock();
                    if state.generation == ticket.generation {
                        state.status = FetchStatus::Failed(message.clone());
                    }
                }
                tracing::warn!(generation = ticket.generation, error = %err, "list fetch failed");
                self.events.emit(&ListEvent::Failed {
                    generation: ticket.generation,
                    message,
                });
                Err(err)
            }
        }
    }

    fn discard(&self, generation: u64) -> FetchOutcome {
        tracing::debug!(generation, "discarding superseded list response");
        self.events.emit(&ListEvent::Discarded { generation });
        FetchOutcome::Superseded { generation }
    }
}
