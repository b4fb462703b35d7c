//! OptimisticStateStore: the cached page of records and the collection
//! total.
//!
//! # Threading model
//!
//! One writer role (controller, executor, retrier) and many readers (render
//! layer). Every write takes the `state` lock once, applies the whole change,
//! releases the lock, and only then emits a [`StoreEvent`], so listeners may
//! read back from the store inside their callback.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::bulk::BulkAction;
use crate::reactive::{EventEmitter, StoreEvent};
use crate::types::Record;

struct StoreState {
    records: Vec<Record>,
    total: u64,
    /// Generation of the list response currently held, `None` before the
    /// first commit.
    generation: Option<u64>,
}

pub struct OptimisticStateStore {
    state: Mutex<StoreState>,
    events: EventEmitter<StoreEvent>,
}

impl OptimisticStateStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                records: Vec::new(),
                total: 0,
                generation: None,
            }),
            events: EventEmitter::new(),
        }
    }

    pub fn events(&self) -> &EventEmitter<StoreEvent> {
        &self.events
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn records(&self) -> Vec<Record> {
        self.state.lock().records.clone()
    }

    /// IDs on the currently loaded page, in display order.
    pub fn page_ids(&self) -> Vec<String> {
        self.state.lock().records.iter().map(|r| r.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<Record> {
        self.state.lock().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn total(&self) -> u64 {
        self.state.lock().total
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any list response has been committed yet.
    pub fn is_loaded(&self) -> bool {
        self.state.lock().generation.is_some()
    }

    pub fn committed_generation(&self) -> Option<u64> {
        self.state.lock().generation
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Replace the cached page with a list response.
    ///
    /// Responses older than the one already held are refused (returns
    /// `false`). Items beyond `page_size` are dropped so the loaded page never
    /// exceeds one page.
    pub fn commit_page(
        &self,
        generation: u64,
        mut items: Vec<Record>,
        total: u64,
        page_size: usize,
    ) -> bool {
        let event = {
            let mut state = self.state.lock();
            if state.generation.is_some_and(|held| held > generation) {
                return false;
            }
            if items.len() > page_size {
                tracing::warn!(
                    generation,
                    received = items.len(),
                    page_size,
                    "list response exceeded page size; truncating"
                );
                items.truncate(page_size);
            }
            state.records = items;
            state.total = total;
            state.generation = Some(generation);
            StoreEvent::Committed {
                generation,
                ids: state.records.iter().map(|r| r.id.clone()).collect(),
                total,
            }
        };
        self.events.emit(&event);
        true
    }

    /// Apply `f` to the cached record with `id`. Returns `false` when the
    /// record is not resident.
    pub fn patch(&self, id: &str, f: impl FnOnce(&mut Record)) -> bool {
        let found = {
            let mut state = self.state.lock();
            match state.records.iter_mut().find(|r| r.id == id) {
                Some(record) => {
                    f(record);
                    true
                }
                None => false,
            }
        };
        if found {
            self.events.emit(&StoreEvent::Patched {
                ids: vec![id.to_string()],
            });
        }
        found
    }

    /// Swap in the server's copy of a record. Records not on the current page
    /// are left alone.
    pub fn replace(&self, record: Record) -> bool {
        let id = record.id.clone();
        self.patch(&id, move |slot| *slot = record)
    }

    /// Drop records from the cache and decrement the total accordingly.
    /// Returns how many were removed.
    pub fn remove(&self, ids: &[String]) -> usize {
        let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let removed: Vec<String> = {
            let mut state = self.state.lock();
            let mut removed = Vec::new();
            state.records.retain(|r| {
                if targets.contains(r.id.as_str()) {
                    removed.push(r.id.clone());
                    false
                } else {
                    true
                }
            });
            state.total = state.total.saturating_sub(removed.len() as u64);
            removed
        };
        let count = removed.len();
        if count > 0 {
            self.events.emit(&StoreEvent::Removed { ids: removed });
        }
        count
    }

    /// Apply bulk actions, in order, to every cached record whose id is in
    /// `ids`. A delete action removes the record. Returns `(patched, removed)`.
    pub fn apply_actions(&self, ids: &[String], actions: &[BulkAction]) -> (usize, usize) {
        let targets: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let deletes = actions.iter().any(BulkAction::is_delete);

        let (patched, removed) = {
            let mut state = self.state.lock();
            let mut patched = Vec::new();
            let mut removed = Vec::new();
            state.records.retain_mut(|record| {
                if !targets.contains(record.id.as_str()) {
                    return true;
                }
                if deletes {
                    removed.push(record.id.clone());
                    return false;
                }
                for action in actions {
                    action.apply_to(record);
                }
                patched.push(record.id.clone());
                true
            });
            state.total = state.total.saturating_sub(removed.len() as u64);
            (patched, removed)
        };

        let counts = (patched.len(), removed.len());
        if !patched.is_empty() {
            self.events.emit(&StoreEvent::Patched { ids: patched });
        }
        if !removed.is_empty() {
            self.events.emit(&StoreEvent::Removed { ids: removed });
        }
        counts
    }
}

impl Default for OptimisticStateStore {
    fn default() -> Self {
        Self::new()
    }
}
