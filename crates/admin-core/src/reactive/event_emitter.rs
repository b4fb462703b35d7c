//! EventEmitter<T>: typed synchronous pub/sub used by the store, the query
//! controller, and the metrics aggregator to notify the render layer.
//!
//! Emission works on a snapshot of the listener list taken under the lock, so
//! listeners may call `on()`/`off()` from inside a callback without
//! deadlocking. A listener that panics is logged and skipped; the remaining
//! listeners still run and the writer that emitted is unaffected.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// A listener ID returned by [`EventEmitter::on`] that can be passed to
/// [`EventEmitter::off`] to remove the listener.
pub type ListenerId = u64;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Typed synchronous event emitter.
///
/// `T` is the event payload type. All methods take `&self`; the internal
/// `parking_lot::Mutex` is never held while a listener runs.
pub struct EventEmitter<T> {
    listeners: Mutex<Vec<(ListenerId, Listener<T>)>>,
    next_id: AtomicU64,
}

impl<T> EventEmitter<T> {
    /// Create a new, empty emitter.
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `callback` and return its [`ListenerId`].
    ///
    /// The callback is called with a shared reference to each emitted event.
    pub fn on(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove the listener identified by `id`.
    ///
    /// Does nothing if `id` is not present, so it is safe to call twice.
    pub fn off(&self, id: ListenerId) {
        self.listeners.lock().retain(|(lid, _)| *lid != id);
    }

    /// Emit `event` to every listener registered when the call starts.
    ///
    /// Listeners added during this round are first called on the next emit.
    /// A panicking listener is logged and skipped.
    pub fn emit(&self, event: &T) {
        let snapshot: Vec<(ListenerId, Listener<T>)> = self
            .listeners
            .lock()
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();

        for (id, cb) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| cb(event))).is_err() {
                tracing::warn!(listener = id, "event listener panicked");
            }
        }
    }

    /// Number of currently registered listeners.
    pub fn size(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}
