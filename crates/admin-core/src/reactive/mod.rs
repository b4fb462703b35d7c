//! Reactive plumbing: typed listeners for the render layer and the
//! post-mutation refresh hook.
//!
//! - [`event_emitter`]: [`EventEmitter<T>`].
//! - [`event`]: [`StoreEvent`] and [`ListEvent`].

pub mod event;
pub mod event_emitter;

use std::sync::Arc;

use futures::future::BoxFuture;

pub use event::{ListEvent, StoreEvent};
pub use event_emitter::{EventEmitter, ListenerId};

/// Awaited after a list commit or a successful mutation. The composition
/// root wires this to the metrics refresh.
pub type RefreshHook = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;
