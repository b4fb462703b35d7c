//! Client-side administration core for paginated remote collections.
//!
//! - [`query`]: query state, debounced fetches, stale-response guard.
//! - [`selection`]: the operator's multi-select.
//! - [`bulk`]: one-request bulk actions with cache reconciliation.
//! - [`field_update`]: single-field saves with a bounded candidate retry.
//! - [`metrics`]: dashboard aggregates with remote, local, and static tiers.
//! - [`store`]: the cached page and total.
//! - [`view`]: wires all of the above for one collection.

pub mod bulk;
pub mod config;
pub mod error;
pub mod field_update;
pub mod metrics;
pub mod query;
pub mod reactive;
pub mod selection;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;
pub mod view;

pub use config::AdminConfig;
pub use error::{AdminError, Result, TransportError};
pub use view::{AdminView, AdminViewOptions};
