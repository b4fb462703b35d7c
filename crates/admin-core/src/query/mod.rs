//! Query layer: the [`Query`] value, patches that edit it, and the
//! [`QueryController`] that turns edits into list requests.

pub mod controller;
pub mod types;

pub use controller::{FetchOutcome, FetchStatus, QueryController, QueryControllerOptions};
pub use types::{total_pages, Query, QueryPatch, SortOrder};
