//! Bulk mutation: the action vocabulary and the single-request executor.

pub mod action;
pub mod executor;

pub use action::BulkAction;
pub use executor::{BulkActionExecutor, BulkActionExecutorOptions, BulkActionRequest, BulkOutcome};
