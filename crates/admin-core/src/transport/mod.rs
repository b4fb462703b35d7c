pub mod types;
pub mod wire;

pub use types::{
    with_deadline, BulkActionTransport, FieldUpdateTransport, ListFetch, MetricEndpoint,
    RecordDelete,
};
