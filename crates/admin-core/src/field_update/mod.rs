//! Single-field saves: payload construction, the candidate table, and the
//! bounded retrier.

pub mod candidates;
pub mod payload;
pub mod retrier;

pub use candidates::{CandidateTable, FieldUpdateAttempt};
pub use payload::build_payload;
pub use retrier::{FieldSaveOutcome, FieldUpdateRetrier, FieldUpdateRetrierOptions};
