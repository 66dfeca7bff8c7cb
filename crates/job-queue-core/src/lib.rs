mod adapter;
mod error;
mod failure;
mod job;
pub mod memory;
mod status;
mod worker_id;

pub use adapter::{JobAdapter, QueueAdapter, StatusQueryAdapter, WorkerAdapter};
pub use error::{source_chain, JobError, Result, StoreError};
pub use failure::FailureRecord;
pub use job::{Job, JobPayload};
pub use memory::MemoryStore;
pub use status::{JobStatus, StatusRecord};
pub use worker_id::{WorkerId, WorkingOn};

/// Queue-name token that expands to every queue known to the store.
pub const WILDCARD_QUEUE: &str = "*";

/// Retention for failure records, in seconds.
pub const FAILURE_TTL_SECS: u64 = 14 * 3600;

/// Retention for terminal (failed/complete) status entries, in seconds.
pub const TERMINAL_STATUS_TTL_SECS: u64 = 24 * 3600;
