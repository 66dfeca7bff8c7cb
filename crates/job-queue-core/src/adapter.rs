use async_trait::async_trait;

use crate::error::{JobError, Result};
use crate::job::{Job, JobPayload};
use crate::status::{JobStatus, StatusRecord};
use crate::worker_id::{WorkerId, WorkingOn};

/// Queue operations against the shared store.
///
/// Every call is atomic at call granularity; the pop is the only exclusion
/// primitive in the design, so at most one caller observes a given entry.
#[async_trait]
pub trait QueueAdapter: Send + Sync {
    /// Every queue name currently registered in the store.
    async fn all_queue_names(&self) -> Result<Vec<String>>;

    /// Non-blocking pop of the oldest entry on `queue`.
    async fn reserve(&self, queue: &str) -> Result<Option<Job>>;

    /// Push the job payload and register its queue name.
    async fn enqueue(&self, job: &Job) -> Result<()>;

    /// Rebuild the store connection after a transport-level fault.
    async fn reestablish_connection(&self) -> Result<()>;
}

/// Job status and failure bookkeeping.
#[async_trait]
pub trait JobAdapter: Send + Sync {
    async fn update_status(&self, job: &Job, status: JobStatus) -> Result<()>;

    /// Persist a failure record for the payload's job id.
    async fn create_failure(
        &self,
        payload: &JobPayload,
        error: &JobError,
        worker: &str,
        queue: &str,
    ) -> Result<()>;

    /// Optional status-query capability.
    ///
    /// Adapters opt in by returning `Some`; callers must treat `None` as
    /// "unsupported", never probe for methods structurally.
    fn status_query(&self) -> Option<&dyn StatusQueryAdapter> {
        None
    }
}

/// Capability marker for adapters that can read status records back.
#[async_trait]
pub trait StatusQueryAdapter: Send + Sync {
    /// `Ok(None)` means no record exists, which is distinct from
    /// unsupported.
    async fn status(&self, job_id: &str) -> Result<Option<StatusRecord>>;
}

/// Fleet-directory operations: membership, activity snapshots and counters.
#[async_trait]
pub trait WorkerAdapter: Send + Sync {
    async fn all_worker_ids(&self) -> Result<Vec<String>>;

    async fn register_worker(&self, id: &WorkerId) -> Result<()>;

    /// Remove a worker's registration along with its counters and
    /// working-on snapshot. Takes a raw id so dead foreign entries can be
    /// pruned.
    async fn unregister_worker(&self, id: &str) -> Result<()>;

    async fn set_working_on(&self, id: &WorkerId, snapshot: &WorkingOn) -> Result<()>;

    async fn clear_working_on(&self, id: &WorkerId) -> Result<()>;

    async fn increase_processed_count(&self) -> Result<()>;

    async fn increase_worker_processed_count(&self, id: &WorkerId) -> Result<()>;

    /// Rebuild the store connection after a transport-level fault.
    async fn reestablish_connection(&self) -> Result<()>;
}
