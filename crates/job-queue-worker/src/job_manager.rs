use std::sync::Arc;

use tracing::{debug, error};

use job_queue_core::{
    Job, JobAdapter, JobError, JobStatus, QueueAdapter, Result, StatusRecord, StoreError,
};

use crate::events::{EventBus, WorkerEvent};
use crate::handler::HandlerResolver;

/// Owns the job lifecycle: resolve the handler, run it, update status,
/// classify failures and record them.
///
/// All job-body errors are contained here and converted to status and
/// failure-record side effects; only store faults propagate to the caller.
pub struct JobManager {
    job_adapter: Arc<dyn JobAdapter>,
    queue_adapter: Arc<dyn QueueAdapter>,
    resolver: Arc<dyn HandlerResolver>,
    events: Arc<EventBus>,
}

impl JobManager {
    pub fn new(
        job_adapter: Arc<dyn JobAdapter>,
        queue_adapter: Arc<dyn QueueAdapter>,
        resolver: Arc<dyn HandlerResolver>,
        events: Arc<EventBus>,
    ) -> Self {
        JobManager {
            job_adapter,
            queue_adapter,
            resolver,
            events,
        }
    }

    pub async fn run(&self, job: &Job) -> Result<()> {
        self.events.emit(&WorkerEvent::BeforeExecute { job });

        match self.perform(job).await {
            Ok(()) => self.update_status(job, JobStatus::Complete).await,
            Err(JobError::Skip) => {
                // Voluntary opt-out: neither success nor failure, and no
                // status transition is written.
                debug!(job_id = %job.id(), "job declined to run");
                Ok(())
            }
            Err(err) => {
                error!(
                    job_id = %job.id(),
                    class = %job.class(),
                    %err,
                    "job failed"
                );
                self.fail_job(job, &err).await
            }
        }
    }

    async fn perform(&self, job: &Job) -> std::result::Result<(), JobError> {
        let handler = self
            .resolver
            .resolve(job.class())
            .ok_or_else(|| JobError::UnknownClass(job.class().to_string()))?;

        self.events.emit(&WorkerEvent::BeforePerform { job });

        for &hook in handler.legacy_hooks() {
            let missing = match hook {
                "set_up" => handler.as_setup().is_none(),
                "tear_down" => handler.as_tear_down().is_none(),
                _ => true,
            };
            if missing {
                return Err(JobError::LegacyHooks {
                    class: job.class().to_string(),
                    hook,
                });
            }
        }

        if let Some(setup) = handler.as_setup() {
            setup.set_up().await?;
        }

        handler.perform(job.args()).await?;

        if let Some(tear_down) = handler.as_tear_down() {
            tear_down.tear_down().await?;
        }

        self.events.emit(&WorkerEvent::AfterExecute { job });
        Ok(())
    }

    /// Mark a job failed and persist its failure record.
    pub async fn fail_job(&self, job: &Job, error: &JobError) -> Result<()> {
        self.events.emit(&WorkerEvent::OnFailure { job, error });

        self.update_status(job, JobStatus::Failed).await?;

        self.job_adapter
            .create_failure(
                &job.payload(),
                error,
                job.worker().unwrap_or_default(),
                job.queue(),
            )
            .await
    }

    pub async fn update_status(&self, job: &Job, status: JobStatus) -> Result<()> {
        self.job_adapter.update_status(job, status).await
    }

    /// Push the job payload and mark it waiting.
    pub async fn enqueue(&self, job: &Job) -> Result<()> {
        self.queue_adapter.enqueue(job).await?;
        self.update_status(job, JobStatus::Waiting).await
    }

    /// Read a job's status record, if the adapter supports status queries.
    pub async fn get_status(&self, job_id: &str) -> Result<Option<StatusRecord>> {
        match self.job_adapter.status_query() {
            Some(query) => query.status(job_id).await,
            None => Err(StoreError::StatusQueryUnsupported),
        }
    }
}
