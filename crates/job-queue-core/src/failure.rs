use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{source_chain, JobError};
use crate::job::JobPayload;

/// Persisted diagnostic entry describing one job's terminal failure.
///
/// Keyed by job id in the store, retained for [`crate::FAILURE_TTL_SECS`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    pub failed_at: DateTime<Utc>,
    pub payload: JobPayload,
    pub exception: String,
    pub error: String,
    pub backtrace: Vec<String>,
    pub worker: String,
    pub queue: String,
}

impl FailureRecord {
    pub fn new(payload: JobPayload, error: &JobError, worker: &str, queue: &str) -> Self {
        FailureRecord {
            failed_at: Utc::now(),
            exception: error.kind().to_string(),
            error: error.to_string(),
            backtrace: source_chain(error),
            worker: worker.to_string(),
            queue: queue.to_string(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Job;

    #[test]
    fn captures_error_kind_and_message() {
        let job = Job::new("SendEmail", "mail", vec![]);
        let error = JobError::failed("smtp timeout");

        let record = FailureRecord::new(job.payload(), &error, "host:1:mail", "mail");

        assert_eq!(record.exception, "Failed");
        assert_eq!(record.error, "smtp timeout");
        assert_eq!(record.queue, "mail");
        assert_eq!(record.payload.id, job.id());
    }
}
