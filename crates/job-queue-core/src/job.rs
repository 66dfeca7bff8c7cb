use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Canonical serializable projection of a job, used for queue entries and
/// failure records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub queue: String,
    pub id: String,
    pub class: String,
    pub args: Vec<Value>,
}

/// A unit of work pulled from a queue.
///
/// Immutable once enqueued, except for the worker-assignment field set when
/// a worker reserves the job for execution.
#[derive(Debug, Clone)]
pub struct Job {
    id: String,
    class: String,
    args: Vec<Value>,
    queue: String,
    worker: Option<String>,
}

impl Job {
    pub fn new(class: impl Into<String>, queue: impl Into<String>, args: Vec<Value>) -> Self {
        Job::with_id(class, queue, args, Uuid::new_v4().to_string())
    }

    pub fn with_id(
        class: impl Into<String>,
        queue: impl Into<String>,
        args: Vec<Value>,
        id: impl Into<String>,
    ) -> Self {
        Job {
            id: id.into(),
            class: class.into(),
            args,
            queue: queue.into(),
            worker: None,
        }
    }

    /// Rebuild a job from a stored payload, keyed to the queue it was
    /// actually popped from.
    pub fn from_payload(payload: JobPayload, queue: impl Into<String>) -> Self {
        Job::with_id(payload.class, queue, payload.args, payload.id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn worker(&self) -> Option<&str> {
        self.worker.as_deref()
    }

    pub fn set_worker(&mut self, worker: impl Into<String>) {
        self.worker = Some(worker.into());
    }

    pub fn payload(&self) -> JobPayload {
        JobPayload {
            queue: self.queue.clone(),
            id: self.id.clone(),
            class: self.class.clone(),
            args: self.args.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generates_id_when_not_supplied() {
        let a = Job::new("SendEmail", "mail", vec![]);
        let b = Job::new("SendEmail", "mail", vec![]);
        assert_ne!(a.id(), b.id());
        assert!(Uuid::parse_str(a.id()).is_ok());
    }

    #[test]
    fn payload_round_trip() {
        let job = Job::with_id(
            "SendEmail",
            "mail",
            vec![json!("a@x.com"), json!({"retry": true})],
            "job-1",
        );

        let raw = serde_json::to_string(&job.payload()).unwrap();
        let payload: JobPayload = serde_json::from_str(&raw).unwrap();
        let restored = Job::from_payload(payload, "mail");

        assert_eq!(restored.id(), job.id());
        assert_eq!(restored.class(), job.class());
        assert_eq!(restored.args(), job.args());
        assert_eq!(restored.queue(), job.queue());
    }

    #[test]
    fn worker_assignment() {
        let mut job = Job::new("SendEmail", "mail", vec![]);
        assert!(job.worker().is_none());

        job.set_worker("host:42:mail");
        assert_eq!(job.worker(), Some("host:42:mail"));
    }
}
