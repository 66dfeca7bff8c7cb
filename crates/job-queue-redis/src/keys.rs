//! Store key layout.
//!
//! `queue` is the set of known queue names; `queue:<name>` holds the
//! pending payload list; `job:<id>:status` the status packet;
//! `failed:<id>` the failure record; `workers` the fleet directory set;
//! `worker:<id>[:started]` the activity snapshot and start timestamp;
//! `stat:*` the processed and failed counters.

pub const QUEUE_SET: &str = "queue";
pub const WORKER_SET: &str = "workers";
pub const PROCESSED: &str = "stat:processed";
pub const FAILED: &str = "stat:failed";

pub fn queue(name: &str) -> String {
    format!("queue:{name}")
}

pub fn job_status(job_id: &str) -> String {
    format!("job:{job_id}:status")
}

pub fn failure(job_id: &str) -> String {
    format!("failed:{job_id}")
}

pub fn worker(id: &str) -> String {
    format!("worker:{id}")
}

pub fn worker_started(id: &str) -> String {
    format!("{}:started", worker(id))
}

pub fn worker_processed(id: &str) -> String {
    format!("{PROCESSED}:{id}")
}

pub fn worker_failed(id: &str) -> String {
    format!("{FAILED}:{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout() {
        assert_eq!(queue("mail"), "queue:mail");
        assert_eq!(job_status("j1"), "job:j1:status");
        assert_eq!(failure("j1"), "failed:j1");
        assert_eq!(worker("node:1:mail"), "worker:node:1:mail");
        assert_eq!(worker_started("node:1:mail"), "worker:node:1:mail:started");
        assert_eq!(worker_processed("node:1:mail"), "stat:processed:node:1:mail");
        assert_eq!(worker_failed("node:1:mail"), "stat:failed:node:1:mail");
    }
}
