use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::{Job, JobPayload};

/// Fleet-wide worker identity: `hostname:pid:queue-list`.
///
/// Unique across the fleet at any instant; pid reuse is only possible after
/// the previous registration has been pruned. Hostname and pid are injected
/// at startup rather than read ambiently inside components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerId {
    hostname: String,
    pid: u32,
    queues: Vec<String>,
    formatted: String,
}

impl WorkerId {
    pub fn new(hostname: impl Into<String>, pid: u32, queues: Vec<String>) -> Self {
        let hostname = hostname.into();
        let formatted = format!("{}:{}:{}", hostname, pid, queues.join(","));
        WorkerId {
            hostname,
            pid,
            queues,
            formatted,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn queues(&self) -> &[String] {
        &self.queues
    }

    pub fn as_str(&self) -> &str {
        &self.formatted
    }

    /// Split a registered id string into its hostname and pid parts.
    ///
    /// Returns `None` for ids that do not follow the `host:pid:queues`
    /// layout; pruning skips those rather than guessing.
    pub fn split(id: &str) -> Option<(&str, u32)> {
        let mut parts = id.splitn(3, ':');
        let host = parts.next()?;
        let pid = parts.next()?.parse().ok()?;
        parts.next()?;
        Some((host, pid))
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.formatted)
    }
}

/// Snapshot of the job a worker is currently processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingOn {
    pub queue: String,
    pub run_at: DateTime<Utc>,
    pub payload: JobPayload,
}

impl WorkingOn {
    pub fn new(job: &Job) -> Self {
        WorkingOn {
            queue: job.queue().to_string(),
            run_at: Utc::now(),
            payload: job.payload(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hostname_pid_queues() {
        let id = WorkerId::new("node1", 42, vec!["mail".into(), "reports".into()]);
        assert_eq!(id.as_str(), "node1:42:mail,reports");
    }

    #[test]
    fn splits_registered_ids() {
        assert_eq!(WorkerId::split("node1:42:mail,reports"), Some(("node1", 42)));
        assert_eq!(WorkerId::split("node1:42:*"), Some(("node1", 42)));
        assert_eq!(WorkerId::split("garbage"), None);
        assert_eq!(WorkerId::split("node1:not-a-pid:mail"), None);
    }
}
