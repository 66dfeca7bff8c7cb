use std::time::Duration;

use serde::{Deserialize, Serialize};

use job_queue_core::{WorkerId, WILDCARD_QUEUE};

use crate::worker::IsolationMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub redis_url: String,
    pub queues: Vec<String>,
    pub interval_secs: u64,
    pub isolation: IsolationMode,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            queues: vec![WILDCARD_QUEUE.to_string()],
            interval_secs: 5,
            isolation: IsolationMode::Supervised,
        }
    }
}

impl WorkerConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: WorkerConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Parse a comma-separated queue list; empty input means the wildcard.
pub fn parse_queue_list(raw: &str) -> Vec<String> {
    let queues: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    if queues.is_empty() {
        vec![WILDCARD_QUEUE.to_string()]
    } else {
        queues
    }
}

/// Queue list from the `QUEUES` environment variable; unset or empty means
/// the wildcard.
pub fn queues_from_env() -> Vec<String> {
    parse_queue_list(&std::env::var("QUEUES").unwrap_or_default())
}

/// Identity for a worker started in this process: local hostname, this
/// pid, and the queue subscription. Read once at startup and injected.
pub fn local_worker_id(queues: Vec<String>) -> WorkerId {
    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string());

    WorkerId::new(hostname, std::process::id(), queues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_comma_separated_queues() {
        assert_eq!(parse_queue_list("mail,reports"), vec!["mail", "reports"]);
        assert_eq!(parse_queue_list(" mail , reports "), vec!["mail", "reports"]);
        assert_eq!(parse_queue_list("mail"), vec!["mail"]);
    }

    #[test]
    fn empty_queue_list_means_wildcard() {
        assert_eq!(parse_queue_list(""), vec!["*"]);
        assert_eq!(parse_queue_list(" , "), vec!["*"]);
    }

    #[test]
    fn defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.queues, vec!["*"]);
        assert_eq!(config.interval_secs, 5);
        assert_eq!(config.isolation, IsolationMode::Supervised);
    }

    #[test]
    fn loads_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "redis_url: redis://queue-host:6379\nqueues: [mail, reports]\ninterval_secs: 2\nisolation: inline"
        )
        .unwrap();

        let config = WorkerConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.redis_url, "redis://queue-host:6379");
        assert_eq!(config.queues, vec!["mail", "reports"]);
        assert_eq!(config.interval_secs, 2);
        assert_eq!(config.isolation, IsolationMode::Inline);
    }

    #[test]
    fn local_worker_id_uses_this_process() {
        let id = local_worker_id(vec!["mail".into()]);
        assert_eq!(id.pid(), std::process::id());
        assert!(id.as_str().ends_with(":mail"));
    }
}
