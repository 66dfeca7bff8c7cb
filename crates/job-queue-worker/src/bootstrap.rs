use std::sync::Arc;

use job_queue_core::{JobAdapter, QueueAdapter, WorkerAdapter};

use crate::config::{self, WorkerConfig};
use crate::events::EventBus;
use crate::handler::HandlerResolver;
use crate::job_manager::JobManager;
use crate::queue::QueueManager;
use crate::worker::Worker;
use crate::worker_manager::WorkerManager;

/// Assemble a worker for this process from one store client.
///
/// The store must satisfy all three adapter contracts; identity is derived
/// from the local hostname, this pid and the configured queue list.
pub fn assemble_worker<S>(
    config: &WorkerConfig,
    store: Arc<S>,
    resolver: Arc<dyn HandlerResolver>,
    events: Arc<EventBus>,
) -> Worker
where
    S: QueueAdapter + JobAdapter + WorkerAdapter + Send + Sync + 'static,
{
    let job_manager = Arc::new(JobManager::new(
        store.clone() as Arc<dyn JobAdapter>,
        store.clone() as Arc<dyn QueueAdapter>,
        resolver,
        events.clone(),
    ));
    let queue_manager = QueueManager::new(
        store.clone() as Arc<dyn QueueAdapter>,
        config.queues.clone(),
    );

    let id = config::local_worker_id(config.queues.clone());
    let fleet = WorkerManager::new(
        store as Arc<dyn WorkerAdapter>,
        id.hostname().to_string(),
        id.pid(),
    );

    Worker::new(config, id, job_manager, queue_manager, fleet, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_queue_core::MemoryStore;

    use crate::handler::HandlerRegistry;

    #[tokio::test]
    async fn assembles_a_worker_with_local_identity() {
        let config = WorkerConfig {
            queues: vec!["mail".into()],
            ..WorkerConfig::default()
        };

        let worker = assemble_worker(
            &config,
            Arc::new(MemoryStore::new()),
            Arc::new(HandlerRegistry::new()),
            Arc::new(EventBus::new()),
        );

        assert_eq!(worker.id().pid(), std::process::id());
        assert_eq!(worker.id().queues(), ["mail".to_string()]);
    }
}
