use std::sync::Arc;

use job_queue_core::{Job, QueueAdapter, Result};

use crate::strategy::{OrderedPoll, ReserveStrategy};

/// Owns the configured queue set and delegates reservation to the strategy.
pub struct QueueManager {
    queues: Vec<String>,
    adapter: Arc<dyn QueueAdapter>,
    strategy: Arc<dyn ReserveStrategy>,
}

impl QueueManager {
    pub fn new(adapter: Arc<dyn QueueAdapter>, queues: Vec<String>) -> Self {
        QueueManager::with_strategy(adapter, queues, Arc::new(OrderedPoll))
    }

    pub fn with_strategy(
        adapter: Arc<dyn QueueAdapter>,
        queues: Vec<String>,
        strategy: Arc<dyn ReserveStrategy>,
    ) -> Self {
        QueueManager {
            queues,
            adapter,
            strategy,
        }
    }

    pub async fn reserve(&self) -> Result<Option<Job>> {
        self.strategy.reserve(&self.queues, self.adapter.as_ref()).await
    }

    /// The configured queue list; feeds the worker's identity string.
    pub fn queue_names(&self) -> &[String] {
        &self.queues
    }

    pub async fn reestablish_connection(&self) -> Result<()> {
        self.adapter.reestablish_connection().await
    }
}
