use async_trait::async_trait;
use tracing::debug;

use job_queue_core::{Job, QueueAdapter, Result, WILDCARD_QUEUE};

/// Policy deciding which queue to poll next.
///
/// Implementations must be non-blocking: return the first job found or
/// `None` if every candidate queue was empty this pass. Backoff is the
/// caller's responsibility.
#[async_trait]
pub trait ReserveStrategy: Send + Sync {
    async fn reserve(&self, queues: &[String], adapter: &dyn QueueAdapter) -> Result<Option<Job>>;
}

/// Polls the configured queues in list order; first hit wins.
///
/// The wildcard token expands at call time to every queue the store
/// currently knows, sorted for a deterministic polling order. No fairness
/// guarantee beyond list order.
pub struct OrderedPoll;

#[async_trait]
impl ReserveStrategy for OrderedPoll {
    async fn reserve(&self, queues: &[String], adapter: &dyn QueueAdapter) -> Result<Option<Job>> {
        let expanded;
        let queues = if queues.iter().any(|q| q == WILDCARD_QUEUE) {
            let mut names = adapter.all_queue_names().await?;
            names.sort();
            expanded = names;
            expanded.as_slice()
        } else {
            queues
        };

        for queue in queues {
            debug!(%queue, "checking queue");

            if let Some(job) = adapter.reserve(queue).await? {
                debug!(%queue, job_id = %job.id(), "found job");
                return Ok(Some(job));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_queue_core::MemoryStore;

    fn queues(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn returns_none_when_all_queues_empty() {
        let store = MemoryStore::new();
        let found = OrderedPoll
            .reserve(&queues(&["a", "b"]), &store)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn polls_in_list_order() {
        let store = MemoryStore::new();
        store.enqueue(&Job::new("A", "slow", vec![])).await.unwrap();
        store.enqueue(&Job::new("B", "fast", vec![])).await.unwrap();

        let job = OrderedPoll
            .reserve(&queues(&["fast", "slow"]), &store)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.queue(), "fast");
    }

    #[tokio::test]
    async fn wildcard_expands_to_known_queues_at_call_time() {
        let store = MemoryStore::new();
        store.enqueue(&Job::new("A", "a", vec![])).await.unwrap();
        let drained = store.reserve("a").await.unwrap();
        assert!(drained.is_some());

        // "a" is registered but empty; the job lives on "b", created after
        // the strategy's caller was configured.
        let job = Job::new("B", "b", vec![]);
        store.enqueue(&job).await.unwrap();

        let found = OrderedPoll
            .reserve(&queues(&["*"]), &store)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id(), job.id());
    }

    #[tokio::test]
    async fn named_list_does_not_see_other_queues() {
        let store = MemoryStore::new();
        store.enqueue(&Job::new("A", "a", vec![])).await.unwrap();
        let drained = store.reserve("a").await.unwrap();
        assert!(drained.is_some());
        store.enqueue(&Job::new("B", "b", vec![])).await.unwrap();

        let found = OrderedPoll.reserve(&queues(&["a"]), &store).await.unwrap();
        assert!(found.is_none());
    }
}
