//! In-memory store implementing every adapter trait.
//!
//! The reference backend for tests and single-process embedding. Entries go
//! through the same JSON wire format as the Redis store so reservation is a
//! true serialization round trip. TTLs are recorded but not enforced here.

use std::collections::{BTreeSet, HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::adapter::{JobAdapter, QueueAdapter, StatusQueryAdapter, WorkerAdapter};
use crate::error::{JobError, Result};
use crate::failure::FailureRecord;
use crate::job::{Job, JobPayload};
use crate::status::{JobStatus, StatusRecord};
use crate::worker_id::{WorkerId, WorkingOn};

#[derive(Default)]
struct Inner {
    queue_names: BTreeSet<String>,
    queues: HashMap<String, VecDeque<String>>,
    statuses: HashMap<String, StatusRecord>,
    failures: HashMap<String, FailureRecord>,
    workers: BTreeSet<String>,
    started: HashMap<String, DateTime<Utc>>,
    working_on: HashMap<String, WorkingOn>,
    stats: HashMap<String, u64>,
}

impl Inner {
    fn bump(&mut self, stat: String) {
        *self.stats.entry(stat).or_insert(0) += 1;
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn queued_len(&self, queue: &str) -> usize {
        self.inner
            .lock()
            .queues
            .get(queue)
            .map_or(0, VecDeque::len)
    }

    pub fn registered_workers(&self) -> Vec<String> {
        self.inner.lock().workers.iter().cloned().collect()
    }

    pub fn started_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.inner.lock().started.get(id).copied()
    }

    pub fn working_on(&self, id: &str) -> Option<WorkingOn> {
        self.inner.lock().working_on.get(id).cloned()
    }

    pub fn failure(&self, job_id: &str) -> Option<FailureRecord> {
        self.inner.lock().failures.get(job_id).cloned()
    }

    pub fn failure_count(&self) -> usize {
        self.inner.lock().failures.len()
    }

    pub fn processed_count(&self) -> u64 {
        self.stat("processed")
    }

    pub fn worker_processed_count(&self, id: &str) -> u64 {
        self.stat(&format!("processed:{id}"))
    }

    pub fn failed_count(&self) -> u64 {
        self.stat("failed")
    }

    pub fn worker_failed_count(&self, id: &str) -> u64 {
        self.stat(&format!("failed:{id}"))
    }

    fn stat(&self, name: &str) -> u64 {
        self.inner.lock().stats.get(name).copied().unwrap_or(0)
    }
}

#[async_trait]
impl QueueAdapter for MemoryStore {
    async fn all_queue_names(&self) -> Result<Vec<String>> {
        Ok(self.inner.lock().queue_names.iter().cloned().collect())
    }

    async fn reserve(&self, queue: &str) -> Result<Option<Job>> {
        let raw = {
            let mut inner = self.inner.lock();
            inner.queues.get_mut(queue).and_then(VecDeque::pop_front)
        };

        match raw {
            Some(raw) => {
                let payload: JobPayload = serde_json::from_str(&raw)?;
                Ok(Some(Job::from_payload(payload, queue)))
            }
            None => Ok(None),
        }
    }

    async fn enqueue(&self, job: &Job) -> Result<()> {
        let raw = serde_json::to_string(&job.payload())?;
        let mut inner = self.inner.lock();
        inner.queue_names.insert(job.queue().to_string());
        inner
            .queues
            .entry(job.queue().to_string())
            .or_default()
            .push_back(raw);
        Ok(())
    }

    async fn reestablish_connection(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl JobAdapter for MemoryStore {
    async fn update_status(&self, job: &Job, status: JobStatus) -> Result<()> {
        self.inner
            .lock()
            .statuses
            .insert(job.id().to_string(), StatusRecord::now(status));
        Ok(())
    }

    async fn create_failure(
        &self,
        payload: &JobPayload,
        error: &JobError,
        worker: &str,
        queue: &str,
    ) -> Result<()> {
        let record = FailureRecord::new(payload.clone(), error, worker, queue);
        let mut inner = self.inner.lock();
        inner.failures.insert(payload.id.clone(), record);
        inner.bump("failed".to_string());
        inner.bump(format!("failed:{worker}"));
        Ok(())
    }

    fn status_query(&self) -> Option<&dyn StatusQueryAdapter> {
        Some(self)
    }
}

#[async_trait]
impl StatusQueryAdapter for MemoryStore {
    async fn status(&self, job_id: &str) -> Result<Option<StatusRecord>> {
        Ok(self.inner.lock().statuses.get(job_id).cloned())
    }
}

#[async_trait]
impl WorkerAdapter for MemoryStore {
    async fn all_worker_ids(&self) -> Result<Vec<String>> {
        Ok(self.inner.lock().workers.iter().cloned().collect())
    }

    async fn register_worker(&self, id: &WorkerId) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.workers.insert(id.as_str().to_string());
        inner.started.insert(id.as_str().to_string(), Utc::now());
        Ok(())
    }

    async fn unregister_worker(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.workers.remove(id);
        inner.started.remove(id);
        inner.working_on.remove(id);
        inner.stats.remove(&format!("processed:{id}"));
        inner.stats.remove(&format!("failed:{id}"));
        Ok(())
    }

    async fn set_working_on(&self, id: &WorkerId, snapshot: &WorkingOn) -> Result<()> {
        self.inner
            .lock()
            .working_on
            .insert(id.as_str().to_string(), snapshot.clone());
        Ok(())
    }

    async fn clear_working_on(&self, id: &WorkerId) -> Result<()> {
        self.inner.lock().working_on.remove(id.as_str());
        Ok(())
    }

    async fn increase_processed_count(&self) -> Result<()> {
        self.inner.lock().bump("processed".to_string());
        Ok(())
    }

    async fn increase_worker_processed_count(&self, id: &WorkerId) -> Result<()> {
        self.inner.lock().bump(format!("processed:{}", id.as_str()));
        Ok(())
    }

    async fn reestablish_connection(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn enqueue_then_reserve_round_trips() {
        let store = MemoryStore::new();
        let job = Job::new("SendEmail", "mail", vec![json!("a@x.com")]);

        store.enqueue(&job).await.unwrap();
        assert_eq!(store.queued_len("mail"), 1);

        let reserved = store.reserve("mail").await.unwrap().unwrap();
        assert_eq!(reserved.id(), job.id());
        assert_eq!(reserved.class(), "SendEmail");
        assert_eq!(reserved.args(), job.args());
        assert_eq!(reserved.queue(), "mail");

        assert!(store.reserve("mail").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn enqueue_registers_queue_name() {
        let store = MemoryStore::new();
        store
            .enqueue(&Job::new("A", "reports", vec![]))
            .await
            .unwrap();
        store.enqueue(&Job::new("B", "mail", vec![])).await.unwrap();

        let names = store.all_queue_names().await.unwrap();
        assert_eq!(names, vec!["mail".to_string(), "reports".to_string()]);
    }

    #[tokio::test]
    async fn reserve_is_fifo_per_queue() {
        let store = MemoryStore::new();
        let first = Job::new("A", "mail", vec![]);
        let second = Job::new("B", "mail", vec![]);
        store.enqueue(&first).await.unwrap();
        store.enqueue(&second).await.unwrap();

        assert_eq!(
            store.reserve("mail").await.unwrap().unwrap().id(),
            first.id()
        );
        assert_eq!(
            store.reserve("mail").await.unwrap().unwrap().id(),
            second.id()
        );
    }

    #[tokio::test]
    async fn status_writes_are_readable() {
        let store = MemoryStore::new();
        let job = Job::new("A", "mail", vec![]);

        store.update_status(&job, JobStatus::Waiting).await.unwrap();
        let record = store.status(job.id()).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Waiting);

        assert!(store.status("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failure_records_bump_failed_counters() {
        let store = MemoryStore::new();
        let job = Job::new("A", "mail", vec![]);

        store
            .create_failure(
                &job.payload(),
                &JobError::failed("boom"),
                "host:1:mail",
                "mail",
            )
            .await
            .unwrap();

        assert_eq!(store.failure_count(), 1);
        assert_eq!(store.failed_count(), 1);
        assert_eq!(store.worker_failed_count("host:1:mail"), 1);
        assert_eq!(store.failure(job.id()).unwrap().error, "boom");
    }

    #[tokio::test]
    async fn unregister_removes_counters_and_snapshot() {
        let store = MemoryStore::new();
        let id = WorkerId::new("host", 1, vec!["mail".into()]);
        let job = Job::new("A", "mail", vec![]);

        store.register_worker(&id).await.unwrap();
        store
            .set_working_on(&id, &WorkingOn::new(&job))
            .await
            .unwrap();
        store.increase_worker_processed_count(&id).await.unwrap();
        assert!(store.started_at(id.as_str()).is_some());

        store.unregister_worker(id.as_str()).await.unwrap();
        assert!(store.registered_workers().is_empty());
        assert!(store.working_on(id.as_str()).is_none());
        assert_eq!(store.worker_processed_count(id.as_str()), 0);
    }
}
