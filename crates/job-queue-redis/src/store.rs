use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tracing::debug;

use job_queue_core::{
    FailureRecord, Job, JobAdapter, JobError, JobPayload, JobStatus, QueueAdapter, Result,
    StatusQueryAdapter, StatusRecord, StoreError, WorkerAdapter, WorkerId, WorkingOn,
    FAILURE_TTL_SECS, TERMINAL_STATUS_TTL_SECS,
};

use crate::keys;

/// Redis client implementing the queue, job and worker adapter contracts.
///
/// All operations go through a shared [`ConnectionManager`]; a transport
/// reconnect request replaces it wholesale rather than waiting for the
/// manager's own retry cycle.
pub struct RedisStore {
    client: redis::Client,
    conn: RwLock<ConnectionManager>,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(StoreError::backend)?;
        let conn = ConnectionManager::new(client.clone())
            .await
            .map_err(StoreError::backend)?;

        Ok(RedisStore {
            client,
            conn: RwLock::new(conn),
        })
    }

    async fn connection(&self) -> ConnectionManager {
        self.conn.read().await.clone()
    }

    async fn reconnect(&self) -> Result<()> {
        debug!("reestablishing redis connection");
        let fresh = ConnectionManager::new(self.client.clone())
            .await
            .map_err(StoreError::backend)?;
        *self.conn.write().await = fresh;
        Ok(())
    }
}

#[async_trait]
impl QueueAdapter for RedisStore {
    async fn all_queue_names(&self) -> Result<Vec<String>> {
        let mut conn = self.connection().await;
        let names: Vec<String> = conn
            .smembers(keys::QUEUE_SET)
            .await
            .map_err(StoreError::backend)?;
        Ok(names)
    }

    async fn reserve(&self, queue: &str) -> Result<Option<Job>> {
        let mut conn = self.connection().await;
        let raw: Option<String> = conn
            .lpop(keys::queue(queue), None)
            .await
            .map_err(StoreError::backend)?;

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
        let mut conn = self.connection().await;

        let _: () = conn
            .sadd(keys::QUEUE_SET, job.queue())
            .await
            .map_err(StoreError::backend)?;
        let _: () = conn
            .rpush(keys::queue(job.queue()), raw)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn reestablish_connection(&self) -> Result<()> {
        self.reconnect().await
    }
}

#[async_trait]
impl JobAdapter for RedisStore {
    async fn update_status(&self, job: &Job, status: JobStatus) -> Result<()> {
        let packet = serde_json::to_string(&StatusRecord::now(status))?;
        let key = keys::job_status(job.id());
        let mut conn = self.connection().await;

        if status.is_terminal() {
            let _: () = conn
                .set_ex(key, packet, TERMINAL_STATUS_TTL_SECS)
                .await
                .map_err(StoreError::backend)?;
        } else {
            let _: () = conn.set(key, packet).await.map_err(StoreError::backend)?;
        }
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
        let raw = serde_json::to_string(&record)?;
        let mut conn = self.connection().await;

        let _: () = conn
            .set_ex(keys::failure(&payload.id), raw, FAILURE_TTL_SECS)
            .await
            .map_err(StoreError::backend)?;
        let _: i64 = conn
            .incr(keys::FAILED, 1)
            .await
            .map_err(StoreError::backend)?;
        let _: i64 = conn
            .incr(keys::worker_failed(worker), 1)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    fn status_query(&self) -> Option<&dyn StatusQueryAdapter> {
        Some(self)
    }
}

#[async_trait]
impl StatusQueryAdapter for RedisStore {
    async fn status(&self, job_id: &str) -> Result<Option<StatusRecord>> {
        let mut conn = self.connection().await;
        let raw: Option<String> = conn
            .get(keys::job_status(job_id))
            .await
            .map_err(StoreError::backend)?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl WorkerAdapter for RedisStore {
    async fn all_worker_ids(&self) -> Result<Vec<String>> {
        let mut conn = self.connection().await;
        let ids: Vec<String> = conn
            .smembers(keys::WORKER_SET)
            .await
            .map_err(StoreError::backend)?;
        Ok(ids)
    }

    async fn register_worker(&self, id: &WorkerId) -> Result<()> {
        let mut conn = self.connection().await;
        let _: () = conn
            .sadd(keys::WORKER_SET, id.as_str())
            .await
            .map_err(StoreError::backend)?;
        let _: () = conn
            .set(keys::worker_started(id.as_str()), Utc::now().to_rfc3339())
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn unregister_worker(&self, id: &str) -> Result<()> {
        let mut conn = self.connection().await;
        let _: () = conn
            .srem(keys::WORKER_SET, id)
            .await
            .map_err(StoreError::backend)?;
        let _: () = conn
            .del(vec![
                keys::worker(id),
                keys::worker_started(id),
                keys::worker_processed(id),
                keys::worker_failed(id),
            ])
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn set_working_on(&self, id: &WorkerId, snapshot: &WorkingOn) -> Result<()> {
        let raw = serde_json::to_string(snapshot)?;
        let mut conn = self.connection().await;
        let _: () = conn
            .set(keys::worker(id.as_str()), raw)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn clear_working_on(&self, id: &WorkerId) -> Result<()> {
        let mut conn = self.connection().await;
        let _: () = conn
            .del(keys::worker(id.as_str()))
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn increase_processed_count(&self) -> Result<()> {
        let mut conn = self.connection().await;
        let _: i64 = conn
            .incr(keys::PROCESSED, 1)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn increase_worker_processed_count(&self, id: &WorkerId) -> Result<()> {
        let mut conn = self.connection().await;
        let _: i64 = conn
            .incr(keys::worker_processed(id.as_str()), 1)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn reestablish_connection(&self) -> Result<()> {
        self.reconnect().await
    }
}
