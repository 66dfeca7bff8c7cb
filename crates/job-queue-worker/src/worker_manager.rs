use std::sync::Arc;

use tracing::{debug, warn};

use job_queue_core::{Job, Result, WorkerAdapter, WorkerId, WorkingOn};

/// Live worker pids on the local host.
///
/// Injectable so pruning decisions can be tested without a process table.
pub trait ProcessProbe: Send + Sync {
    fn live_worker_pids(&self) -> Vec<u32>;
}

/// Scans the platform process table for worker processes by program name.
pub struct SystemProcessProbe {
    needle: String,
}

impl SystemProcessProbe {
    pub fn new(needle: impl Into<String>) -> Self {
        SystemProcessProbe {
            needle: needle.into(),
        }
    }
}

impl ProcessProbe for SystemProcessProbe {
    fn live_worker_pids(&self) -> Vec<u32> {
        let sys = sysinfo::System::new_all();
        sys.processes()
            .iter()
            .filter(|(_, process)| process.name().to_string_lossy().contains(&self.needle))
            .map(|(pid, _)| pid.as_u32())
            .collect()
    }
}

/// Fleet directory bookkeeping: registration, activity snapshots, counters
/// and dead-worker pruning.
pub struct WorkerManager {
    adapter: Arc<dyn WorkerAdapter>,
    hostname: String,
    own_pid: u32,
    probe: Arc<dyn ProcessProbe>,
}

impl WorkerManager {
    pub fn new(adapter: Arc<dyn WorkerAdapter>, hostname: impl Into<String>, own_pid: u32) -> Self {
        WorkerManager {
            adapter,
            hostname: hostname.into(),
            own_pid,
            probe: Arc::new(SystemProcessProbe::new(crate::WORKER_PROGRAM)),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn ProcessProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Unregister every worker id registered for this host whose pid is
    /// neither this process nor alive in the local process table.
    ///
    /// Entries from other hosts are left untouched: without a cross-host
    /// liveness protocol there is no authority to prune them.
    pub async fn prune_dead_workers(&self) -> Result<()> {
        let live_pids = self.probe.live_worker_pids();

        for id in self.adapter.all_worker_ids().await? {
            let Some((host, pid)) = WorkerId::split(&id) else {
                warn!(worker = %id, "skipping malformed worker id");
                continue;
            };

            if host != self.hostname || pid == self.own_pid || live_pids.contains(&pid) {
                continue;
            }

            debug!(worker = %id, "pruning dead worker");
            self.adapter.unregister_worker(&id).await?;
        }

        Ok(())
    }

    pub async fn register_worker(&self, id: &WorkerId) -> Result<()> {
        self.adapter.register_worker(id).await
    }

    pub async fn unregister_worker(&self, id: &str) -> Result<()> {
        self.adapter.unregister_worker(id).await
    }

    pub async fn set_working_on(&self, id: &WorkerId, job: &Job) -> Result<()> {
        self.adapter.set_working_on(id, &WorkingOn::new(job)).await
    }

    /// Bump the processed counters and clear the activity snapshot.
    pub async fn finished_working(&self, id: &WorkerId) -> Result<()> {
        self.adapter.increase_processed_count().await?;
        self.adapter.increase_worker_processed_count(id).await?;
        self.adapter.clear_working_on(id).await
    }

    pub async fn reestablish_connection(&self) -> Result<()> {
        self.adapter.reestablish_connection().await
    }
}
