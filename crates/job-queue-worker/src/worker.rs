use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use job_queue_core::{Job, JobError, JobStatus, Result, WorkerId};

use crate::config::WorkerConfig;
use crate::control::{self, Control, ControlHandle};
use crate::events::{EventBus, WorkerEvent};
use crate::job_manager::JobManager;
use crate::proc_title::ProcTitle;
use crate::queue::QueueManager;
use crate::worker_manager::WorkerManager;

/// How job bodies are isolated from the worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationMode {
    /// Run each job on a supervised task; a panic or kill is observed as an
    /// abnormal exit without touching the worker loop.
    Supervised,
    /// Run job bodies inline with no crash containment. Degraded mode for
    /// environments where supervision is unwanted.
    Inline,
}

enum ChildOutcome {
    Clean,
    Abnormal(String),
}

enum WaitEvent {
    Finished(std::result::Result<Result<()>, JoinError>),
    Command(Option<Control>),
}

/// The unit of execution: one queue subscription, one job at a time.
///
/// Single-threaded and cooperative: control commands are applied at loop
/// boundaries and at the two suspension points (the empty-poll sleep and
/// the isolated-context wait); only the kill paths interrupt the latter.
pub struct Worker {
    id: WorkerId,
    interval: Duration,
    isolation: IsolationMode,
    job_manager: Arc<JobManager>,
    queue_manager: QueueManager,
    fleet: WorkerManager,
    events: Arc<EventBus>,
    control: ControlHandle,
    control_rx: UnboundedReceiver<Control>,
    current_job: Option<Job>,
    finishing: bool,
    paused: bool,
    reconnect_requested: bool,
    title: ProcTitle,
}

impl Worker {
    pub fn new(
        config: &WorkerConfig,
        id: WorkerId,
        job_manager: Arc<JobManager>,
        queue_manager: QueueManager,
        fleet: WorkerManager,
        events: Arc<EventBus>,
    ) -> Self {
        let (control, control_rx) = control::channel();

        Worker {
            id,
            interval: config.interval(),
            isolation: config.isolation,
            job_manager,
            queue_manager,
            fleet,
            events,
            control,
            control_rx,
            current_job: None,
            finishing: false,
            paused: false,
            reconnect_requested: false,
            title: ProcTitle::new(crate::WORKER_PROGRAM),
        }
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    /// Sender half of this worker's control channel.
    pub fn handle(&self) -> ControlHandle {
        self.control.clone()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finishing(&self) -> bool {
        self.finishing
    }

    /// Run until told to finish, then unregister from the fleet directory.
    ///
    /// Store faults during bookkeeping propagate out of here and terminate
    /// the worker visibly; job-body failures never do.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.startup().await?;

        loop {
            self.drain_control();

            if self.reconnect_requested {
                self.reconnect().await?;
            }

            if self.finishing {
                break;
            }

            if self.paused {
                self.sleep().await;
                continue;
            }

            self.tick().await?;
        }

        info!(worker = %self.id, "exiting");
        self.fleet.unregister_worker(self.id.as_str()).await?;
        Ok(())
    }

    async fn startup(&mut self) -> Result<()> {
        self.title.set("Starting");
        info!(worker = %self.id, "starting worker");

        if let Err(err) = control::install_signal_handlers(self.control.clone()) {
            warn!(%err, "signal handling is not available on this system");
        }

        self.fleet.prune_dead_workers().await?;
        self.events
            .emit(&WorkerEvent::BeforeFirstFork { worker: &self.id });
        self.fleet.register_worker(&self.id).await
    }

    /// One loop iteration: reserve a job and see it through, or sleep one
    /// interval when every queue is empty.
    pub async fn tick(&mut self) -> Result<()> {
        let Some(mut job) = self.queue_manager.reserve().await? else {
            self.sleep().await;
            return Ok(());
        };

        info!(job_id = %job.id(), queue = %job.queue(), "got job");
        self.events.emit(&WorkerEvent::BeforeFork { job: &job });
        self.start_working_on(&mut job).await?;

        match self.isolation {
            IsolationMode::Supervised => {
                let manager = Arc::clone(&self.job_manager);
                let child = tokio::spawn(run_isolated(manager, job.clone()));
                self.title.set(format!("Forked task for {}", job.id()));

                if let ChildOutcome::Abnormal(detail) = self.supervise(child).await {
                    warn!(job_id = %job.id(), %detail, "job exited abnormally");
                    self.job_manager
                        .fail_job(&job, &JobError::AbnormalExit(detail))
                        .await?;
                }
            }
            IsolationMode::Inline => {
                // No crash containment in this mode.
                self.title
                    .set(format!("Processing {} in {}", job.id(), job.queue()));
                self.job_manager.run(&job).await?;
            }
        }

        self.finished_working().await
    }

    async fn start_working_on(&mut self, job: &mut Job) -> Result<()> {
        self.fleet.set_working_on(&self.id, job).await?;
        job.set_worker(self.id.as_str());
        self.current_job = Some(job.clone());
        self.job_manager.update_status(job, JobStatus::Running).await
    }

    async fn finished_working(&mut self) -> Result<()> {
        if self.current_job.take().is_some() {
            self.fleet.finished_working(&self.id).await?;
        }
        Ok(())
    }

    /// Wait for the isolated context, honoring the kill paths and buffering
    /// every other command as flag changes for the next loop boundary.
    async fn supervise(&mut self, mut child: JoinHandle<Result<()>>) -> ChildOutcome {
        loop {
            let event = tokio::select! {
                res = &mut child => WaitEvent::Finished(res),
                command = self.control_rx.recv() => WaitEvent::Command(command),
            };

            match event {
                WaitEvent::Finished(res) => return child_outcome(res),
                WaitEvent::Command(Some(Control::KillChild)) => {
                    warn!("killing in-flight job");
                    child.abort();
                }
                WaitEvent::Command(Some(Control::ShutdownNow)) => {
                    warn!("forced shutdown started");
                    self.finishing = true;
                    child.abort();
                }
                WaitEvent::Command(Some(command)) => self.apply_control(command),
                WaitEvent::Command(None) => return child_outcome(child.await),
            }
        }
    }

    async fn sleep(&mut self) {
        let status = if self.paused {
            "Paused".to_string()
        } else {
            format!(
                "Waiting for {}",
                self.queue_manager.queue_names().join(",")
            )
        };
        self.title.set(&status);
        debug!(seconds = self.interval.as_secs_f64(), "sleeping");

        let command = tokio::select! {
            _ = tokio::time::sleep(self.interval) => None,
            command = self.control_rx.recv() => command,
        };

        if let Some(command) = command {
            self.apply_control(command);
        }
    }

    fn drain_control(&mut self) {
        while let Ok(command) = self.control_rx.try_recv() {
            self.apply_control(command);
        }
    }

    fn apply_control(&mut self, command: Control) {
        match command {
            Control::Shutdown => {
                info!("quit received; finishing after current loop");
                self.finishing = true;
            }
            Control::ShutdownNow => {
                warn!("forced shutdown started");
                self.finishing = true;
            }
            Control::KillChild => debug!("no child to kill"),
            Control::Pause => {
                info!("pause received; pausing job processing");
                self.paused = true;
            }
            Control::Resume => {
                info!("resume received; resuming job processing");
                self.paused = false;
            }
            Control::Reconnect => {
                info!("reconnect requested");
                self.reconnect_requested = true;
            }
        }
    }

    async fn reconnect(&mut self) -> Result<()> {
        self.queue_manager.reestablish_connection().await?;
        self.fleet.reestablish_connection().await?;
        self.reconnect_requested = false;
        Ok(())
    }
}

async fn run_isolated(manager: Arc<JobManager>, job: Job) -> Result<()> {
    info!(job_id = %job.id(), queue = %job.queue(), "processing job");
    manager.run(&job).await
}

fn child_outcome(res: std::result::Result<Result<()>, JoinError>) -> ChildOutcome {
    match res {
        Ok(Ok(())) => ChildOutcome::Clean,
        Ok(Err(err)) => ChildOutcome::Abnormal(format!("job runner error: {err}")),
        Err(join_err) if join_err.is_panic() => {
            let panic = join_err.into_panic();
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            ChildOutcome::Abnormal(format!("panicked: {message}"))
        }
        Err(_) => ChildOutcome::Abnormal("killed before completion".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_queue_core::MemoryStore;
    use job_queue_core::{JobAdapter, QueueAdapter, WorkerAdapter};

    use crate::handler::HandlerRegistry;

    fn test_worker(store: Arc<MemoryStore>) -> Worker {
        let config = WorkerConfig {
            interval_secs: 0,
            ..WorkerConfig::default()
        };
        let events = Arc::new(EventBus::new());
        let job_manager = Arc::new(JobManager::new(
            store.clone() as Arc<dyn JobAdapter>,
            store.clone() as Arc<dyn QueueAdapter>,
            Arc::new(HandlerRegistry::new()),
            events.clone(),
        ));
        let queue_manager =
            QueueManager::new(store.clone() as Arc<dyn QueueAdapter>, vec!["mail".into()]);
        let id = WorkerId::new("testhost", 1, vec!["mail".into()]);
        let fleet = WorkerManager::new(store as Arc<dyn WorkerAdapter>, "testhost", 1);

        Worker::new(&config, id, job_manager, queue_manager, fleet, events)
    }

    #[tokio::test]
    async fn control_commands_toggle_loop_flags() {
        let store = Arc::new(MemoryStore::new());
        let mut worker = test_worker(store);
        let handle = worker.handle();

        handle.pause();
        handle.resume();
        handle.kill_child();
        handle.shutdown();
        worker.drain_control();

        assert!(!worker.is_paused());
        assert!(worker.is_finishing());
    }

    #[tokio::test]
    async fn pause_flag_survives_until_resume() {
        let store = Arc::new(MemoryStore::new());
        let mut worker = test_worker(store);

        worker.apply_control(Control::Pause);
        assert!(worker.is_paused());

        worker.apply_control(Control::Resume);
        assert!(!worker.is_paused());
    }

    #[tokio::test]
    async fn identity_is_hostname_pid_queues() {
        let store = Arc::new(MemoryStore::new());
        let worker = test_worker(store);
        assert_eq!(worker.id().as_str(), "testhost:1:mail");
    }
}
