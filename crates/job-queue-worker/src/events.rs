use parking_lot::RwLock;
use std::sync::Arc;

use job_queue_core::{Job, JobError, WorkerId};

/// Lifecycle notifications emitted by the worker and the job runner.
///
/// The set is fixed; observers subscribe through [`EventBus`] rather than a
/// generic event manager.
#[derive(Debug)]
pub enum WorkerEvent<'a> {
    /// The worker finished startup and is about to process its first job.
    BeforeFirstFork { worker: &'a WorkerId },
    /// A job was reserved and is about to enter its isolated context.
    BeforeFork { job: &'a Job },
    /// The job runner took over the job.
    BeforeExecute { job: &'a Job },
    /// The handler was resolved and is about to be invoked.
    BeforePerform { job: &'a Job },
    /// The job body completed cleanly.
    AfterExecute { job: &'a Job },
    /// The job is being marked failed.
    OnFailure { job: &'a Job, error: &'a JobError },
}

impl WorkerEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            WorkerEvent::BeforeFirstFork { .. } => "before_first_fork",
            WorkerEvent::BeforeFork { .. } => "before_fork",
            WorkerEvent::BeforeExecute { .. } => "before_execute",
            WorkerEvent::BeforePerform { .. } => "before_perform",
            WorkerEvent::AfterExecute { .. } => "after_execute",
            WorkerEvent::OnFailure { .. } => "on_failure",
        }
    }
}

pub trait EventListener: Send + Sync {
    fn handle(&self, event: &WorkerEvent<'_>);
}

/// Listener registration list for the fixed lifecycle events.
pub struct EventBus {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus {
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe<L: EventListener + 'static>(&self, listener: L) {
        self.listeners.write().push(Arc::new(listener));
    }

    pub fn emit(&self, event: &WorkerEvent<'_>) {
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        for listener in listeners {
            listener.handle(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Recorder {
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    impl EventListener for Recorder {
        fn handle(&self, event: &WorkerEvent<'_>) {
            self.seen.lock().push(event.name());
        }
    }

    #[test]
    fn listeners_receive_emitted_events() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(Recorder { seen: seen.clone() });

        let job = Job::new("SendEmail", "mail", vec![]);
        bus.emit(&WorkerEvent::BeforeFork { job: &job });
        bus.emit(&WorkerEvent::AfterExecute { job: &job });

        assert_eq!(*seen.lock(), vec!["before_fork", "after_execute"]);
    }
}
