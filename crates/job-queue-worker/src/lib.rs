pub mod bootstrap;
pub mod config;
pub mod control;
pub mod events;
pub mod handler;
pub mod job_manager;
pub mod proc_title;
pub mod queue;
pub mod strategy;
pub mod worker;
pub mod worker_manager;

pub use bootstrap::assemble_worker;
pub use config::WorkerConfig;
pub use control::{Control, ControlHandle};
pub use events::{EventBus, EventListener, WorkerEvent};
pub use handler::{HandlerRegistry, HandlerResolver, HasSetup, HasTearDown, JobHandler};
pub use job_manager::JobManager;
pub use queue::QueueManager;
pub use strategy::{OrderedPoll, ReserveStrategy};
pub use worker::{IsolationMode, Worker};
pub use worker_manager::{ProcessProbe, SystemProcessProbe, WorkerManager};

/// Program name workers run under; the process probe looks for it when
/// pruning dead registrations.
pub const WORKER_PROGRAM: &str = "jq-worker";
