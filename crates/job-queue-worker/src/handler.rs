use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use job_queue_core::JobError;

/// Result type for job bodies.
pub type PerformResult = std::result::Result<(), JobError>;

/// The executable unit behind a job class.
///
/// Handlers receive the job's arguments positionally. Returning
/// [`JobError::Skip`] opts the job out of this run without marking it
/// failed; any other error marks the job failed.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn perform(&self, args: &[Value]) -> PerformResult;

    /// Opt-in setup capability. Handlers that want a hook run before
    /// `perform` return `Some(self)` here; the hook is never detected
    /// structurally.
    fn as_setup(&self) -> Option<&dyn HasSetup> {
        None
    }

    /// Opt-in teardown capability, run after `perform`.
    fn as_tear_down(&self) -> Option<&dyn HasTearDown> {
        None
    }

    /// Hook names a handler ported from the legacy hook scheme still
    /// declares without the matching capability. Such handlers are rejected
    /// before execution; this only exists to make that rejection explicit.
    fn legacy_hooks(&self) -> &[&'static str] {
        &[]
    }
}

/// Capability marker for handlers with a setup hook.
#[async_trait]
pub trait HasSetup: Send + Sync {
    async fn set_up(&self) -> PerformResult;
}

/// Capability marker for handlers with a teardown hook.
#[async_trait]
pub trait HasTearDown: Send + Sync {
    async fn tear_down(&self) -> PerformResult;
}

/// Resolution policy mapping a job class identifier to its handler.
pub trait HandlerResolver: Send + Sync {
    fn resolve(&self, class: &str) -> Option<Arc<dyn JobHandler>>;
}

/// Registry-backed resolver: handlers are registered by class name at
/// startup.
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn JobHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        HandlerRegistry {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub fn register<H: JobHandler + 'static>(&self, class: impl Into<String>, handler: H) {
        self.handlers.write().insert(class.into(), Arc::new(handler));
    }

    pub fn has_handler(&self, class: &str) -> bool {
        self.handlers.read().contains_key(class)
    }

    pub fn classes(&self) -> Vec<String> {
        self.handlers.read().keys().cloned().collect()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerResolver for HandlerRegistry {
    fn resolve(&self, class: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers.read().get(class).cloned()
    }
}

/// Example handler that logs its arguments.
pub struct EchoHandler;

#[async_trait]
impl JobHandler for EchoHandler {
    async fn perform(&self, args: &[Value]) -> PerformResult {
        info!(?args, "echo");
        Ok(())
    }
}

/// Example handler that simulates work.
pub struct SleepHandler {
    duration: Duration,
}

impl SleepHandler {
    pub fn new(duration_ms: u64) -> Self {
        SleepHandler {
            duration: Duration::from_millis(duration_ms),
        }
    }
}

#[async_trait]
impl JobHandler for SleepHandler {
    async fn perform(&self, _args: &[Value]) -> PerformResult {
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registry_resolves_registered_classes() {
        let registry = HandlerRegistry::new();
        registry.register("echo", EchoHandler);

        assert!(registry.has_handler("echo"));
        assert!(!registry.has_handler("unknown"));

        let handler = registry.resolve("echo").unwrap();
        handler.perform(&[]).await.unwrap();
    }

    #[test]
    fn handlers_have_no_capabilities_by_default() {
        let handler = EchoHandler;
        assert!(handler.as_setup().is_none());
        assert!(handler.as_tear_down().is_none());
        assert!(handler.legacy_hooks().is_empty());
    }
}
