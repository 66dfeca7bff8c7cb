use thiserror::Error;

/// Errors surfaced by store adapters.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("status queries are not supported by this job adapter")]
    StatusQueryUnsupported,
}

impl StoreError {
    /// Wrap a transport/client error from a concrete store backend.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Outcomes of running a job body that are not clean completions.
///
/// `Skip` is the voluntary early-exit escape hatch: it is neither a success
/// nor a failure and must not produce a status write. Every other variant is
/// routed to the failure path (status `Failed` plus a persisted record).
#[derive(Error, Debug)]
pub enum JobError {
    #[error("job declined to run")]
    Skip,

    #[error("{0}")]
    Failed(String),

    #[error("no handler registered for job class {0}")]
    UnknownClass(String),

    #[error("handler {class} declares legacy {hook} hook without the capability marker")]
    LegacyHooks { class: String, hook: &'static str },

    #[error("job exited abnormally: {0}")]
    AbnormalExit(String),
}

impl JobError {
    /// Short kind tag recorded in the `exception` field of failure records.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Skip => "Skip",
            JobError::Failed(_) => "Failed",
            JobError::UnknownClass(_) => "UnknownClass",
            JobError::LegacyHooks { .. } => "LegacyHooks",
            JobError::AbnormalExit(_) => "AbnormalExit",
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        JobError::Failed(message.into())
    }
}

impl From<anyhow::Error> for JobError {
    fn from(err: anyhow::Error) -> Self {
        JobError::Failed(format!("{err:#}"))
    }
}

/// Collect the `source()` chain of an error as display lines.
pub fn source_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = err.source();

    while let Some(cause) = current {
        lines.push(cause.to_string());
        current = cause.source();
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_are_distinct() {
        let errors = [
            JobError::Skip,
            JobError::failed("boom"),
            JobError::UnknownClass("X".into()),
            JobError::LegacyHooks {
                class: "X".into(),
                hook: "set_up",
            },
            JobError::AbnormalExit("code 1".into()),
        ];

        let mut kinds: Vec<_> = errors.iter().map(|e| e.kind()).collect();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn anyhow_errors_become_failures() {
        let err: JobError = anyhow::anyhow!("db unavailable").into();
        assert_eq!(err.kind(), "Failed");
        assert!(err.to_string().contains("db unavailable"));
    }

    #[test]
    fn status_query_unsupported_is_distinct_from_backend() {
        let unsupported = StoreError::StatusQueryUnsupported;
        assert!(matches!(unsupported, StoreError::StatusQueryUnsupported));

        let backend = StoreError::backend(std::io::Error::other("gone"));
        assert!(matches!(backend, StoreError::Backend(_)));
    }
}
