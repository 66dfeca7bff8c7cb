use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job lifecycle status, stored independently of the job payload.
///
/// Wire format is the numeric code (`1..=4`) used by the store schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum JobStatus {
    Waiting,
    Running,
    Failed,
    Complete,
}

impl JobStatus {
    /// Numeric status code as persisted by the store.
    pub fn code(&self) -> u8 {
        match self {
            JobStatus::Waiting => 1,
            JobStatus::Running => 2,
            JobStatus::Failed => 3,
            JobStatus::Complete => 4,
        }
    }

    /// Terminal statuses admit no further transitions for a job instance.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Complete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Waiting => "waiting",
            JobStatus::Running => "running",
            JobStatus::Failed => "failed",
            JobStatus::Complete => "complete",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<JobStatus> for u8 {
    fn from(status: JobStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for JobStatus {
    type Error = String;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        match code {
            1 => Ok(JobStatus::Waiting),
            2 => Ok(JobStatus::Running),
            3 => Ok(JobStatus::Failed),
            4 => Ok(JobStatus::Complete),
            other => Err(format!("unknown job status code {other}")),
        }
    }
}

/// Status packet persisted per job id: the status plus its last update time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: JobStatus,
    pub updated: DateTime<Utc>,
}

impl StatusRecord {
    pub fn now(status: JobStatus) -> Self {
        StatusRecord {
            status,
            updated: Utc::now(),
        }
    }
}
