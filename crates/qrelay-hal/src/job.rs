//! Job lifecycle types.
//!
//! The job state machine:
//!
//! ```text
//!   submit() ──→ Submitted ──→ Queued ──→ Running ──→ Completed
//!                    │            │          │
//!                    │            │          ├──→ Failed(reason)
//!                    │            │          │
//!                    └────────────┴──────────┴──→ Cancelled
//! ```
//!
//! Transitions past `Submitted` are driven by the remote service. Terminal
//! states (`Completed`, `Failed`, `Cancelled`) are permanent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a job, assigned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Accepted by the service, not yet scheduled.
    Submitted,
    /// Job is waiting in queue.
    Queued,
    /// Job is currently running.
    Running,
    /// Job completed successfully.
    Completed,
    /// Job failed with an error message.
    Failed(String),
    /// Job was cancelled.
    Cancelled,
}

impl JobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }

    /// Check if the job is still pending.
    pub fn is_pending(&self) -> bool {
        !self.is_terminal()
    }

    /// Check if the job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Submitted => write!(f, "Submitted"),
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed(msg) => write!(f, "Failed: {msg}"),
            JobStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Client-side handle to a submitted job.
///
/// A handle carries only what the client needs to track the job; the remote
/// service remains the source of truth for its state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobHandle {
    /// The job identifier.
    pub id: JobId,
    /// Backend the job was submitted to.
    pub backend: String,
    /// Number of observables in the request.
    pub num_observables: usize,
    /// Shots requested.
    pub shots: u32,
    /// Time the job was submitted.
    pub submitted_at: DateTime<Utc>,
}

impl JobHandle {
    /// Create a handle stamped with the current time.
    pub fn new(
        id: impl Into<JobId>,
        backend: impl Into<String>,
        num_observables: usize,
        shots: u32,
    ) -> Self {
        Self {
            id: id.into(),
            backend: backend.into(),
            num_observables,
            shots,
            submitted_at: Utc::now(),
        }
    }
}
