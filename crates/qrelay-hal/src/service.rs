//! Remote execution service interface.
//!
//! | Method | Returns |
//! |--------|---------|
//! | `name()` | `&str` |
//! | `submit()` | `HalResult<JobId>` |
//! | `poll()` | `HalResult<JobSnapshot>` |
//! | `cancel()` | `HalResult<()>` |
//!
//! Implementations hold their own credentials and transport. They report
//! transient transport failures as [`HalError::Transport`] or
//! [`HalError::Network`] so that callers can retry them, and service
//! rejections of a submission as [`HalError::SubmissionFailed`].
//!
//! [`HalError::Transport`]: crate::HalError::Transport
//! [`HalError::Network`]: crate::HalError::Network
//! [`HalError::SubmissionFailed`]: crate::HalError::SubmissionFailed

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::BackendDescriptor;
use crate::error::HalResult;
use crate::job::{JobId, JobStatus};
use crate::request::ExecutionRequest;
use crate::result::EstimatorResult;

/// State of a job as reported by one status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Current state.
    pub status: JobStatus,
    /// Present once the job is `Completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<EstimatorResult>,
}

impl JobSnapshot {
    /// A snapshot of a job that has not produced a result.
    pub fn pending(status: JobStatus) -> Self {
        Self {
            status,
            result: None,
        }
    }

    /// A snapshot of a completed job.
    pub fn completed(result: EstimatorResult) -> Self {
        Self {
            status: JobStatus::Completed,
            result: Some(result),
        }
    }
}

/// Capability to run estimator requests remotely.
#[async_trait]
pub trait RuntimeService: Send + Sync {
    /// Service name, for logs.
    fn name(&self) -> &str;

    /// Submit a request to a backend. Returns the service-assigned id.
    ///
    /// Each call must yield a fresh id, even for identical requests.
    async fn submit(
        &self,
        backend: &BackendDescriptor,
        request: &ExecutionRequest,
    ) -> HalResult<JobId>;

    /// Query the current state of a job.
    async fn poll(&self, job_id: &JobId) -> HalResult<JobSnapshot>;

    /// Ask the service to cancel a job.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;
}
