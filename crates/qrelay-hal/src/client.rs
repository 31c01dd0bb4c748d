//! Job client: submission, polling and cancellation.
//!
//! A [`JobClient`] binds one [`RuntimeService`] to one read-only
//! [`BackendDescriptor`]. It validates requests before they cross the
//! network, hands out independent [`JobHandle`]s, and turns the service's
//! asynchronous lifecycle into a single suspending [`JobClient::result`]
//! call.
//!
//! Polling tolerates transient query failures: each failed query is retried
//! after an exponential backoff until [`PollConfig::max_retries`] consecutive
//! failures, at which point the wait fails with
//! [`HalError::RemoteUnavailable`]. Retries share the wait's deadline, so
//! a wait that runs out of time while retrying reports
//! [`HalError::Timeout`]. A local timeout never cancels the job.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

use crate::backend::BackendDescriptor;
use crate::config::PollConfig;
use crate::error::{HalError, HalResult};
use crate::job::{JobHandle, JobId, JobStatus};
use crate::request::ExecutionRequest;
use crate::result::EstimatorResult;
use crate::service::{JobSnapshot, RuntimeService};

/// Submits requests to one backend and tracks the resulting jobs.
///
/// Cloning is cheap; clones share the service and descriptor.
#[derive(Clone)]
pub struct JobClient {
    service: Arc<dyn RuntimeService>,
    backend: Arc<BackendDescriptor>,
    poll: PollConfig,
}

impl std::fmt::Debug for JobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobClient")
            .field("service", &self.service.name())
            .field("backend", &self.backend.name)
            .field("poll", &self.poll)
            .finish()
    }
}

impl JobClient {
    /// Create a client with default polling.
    pub fn new(service: Arc<dyn RuntimeService>, backend: BackendDescriptor) -> Self {
        Self {
            service,
            backend: Arc::new(backend),
            poll: PollConfig::default(),
        }
    }

    /// Replace the polling configuration.
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// The backend this client submits to.
    pub fn backend(&self) -> &BackendDescriptor {
        &self.backend
    }

    /// The polling configuration used by [`wait`](Self::wait).
    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Validate and submit a request.
    ///
    /// Validation failures are reported as-is and never reach the service.
    /// Anything the service rejects becomes [`HalError::SubmissionFailed`].
    #[instrument(skip(self, request), fields(backend = %self.backend.name, observables = request.num_observables()))]
    pub async fn submit(&self, request: &ExecutionRequest) -> HalResult<JobHandle> {
        request.validate()?;

        let width = request.circuit().physical_qubits();
        if width > self.backend.num_qubits() {
            return Err(HalError::InvalidArgument(format!(
                "circuit spans {width} qubits, backend {} has {}",
                self.backend.name,
                self.backend.num_qubits()
            )));
        }

        let job_id = self
            .service
            .submit(&self.backend, request)
            .await
            .map_err(|e| match e {
                e @ (HalError::SubmissionFailed(_)
                | HalError::InvalidArgument(_)
                | HalError::IndexOutOfRange { .. }) => e,
                other => HalError::SubmissionFailed(other.to_string()),
            })?;

        info!(job_id = %job_id, shots = request.options().shots, "job submitted");
        Ok(JobHandle::new(
            job_id,
            self.backend.name.clone(),
            request.num_observables(),
            request.options().shots,
        ))
    }

    /// Current state of a job.
    pub async fn status(&self, handle: &JobHandle) -> HalResult<JobStatus> {
        Ok(self.query(&handle.id, &WaitBudget::unbounded()).await?.status)
    }

    /// Wait for a job using the configured interval and timeout.
    pub async fn wait(&self, handle: &JobHandle) -> HalResult<EstimatorResult> {
        self.result(handle, self.poll.poll_interval, self.poll.timeout)
            .await
    }

    /// Poll until the job is terminal or `timeout` has elapsed.
    ///
    /// The job is queried at least once, so a zero timeout still returns the
    /// result of a job that has already completed. A timeout too large to
    /// represent as a deadline waits without bound.
    #[instrument(skip(self, handle), fields(job_id = %handle.id))]
    pub async fn result(
        &self,
        handle: &JobHandle,
        poll_interval: Duration,
        timeout: Duration,
    ) -> HalResult<EstimatorResult> {
        let budget = WaitBudget::new(timeout);
        let mut polls = 0u32;

        loop {
            let snapshot = self.query(&handle.id, &budget).await?;
            polls += 1;

            match snapshot.status {
                JobStatus::Completed => {
                    debug!(polls, "job completed");
                    return Self::completed(handle, snapshot.result);
                }
                JobStatus::Failed(reason) => {
                    return Err(HalError::JobFailed {
                        job_id: handle.id.clone(),
                        reason,
                    });
                }
                JobStatus::Cancelled => {
                    return Err(HalError::JobCancelled {
                        job_id: handle.id.clone(),
                    });
                }
                status @ (JobStatus::Submitted | JobStatus::Queued | JobStatus::Running) => {
                    let Some(remaining) = budget.remaining() else {
                        warn!(%status, polls, "gave up waiting for job");
                        return Err(budget.expired(&handle.id));
                    };
                    debug!(%status, polls, "job pending");
                    sleep(poll_interval.min(remaining)).await;
                }
            }
        }
    }

    /// Request cancellation of a job.
    ///
    /// Cancelling a terminal job is a no-op. If the service refuses the
    /// cancel because the job has just reached a terminal state, that also
    /// counts as success.
    #[instrument(skip(self, handle), fields(job_id = %handle.id))]
    pub async fn cancel(&self, handle: &JobHandle) -> HalResult<()> {
        let status = self.status(handle).await?;
        if status.is_terminal() {
            debug!(%status, "job already terminal, nothing to cancel");
            return Ok(());
        }

        match self.service.cancel(&handle.id).await {
            Ok(()) => {
                info!("cancellation requested");
                Ok(())
            }
            Err(e) => match self.status(handle).await {
                Ok(status) if status.is_terminal() => {
                    debug!(%status, error = %e, "cancel raced with completion");
                    Ok(())
                }
                _ => Err(e),
            },
        }
    }

    fn completed(handle: &JobHandle, result: Option<EstimatorResult>) -> HalResult<EstimatorResult> {
        let result = result.ok_or_else(|| {
            HalError::InvalidResponse(format!("job {} completed without a result", handle.id))
        })?;
        if result.len() != handle.num_observables {
            return Err(HalError::InvalidResponse(format!(
                "job {} returned {} results for {} observables",
                handle.id,
                result.len(),
                handle.num_observables
            )));
        }
        Ok(result)
    }

    /// One status query, retrying transient failures with backoff until
    /// the retry budget or `budget`'s deadline runs out.
    async fn query(&self, job_id: &JobId, budget: &WaitBudget) -> HalResult<JobSnapshot> {
        let mut failures = 0u32;
        loop {
            match self.service.poll(job_id).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) if e.is_transient() => {
                    failures += 1;
                    let Some(remaining) = budget.remaining() else {
                        warn!(job_id = %job_id, attempt = failures, error = %e, "deadline passed while retrying status query");
                        return Err(budget.expired(job_id));
                    };
                    if failures > self.poll.max_retries {
                        return Err(HalError::RemoteUnavailable {
                            job_id: job_id.clone(),
                            attempts: failures,
                            last_error: e.to_string(),
                        });
                    }
                    let backoff = self.poll.backoff(failures).min(remaining);
                    warn!(
                        job_id = %job_id,
                        attempt = failures,
                        error = %e,
                        "Retrying status query after transient failure (backoff {:?})",
                        backoff
                    );
                    sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Time limit shared by every query of one wait.
#[derive(Debug, Clone, Copy)]
struct WaitBudget {
    start: Instant,
    /// `None` when there is no deadline.
    deadline: Option<Instant>,
}

impl WaitBudget {
    fn new(timeout: Duration) -> Self {
        let start = Instant::now();
        Self {
            start,
            deadline: start.checked_add(timeout),
        }
    }

    fn unbounded() -> Self {
        Self {
            start: Instant::now(),
            deadline: None,
        }
    }

    /// Time left before the deadline, or `None` once it has passed.
    fn remaining(&self) -> Option<Duration> {
        match self.deadline {
            Some(deadline) => deadline
                .checked_duration_since(Instant::now())
                .filter(|left| !left.is_zero()),
            None => Some(Duration::MAX),
        }
    }

    fn expired(&self, job_id: &JobId) -> HalError {
        HalError::Timeout {
            job_id: job_id.clone(),
            waited: self.start.elapsed(),
        }
    }
}
