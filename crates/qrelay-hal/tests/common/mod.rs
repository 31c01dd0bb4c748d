//! Scripted in-memory runtime service for job client tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use qrelay_compile::{BasisGates, CouplingMap, Target};
use qrelay_hal::{
    BackendDescriptor, EstimatorResult, ExecutionRequest, HalError, HalResult, JobId, JobSnapshot,
    JobStatus, ObservableSummary, RuntimeService,
};

struct MockJob {
    /// Statuses handed out by successive polls; the last one sticks.
    script: VecDeque<JobStatus>,
    labels: Vec<String>,
    cancelled: bool,
}

impl MockJob {
    fn current(&self) -> JobStatus {
        let status = self.script.front().cloned().unwrap_or(JobStatus::Queued);
        if self.cancelled && !status.is_terminal() {
            JobStatus::Cancelled
        } else {
            status
        }
    }

    fn advance(&mut self) -> JobStatus {
        let status = self.current();
        if self.script.len() > 1 {
            self.script.pop_front();
        }
        if status == JobStatus::Cancelled {
            self.script = VecDeque::from([JobStatus::Cancelled]);
        }
        status
    }
}

/// A runtime whose jobs follow a fixed status script and complete with
/// fixture values looked up by observable label.
pub struct MockRuntime {
    jobs: Mutex<FxHashMap<JobId, MockJob>>,
    script: Vec<JobStatus>,
    fixture: FxHashMap<String, ObservableSummary>,
    pub transient_failures: AtomicU32,
    pub reject_submissions: AtomicBool,
    pub cancel_races_completion: AtomicBool,
    pub truncate_results: AtomicBool,
    pub submits: AtomicUsize,
    pub polls: AtomicUsize,
    pub cancels: AtomicUsize,
}

impl MockRuntime {
    pub fn new(script: impl IntoIterator<Item = JobStatus>) -> Self {
        Self {
            jobs: Mutex::new(FxHashMap::default()),
            script: script.into_iter().collect(),
            fixture: FxHashMap::default(),
            transient_failures: AtomicU32::new(0),
            reject_submissions: AtomicBool::new(false),
            cancel_races_completion: AtomicBool::new(false),
            truncate_results: AtomicBool::new(false),
            submits: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
        }
    }

    /// Jobs that complete after queueing and running once each.
    pub fn completing() -> Self {
        Self::new([
            JobStatus::Submitted,
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Completed,
        ])
    }

    /// Bell-state fixture: `ZZ` and `XX` near +1, single-qubit terms near 0.
    pub fn with_bell_fixture(mut self) -> Self {
        for (label, value, err) in [
            ("IZ", 0.012, 0.031),
            ("IX", -0.008, 0.031),
            ("ZI", 0.004, 0.031),
            ("XI", -0.015, 0.032),
            ("ZZ", 0.982, 0.006),
            ("XX", 0.975, 0.007),
        ] {
            self.fixture
                .insert(label.to_string(), ObservableSummary::new(value, err));
        }
        self
    }

    /// Status of a job without advancing its script.
    pub fn peek(&self, job_id: &JobId) -> Option<JobStatus> {
        self.jobs.lock().unwrap().get(job_id).map(MockJob::current)
    }

    /// Observable labels a job was submitted with, in physical index space.
    pub fn labels(&self, job_id: &JobId) -> Option<Vec<String>> {
        self.jobs.lock().unwrap().get(job_id).map(|j| j.labels.clone())
    }

    fn result_for(&self, labels: &[String]) -> EstimatorResult {
        let mut summaries: Vec<_> = labels
            .iter()
            .map(|l| {
                self.fixture
                    .get(l)
                    .copied()
                    .unwrap_or(ObservableSummary::new(0.0, 0.0))
            })
            .collect();
        if self.truncate_results.load(Ordering::SeqCst) {
            summaries.pop();
        }
        EstimatorResult::new(summaries)
    }
}

pub fn device(num_qubits: u32) -> BackendDescriptor {
    BackendDescriptor::new(
        "mock_device",
        Target::new("mock_device", CouplingMap::linear(num_qubits), BasisGates::universal()),
    )
}

#[async_trait]
impl RuntimeService for MockRuntime {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(
        &self,
        _backend: &BackendDescriptor,
        request: &ExecutionRequest,
    ) -> HalResult<JobId> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if self.reject_submissions.load(Ordering::SeqCst) {
            return Err(HalError::Transport("401 Unauthorized: invalid token".into()));
        }

        let id = JobId::new(uuid::Uuid::new_v4().to_string());
        let job = MockJob {
            script: self.script.iter().cloned().collect(),
            labels: request.observables().iter().map(ToString::to_string).collect(),
            cancelled: false,
        };
        self.jobs.lock().unwrap().insert(id.clone(), job);
        Ok(id)
    }

    async fn poll(&self, job_id: &JobId) -> HalResult<JobSnapshot> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let pending_failures = self.transient_failures.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.transient_failures
                .store(pending_failures - 1, Ordering::SeqCst);
            return Err(HalError::Transport("connection reset by peer".into()));
        }

        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| HalError::JobNotFound(job_id.to_string()))?;
        let status = job.advance();
        if status == JobStatus::Completed {
            let labels = job.labels.clone();
            drop(jobs);
            return Ok(JobSnapshot::completed(self.result_for(&labels)));
        }
        Ok(JobSnapshot::pending(status))
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| HalError::JobNotFound(job_id.to_string()))?;

        if self.cancel_races_completion.load(Ordering::SeqCst) {
            job.script = VecDeque::from([JobStatus::Completed]);
            return Err(HalError::InvalidResponse(
                "job is in a terminal state".into(),
            ));
        }
        if job.current().is_terminal() {
            return Err(HalError::InvalidResponse(
                "job is in a terminal state".into(),
            ));
        }
        job.cancelled = true;
        Ok(())
    }
}
