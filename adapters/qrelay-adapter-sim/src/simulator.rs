//! Simulated estimator runtime.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use qrelay_compile::{BasisGates, CouplingMap, Target};
use qrelay_hal::{
    BackendDescriptor, BackendSelector, EstimatorResult, ExecutionRequest, HalError, HalResult,
    JobId, JobSnapshot, JobStatus, ObservableSummary, RuntimeService, ServiceConfig,
};

/// Largest register [`SimulatorRuntime::from_config`] will accept.
pub const MAX_SIM_QUBITS: u32 = 24;

/// Settings for [`SimulatorRuntime`].
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Backend name reported in descriptors.
    pub name: String,
    /// Device connectivity; also fixes the qubit count.
    pub coupling_map: CouplingMap,
    /// Polls answered with `Queued` before the job runs.
    pub queue_polls: u32,
    /// Polls answered with `Running` before the job completes.
    pub run_polls: u32,
    /// Draw finite-shot estimates instead of exact values.
    pub shot_noise: bool,
    /// Seed for shot noise.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "statevector_simulator".to_string(),
            coupling_map: CouplingMap::full(5),
            queue_polls: 0,
            run_polls: 0,
            shot_noise: false,
            seed: None,
        }
    }
}

/// Job data for the simulator.
struct SimJob {
    polls: u32,
    cancelled: bool,
    result: EstimatorResult,
}

/// Local estimator runtime.
///
/// Expectation values are computed from the full statevector at submission
/// time; the job then walks through `Queued` and `Running` for the
/// configured number of polls before reporting `Completed`.
pub struct SimulatorRuntime {
    config: SimConfig,
    descriptor: BackendDescriptor,
    jobs: Arc<Mutex<FxHashMap<JobId, SimJob>>>,
    rng: Mutex<StdRng>,
}

impl SimulatorRuntime {
    /// Create a runtime with default settings.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Create a runtime from explicit settings.
    pub fn with_config(config: SimConfig) -> Self {
        let descriptor = BackendDescriptor::new(
            config.name.clone(),
            Target::new(
                config.name.clone(),
                config.coupling_map.clone(),
                BasisGates::universal(),
            ),
        )
        .simulator();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            descriptor,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            rng: Mutex::new(rng),
        }
    }

    /// Create a runtime from service configuration.
    ///
    /// Recognized `extra` keys: `num_qubits`, `queue_polls`, `run_polls`,
    /// `shot_noise`, `seed`. The backend name comes from `backend`.
    pub fn from_config(config: &ServiceConfig) -> HalResult<Self> {
        let get_u64 = |key: &str| -> HalResult<Option<u64>> {
            config
                .extra
                .get(key)
                .map(|v| {
                    v.as_u64().ok_or_else(|| {
                        HalError::Configuration(format!("{key} must be a non-negative integer"))
                    })
                })
                .transpose()
        };
        let to_u32 = |key: &str, v: u64| {
            u32::try_from(v).map_err(|_| HalError::Configuration(format!("{key} is too large")))
        };

        let mut sim = SimConfig::default();
        if let Some(name) = &config.backend {
            sim.name.clone_from(name);
        }
        if let Some(n) = get_u64("num_qubits")? {
            let n = to_u32("num_qubits", n)?;
            if n == 0 || n > MAX_SIM_QUBITS {
                return Err(HalError::Configuration(format!(
                    "num_qubits must be between 1 and {MAX_SIM_QUBITS}, got {n}"
                )));
            }
            sim.coupling_map = CouplingMap::full(n);
        }
        if let Some(n) = get_u64("queue_polls")? {
            sim.queue_polls = to_u32("queue_polls", n)?;
        }
        if let Some(n) = get_u64("run_polls")? {
            sim.run_polls = to_u32("run_polls", n)?;
        }
        sim.seed = get_u64("seed")?;
        sim.shot_noise = config
            .extra
            .get("shot_noise")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(sim.seed.is_some());

        Ok(Self::with_config(sim))
    }

    /// Descriptor of the simulated device.
    pub fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    /// Compute per-observable summaries for a request.
    #[instrument(skip_all, fields(observables = request.num_observables()))]
    fn estimate(&self, request: &ExecutionRequest) -> HalResult<EstimatorResult> {
        let start = Instant::now();
        let shots = request.options().shots;
        let state = crate::Statevector::from_circuit(request.circuit().circuit());

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let summaries = request
            .observables()
            .iter()
            .map(|obs| {
                let exact = state.expectation(obs).ok_or_else(|| {
                    HalError::InvalidArgument(format!(
                        "observable {obs} does not span the {}-qubit circuit",
                        state.num_qubits()
                    ))
                })?;
                let value = if self.config.shot_noise {
                    sample_mean(&mut *rng, exact, shots)
                } else {
                    exact
                };
                Ok(ObservableSummary::new(value, shot_error(value, shots)))
            })
            .collect::<HalResult<Vec<_>>>()?;

        debug!("Simulation completed in {:?}", start.elapsed());
        Ok(EstimatorResult::new(summaries)
            .with_metadata("backend", serde_json::json!(self.config.name))
            .with_metadata("shots", serde_json::json!(shots))
            .with_metadata(
                "resilience_level",
                serde_json::json!(request.options().resilience_level),
            ))
    }

    fn status_after(&self, polls: u32) -> JobStatus {
        if polls <= self.config.queue_polls {
            JobStatus::Queued
        } else if polls <= self.config.queue_polls + self.config.run_polls {
            JobStatus::Running
        } else {
            JobStatus::Completed
        }
    }
}

impl Default for SimulatorRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean of `shots` ±1 outcomes whose expectation is `exact`.
fn sample_mean(rng: &mut impl Rng, exact: f64, shots: u32) -> f64 {
    let p_plus = ((1.0 + exact) / 2.0).clamp(0.0, 1.0);
    let plus = (0..shots).filter(|_| rng.gen_bool(p_plus)).count() as f64;
    2.0 * plus / f64::from(shots) - 1.0
}

/// Standard error of a mean of `shots` ±1 outcomes.
fn shot_error(value: f64, shots: u32) -> f64 {
    ((1.0 - value * value).max(0.0) / f64::from(shots)).sqrt()
}

#[async_trait]
impl RuntimeService for SimulatorRuntime {
    fn name(&self) -> &str {
        &self.config.name
    }

    #[instrument(skip(self, backend, request), fields(backend = %backend.name))]
    async fn submit(
        &self,
        backend: &BackendDescriptor,
        request: &ExecutionRequest,
    ) -> HalResult<JobId> {
        if backend.name != self.descriptor.name {
            return Err(HalError::SubmissionFailed(format!(
                "unknown backend '{}'",
                backend.name
            )));
        }
        let width = request.circuit().physical_qubits();
        if width > self.descriptor.num_qubits() {
            return Err(HalError::SubmissionFailed(format!(
                "circuit has {width} qubits but {} only has {}",
                self.descriptor.name,
                self.descriptor.num_qubits()
            )));
        }

        let result = self.estimate(request)?;
        let job_id = JobId::new(Uuid::new_v4().to_string());

        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                job_id.clone(),
                SimJob {
                    polls: 0,
                    cancelled: false,
                    result,
                },
            );

        debug!("Submitted job: {}", job_id);
        Ok(job_id)
    }

    async fn poll(&self, job_id: &JobId) -> HalResult<JobSnapshot> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;

        if job.cancelled {
            return Ok(JobSnapshot::pending(JobStatus::Cancelled));
        }
        job.polls = job.polls.saturating_add(1);
        Ok(match self.status_after(job.polls) {
            JobStatus::Completed => JobSnapshot::completed(job.result.clone()),
            status => JobSnapshot::pending(status),
        })
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;

        // A finished job stays finished.
        if !self.status_after(job.polls).is_terminal() {
            job.cancelled = true;
        }
        Ok(())
    }
}

#[async_trait]
impl BackendSelector for SimulatorRuntime {
    async fn backends(&self) -> HalResult<Vec<BackendDescriptor>> {
        Ok(vec![self.descriptor.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrelay_compile::{LayoutOptimizer, Optimizer};
    use qrelay_hal::RunOptions;
    use qrelay_ir::{Circuit, Observable};

    fn bell_request(runtime: &SimulatorRuntime, options: RunOptions) -> ExecutionRequest {
        let placed = LayoutOptimizer::new()
            .optimize(&Circuit::bell().unwrap(), &runtime.descriptor().target, 0)
            .unwrap();
        ExecutionRequest::builder(placed)
            .observables(
                ["ZZ", "XX", "ZI"]
                    .iter()
                    .map(|l| l.parse::<Observable>().unwrap()),
            )
            .options(options)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_exact_bell_estimates() {
        let runtime = SimulatorRuntime::new();
        let request = bell_request(&runtime, RunOptions::with_shots(1000));
        let job_id = runtime.submit(runtime.descriptor(), &request).await.unwrap();

        let snapshot = runtime.poll(&job_id).await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Completed);
        let result = snapshot.result.unwrap();
        let (zz, zz_err) = result.extract(0).unwrap();
        assert!((zz - 1.0).abs() < 1e-10);
        assert!(zz_err.abs() < 1e-6);
        let (zi, zi_err) = result.extract(2).unwrap();
        assert!(zi.abs() < 1e-10);
        assert!((zi_err - (1.0f64 / 1000.0).sqrt()).abs() < 1e-10);
        assert_eq!(result.metadata["shots"], 1000);
    }

    #[tokio::test]
    async fn test_lifecycle_follows_poll_counts() {
        let runtime = SimulatorRuntime::with_config(SimConfig {
            queue_polls: 2,
            run_polls: 1,
            ..SimConfig::default()
        });
        let request = bell_request(&runtime, RunOptions::default());
        let job_id = runtime.submit(runtime.descriptor(), &request).await.unwrap();

        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(runtime.poll(&job_id).await.unwrap().status);
        }
        assert_eq!(
            seen,
            vec![
                JobStatus::Queued,
                JobStatus::Queued,
                JobStatus::Running,
                JobStatus::Completed,
                JobStatus::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_pending_and_finished() {
        let runtime = SimulatorRuntime::with_config(SimConfig {
            queue_polls: 5,
            ..SimConfig::default()
        });
        let request = bell_request(&runtime, RunOptions::default());
        let job_id = runtime.submit(runtime.descriptor(), &request).await.unwrap();
        runtime.cancel(&job_id).await.unwrap();
        assert_eq!(
            runtime.poll(&job_id).await.unwrap().status,
            JobStatus::Cancelled
        );

        let quick = SimulatorRuntime::new();
        let request = bell_request(&quick, RunOptions::default());
        let job_id = quick.submit(quick.descriptor(), &request).await.unwrap();
        quick.poll(&job_id).await.unwrap();
        quick.cancel(&job_id).await.unwrap();
        assert_eq!(
            quick.poll(&job_id).await.unwrap().status,
            JobStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_seeded_noise_is_reproducible() {
        let config = SimConfig {
            shot_noise: true,
            seed: Some(7),
            ..SimConfig::default()
        };
        let a = SimulatorRuntime::with_config(config.clone());
        let b = SimulatorRuntime::with_config(config);

        let mut values = Vec::new();
        for runtime in [&a, &b] {
            let request = bell_request(runtime, RunOptions::with_shots(2000));
            let id = runtime.submit(runtime.descriptor(), &request).await.unwrap();
            values.push(runtime.poll(&id).await.unwrap().result.unwrap().values());
        }
        assert_eq!(values[0], values[1]);
        // ZZ is an eigenvalue: no noise. ZI is a fair coin.
        assert_eq!(values[0][0], 1.0);
        assert!(values[0][2].abs() < 0.1);
    }

    #[tokio::test]
    async fn test_rejects_foreign_backend() {
        let runtime = SimulatorRuntime::new();
        let request = bell_request(&runtime, RunOptions::default());
        let other = runtime.descriptor().clone();
        let other = BackendDescriptor {
            name: "ibm_kyiv".into(),
            ..other
        };
        assert!(matches!(
            runtime.submit(&other, &request).await,
            Err(HalError::SubmissionFailed(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = ServiceConfig::new()
            .with_backend("fake_sim")
            .with_extra("num_qubits", serde_json::json!(3))
            .with_extra("queue_polls", serde_json::json!(2))
            .with_extra("seed", serde_json::json!(11));
        let runtime = SimulatorRuntime::from_config(&config).unwrap();

        assert_eq!(runtime.descriptor().name, "fake_sim");
        assert_eq!(runtime.descriptor().num_qubits(), 3);
        assert!(runtime.descriptor().simulator);
        assert!(runtime.config.shot_noise);

        for bad in [
            ServiceConfig::new().with_extra("run_polls", serde_json::json!("many")),
            ServiceConfig::new().with_extra("num_qubits", serde_json::json!(40)),
        ] {
            assert!(matches!(
                SimulatorRuntime::from_config(&bad),
                Err(HalError::Configuration(_))
            ));
        }
    }
}
