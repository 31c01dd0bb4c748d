//! IBM Quantum estimator runtime.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use qrelay_compile::{BasisGates, CouplingMap, Target};
use qrelay_hal::{
    BackendDescriptor, BackendSelector, EstimatorResult, ExecutionRequest, HalError, HalResult,
    JobId, JobSnapshot, JobStatus, RuntimeService, ServiceConfig,
};

use crate::api::{
    BackendInfo, EstimatorOptions, EstimatorPub, IbmClient, JobResultResponse, JobStatusResponse,
    LEGACY_ENDPOINT,
};
use crate::error::{IbmError, IbmResult};
use crate::qasm;

/// How long to cache the backend list before refreshing it.
const BACKEND_LIST_TTL: Duration = Duration::from_secs(5 * 60);

/// Estimator runtime backed by IBM Quantum.
pub struct IbmRuntime {
    client: Arc<IbmClient>,
    backends: RwLock<Option<(Vec<BackendDescriptor>, Instant)>>,
}

impl IbmRuntime {
    /// Wrap an API client.
    pub fn new(client: IbmClient) -> Self {
        Self {
            client: Arc::new(client),
            backends: RwLock::new(None),
        }
    }

    /// Connect using credentials from the environment.
    ///
    /// `IBM_API_KEY` + `IBM_SERVICE_CRN` select the Cloud API; otherwise
    /// `IBM_QUANTUM_TOKEN` selects the legacy endpoint.
    pub async fn connect() -> IbmResult<Self> {
        if let Ok(api_key) = std::env::var("IBM_API_KEY") {
            let service_crn =
                std::env::var("IBM_SERVICE_CRN").map_err(|_| IbmError::MissingServiceCrn)?;
            info!("connecting to IBM Cloud API (IAM key exchange)");
            let client = IbmClient::connect(&api_key, &service_crn).await?;
            return Ok(Self::new(client));
        }

        if let Ok(token) = std::env::var("IBM_QUANTUM_TOKEN") {
            info!("falling back to legacy IBM Quantum token");
            return Ok(Self::new(IbmClient::new(LEGACY_ENDPOINT, &token)?));
        }

        Err(IbmError::MissingToken)
    }

    /// Create a runtime from explicit configuration (legacy token mode).
    pub fn from_config(config: &ServiceConfig) -> IbmResult<Self> {
        let token = config.token.as_deref().ok_or(IbmError::MissingToken)?;
        let endpoint = config.endpoint.as_deref().unwrap_or(LEGACY_ENDPOINT);

        let mut client = IbmClient::new(endpoint, token)?;
        if let Some(instance) = &config.instance {
            client = client.with_instance(instance);
        }
        Ok(Self::new(client))
    }

    /// Describe one backend by name.
    pub async fn backend(&self, name: &str) -> HalResult<BackendDescriptor> {
        let info = self.client.get_backend(name).await?;
        Ok(descriptor(info))
    }

    async fn fetch_result(&self, job_id: &JobId) -> IbmResult<EstimatorResult> {
        let response = self.client.get_job_results(job_id.as_str()).await?;
        into_estimator_result(response)
    }
}

/// Build a descriptor from API backend info.
fn descriptor(info: BackendInfo) -> BackendDescriptor {
    let coupling_map = CouplingMap::from_edges(
        info.num_qubits,
        info.coupling_map.iter().map(|&[a, b]| (a, b)),
    );
    let basis_gates = if info.basis_gates.is_empty() {
        BasisGates::heron()
    } else {
        BasisGates::new(info.basis_gates)
    };

    let mut backend = BackendDescriptor::new(
        info.name.clone(),
        Target::new(info.name, coupling_map, basis_gates),
    )
    .with_operational(info.status.operational)
    .with_pending_jobs(info.status.pending_jobs.unwrap_or(0));
    if info.simulator {
        backend = backend.simulator();
    }
    backend
}

/// Map a service status string onto the job lifecycle.
fn job_status(status: &JobStatusResponse) -> JobStatus {
    match status.status.to_uppercase().as_str() {
        "INITIALIZING" | "VALIDATING" => JobStatus::Submitted,
        "QUEUED" => JobStatus::Queued,
        "RUNNING" => JobStatus::Running,
        "COMPLETED" | "DONE" => JobStatus::Completed,
        "FAILED" | "ERROR" => JobStatus::Failed(
            status
                .error_message()
                .unwrap_or_else(|| "Unknown error".to_string()),
        ),
        s if s.starts_with("CANCELLED") => JobStatus::Cancelled,
        other => {
            warn!(job_id = %status.id, status = other, "unknown job status, treating as running");
            JobStatus::Running
        }
    }
}

/// Convert the single-PUB estimator payload.
fn into_estimator_result(response: JobResultResponse) -> IbmResult<EstimatorResult> {
    let mut results = response.results.into_iter();
    let pub_result = results
        .next()
        .ok_or_else(|| IbmError::MalformedResult("no PUB results".into()))?;
    if results.next().is_some() {
        return Err(IbmError::MalformedResult(
            "expected a single PUB result".into(),
        ));
    }

    let data = pub_result.data;
    let stds = if data.stds.is_empty() {
        vec![0.0; data.evs.len()]
    } else {
        data.stds
    };
    let mut result = EstimatorResult::from_arrays(&data.evs, &stds)
        .map_err(|e| IbmError::MalformedResult(e.to_string()))?;
    if let Some(serde_json::Value::Object(metadata)) = pub_result.metadata {
        result.metadata = metadata;
    }
    Ok(result)
}

#[async_trait]
impl RuntimeService for IbmRuntime {
    fn name(&self) -> &str {
        "ibm"
    }

    #[instrument(skip(self, backend, request), fields(backend = %backend.name))]
    async fn submit(
        &self,
        backend: &BackendDescriptor,
        request: &ExecutionRequest,
    ) -> HalResult<JobId> {
        let circuit = qasm::emit(request.circuit().circuit());
        let labels = request
            .observables()
            .iter()
            .map(|o| o.to_little_endian_label())
            .collect();
        let options = EstimatorOptions {
            resilience_level: request.options().resilience_level,
            default_shots: request.options().shots,
        };

        let response = self
            .client
            .submit_estimator_job(&backend.name, vec![EstimatorPub(circuit, labels)], options)
            .await
            .map_err(|e| HalError::SubmissionFailed(e.to_string()))?;

        debug!(job_id = %response.id, "estimator job accepted");
        Ok(JobId::new(response.id))
    }

    async fn poll(&self, job_id: &JobId) -> HalResult<JobSnapshot> {
        let status = self.client.get_job_status(job_id.as_str()).await?;
        match job_status(&status) {
            JobStatus::Completed => Ok(JobSnapshot::completed(self.fetch_result(job_id).await?)),
            other => Ok(JobSnapshot::pending(other)),
        }
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.client.cancel_job(job_id.as_str()).await?;
        Ok(())
    }
}

#[async_trait]
impl BackendSelector for IbmRuntime {
    async fn backends(&self) -> HalResult<Vec<BackendDescriptor>> {
        {
            let cached = self.backends.read().await;
            if let Some((ref list, fetched_at)) = *cached {
                if fetched_at.elapsed() < BACKEND_LIST_TTL {
                    return Ok(list.clone());
                }
            }
        }

        let list: Vec<BackendDescriptor> = self
            .client
            .list_backends()
            .await?
            .into_iter()
            .map(descriptor)
            .collect();
        debug!(count = list.len(), "refreshed backend list");

        *self.backends.write().await = Some((list.clone(), Instant::now()));
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::BackendStatus;

    fn status(json: &str) -> JobStatusResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            job_status(&status(r#"{"id": "j", "status": "Queued"}"#)),
            JobStatus::Queued
        );
        assert_eq!(
            job_status(&status(r#"{"id": "j", "status": "RUNNING"}"#)),
            JobStatus::Running
        );
        assert_eq!(
            job_status(&status(r#"{"id": "j", "status": "Completed"}"#)),
            JobStatus::Completed
        );
        assert_eq!(
            job_status(&status(
                r#"{"id": "j", "status": "Cancelled - Ran too long"}"#
            )),
            JobStatus::Cancelled
        );
        assert_eq!(
            job_status(&status(
                r#"{"id": "j", "status": "Failed", "state": {"reason": "bad circuit"}}"#
            )),
            JobStatus::Failed("bad circuit".into())
        );
    }

    #[test]
    fn test_descriptor_from_info() {
        let info = BackendInfo {
            name: "ibm_torino".into(),
            num_qubits: 3,
            status: BackendStatus {
                operational: true,
                status_msg: Some("active".into()),
                pending_jobs: Some(7),
            },
            basis_gates: vec!["cz".into(), "rz".into(), "sx".into()],
            coupling_map: vec![[0, 1], [1, 0], [1, 2]],
            simulator: false,
        };
        let backend = descriptor(info);

        assert_eq!(backend.name, "ibm_torino");
        assert_eq!(backend.num_qubits(), 3);
        assert_eq!(backend.pending_jobs, 7);
        assert!(!backend.simulator);
        assert_eq!(backend.target.coupling_map.edges().len(), 2);
        assert!(backend.target.basis_gates.contains("cz"));
    }

    #[test]
    fn test_estimator_result_conversion() {
        let response: JobResultResponse = serde_json::from_str(
            r#"{"results": [{"data": {"evs": [0.98, -0.01], "stds": [0.006, 0.03]}, "metadata": {"shots": 1000}}]}"#,
        )
        .unwrap();
        let result = into_estimator_result(response).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.extract(1).unwrap(), (-0.01, 0.03));
        assert_eq!(result.metadata["shots"], 1000);
    }

    #[test]
    fn test_estimator_result_rejects_mismatch() {
        let response: JobResultResponse = serde_json::from_str(
            r#"{"results": [{"data": {"evs": [0.98, -0.01], "stds": [0.006]}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            into_estimator_result(response),
            Err(IbmError::MalformedResult(_))
        ));

        let empty: JobResultResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(into_estimator_result(empty).is_err());
    }

    #[test]
    fn test_from_config_requires_token() {
        assert!(matches!(
            IbmRuntime::from_config(&ServiceConfig::new()),
            Err(IbmError::MissingToken)
        ));
        let runtime = IbmRuntime::from_config(
            &ServiceConfig::new()
                .with_token("secret")
                .with_instance("hub/group/project"),
        )
        .unwrap();
        assert_eq!(runtime.name(), "ibm");
    }
}
