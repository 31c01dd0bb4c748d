//! IBM Quantum Platform API client.
//!
//! Covers the REST calls an estimator workflow needs:
//! - Authentication via IAM token exchange, or a legacy direct token
//! - Listing backends with their configuration and queue length
//! - Submitting Estimator V2 jobs
//! - Polling job status, fetching results, cancelling
//!
//! Supports both the IBM Cloud API (`quantum.cloud.ibm.com/api`) and the
//! legacy endpoint (`api.quantum-computing.ibm.com`).

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode, header};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{IbmError, IbmResult};

/// Default IBM Quantum Cloud API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://quantum.cloud.ibm.com/api";

/// Legacy IBM Quantum API endpoint.
pub const LEGACY_ENDPOINT: &str = "https://api.quantum-computing.ibm.com";

/// IBM Cloud IAM token endpoint.
const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// IBM API version header value.
const IBM_API_VERSION: &str = "2026-02-01";

/// User-Agent sent with requests (Cloudflare blocks the default reqwest UA).
const USER_AGENT: &str = concat!("qrelay/", env!("CARGO_PKG_VERSION"));

/// IBM Quantum API client.
pub struct IbmClient {
    client: Client,
    endpoint: String,
    /// Hub/group/project, legacy mode only.
    instance: Option<String>,
    cloud_api: bool,
}

impl fmt::Debug for IbmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IbmClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("instance", &self.instance)
            .field("cloud_api", &self.cloud_api)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
}

fn default_headers(bearer: &str) -> IbmResult<header::HeaderMap> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {bearer}"))
            .map_err(|_| IbmError::InvalidToken)?,
    );
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );
    Ok(headers)
}

fn http_client(headers: header::HeaderMap) -> IbmResult<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

/// Turn a non-success response into [`IbmError::Api`].
async fn api_error(response: Response) -> IbmError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "no body".to_string());
    // Legacy errors are `{"code": .., "message": ..}`; prefer the message.
    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or(body);
    IbmError::Api { status, message }
}

impl IbmClient {
    /// Client for the legacy direct-token API.
    ///
    /// For the IBM Cloud API, use [`IbmClient::connect`] instead.
    pub fn new(endpoint: impl Into<String>, token: &str) -> IbmResult<Self> {
        Ok(Self {
            client: http_client(default_headers(token)?)?,
            endpoint: endpoint.into(),
            instance: None,
            cloud_api: false,
        })
    }

    /// Client for the IBM Cloud API.
    ///
    /// Exchanges the API key for an IAM bearer token and sets the
    /// `Service-CRN` header the Cloud API requires on every request.
    pub async fn connect(api_key: &str, service_crn: &str) -> IbmResult<Self> {
        let iam_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let iam_response = iam_client
            .post(IAM_TOKEN_URL)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(format!(
                "grant_type=urn:ibm:params:oauth:grant-type:apikey&apikey={api_key}"
            ))
            .send()
            .await
            .map_err(|e| IbmError::IamTokenExchange(e.to_string()))?;

        if !iam_response.status().is_success() {
            let status = iam_response.status();
            let body = iam_response
                .text()
                .await
                .unwrap_or_else(|_| "no body".to_string());
            return Err(IbmError::IamTokenExchange(format!(
                "IAM returned {status}: {body}"
            )));
        }

        let iam_token: IamTokenResponse = iam_response.json().await.map_err(|e| {
            IbmError::IamTokenExchange(format!("failed to parse IAM response: {e}"))
        })?;

        let mut headers = default_headers(&iam_token.access_token)?;
        headers.insert(
            header::HeaderName::from_static("service-crn"),
            header::HeaderValue::from_str(service_crn)
                .map_err(|_| IbmError::InvalidParameter("invalid Service-CRN value".into()))?,
        );
        headers.insert(
            header::HeaderName::from_static("ibm-api-version"),
            header::HeaderValue::from_static(IBM_API_VERSION),
        );

        Ok(Self {
            client: http_client(headers)?,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            instance: None,
            cloud_api: true,
        })
    }

    /// Set the instance (hub/group/project) for job submission (legacy mode).
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Whether this client uses the Cloud API.
    pub fn is_cloud_api(&self) -> bool {
        self.cloud_api
    }

    /// List available backends.
    ///
    /// The Cloud API only lists device names, so configuration and status
    /// are fetched per device; devices that fail to load are skipped.
    pub async fn list_backends(&self) -> IbmResult<Vec<BackendInfo>> {
        let url = format!("{}/v1/backends", self.endpoint);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        if !self.cloud_api {
            let backends: LegacyBackendsResponse = response.json().await?;
            return Ok(backends.backends);
        }

        let devices: DevicesResponse = response.json().await?;
        let mut backends = Vec::with_capacity(devices.devices.len());
        for device in &devices.devices {
            match self.get_backend(&device.name).await {
                Ok(info) => backends.push(info),
                Err(e) => warn!("skipping backend {}: {e}", device.name),
            }
        }
        Ok(backends)
    }

    /// Details for one backend.
    pub async fn get_backend(&self, name: &str) -> IbmResult<BackendInfo> {
        if !self.cloud_api {
            let url = format!("{}/v1/backends/{}", self.endpoint, name);
            let response = self.client.get(&url).send().await?;
            return match response.status() {
                s if s.is_success() => Ok(response.json().await?),
                StatusCode::NOT_FOUND => Err(IbmError::BackendUnavailable(name.to_string())),
                _ => Err(api_error(response).await),
            };
        }

        let config_url = format!("{}/v1/backends/{}/configuration", self.endpoint, name);
        let response = self.client.get(&config_url).send().await?;
        let config: BackendConfigResponse = match response.status() {
            s if s.is_success() => response.json().await?,
            StatusCode::NOT_FOUND => return Err(IbmError::BackendUnavailable(name.to_string())),
            _ => return Err(api_error(response).await),
        };

        let status_url = format!("{}/v1/backends/{}/status", self.endpoint, name);
        let response = self.client.get(&status_url).send().await?;
        let status = if response.status().is_success() {
            let s: BackendStatusResponse = response.json().await?;
            BackendStatus {
                operational: s.state,
                status_msg: Some(s.status),
                pending_jobs: Some(u32::try_from(s.length_queue).unwrap_or(u32::MAX)),
            }
        } else {
            // Configuration loaded, so assume the device is up.
            BackendStatus {
                operational: true,
                status_msg: None,
                pending_jobs: None,
            }
        };

        Ok(BackendInfo {
            name: config.backend_name,
            num_qubits: config.n_qubits,
            status,
            basis_gates: config.basis_gates,
            coupling_map: config.coupling_map.unwrap_or_default(),
            simulator: config.simulator.unwrap_or(false),
        })
    }

    /// Submit an Estimator V2 job.
    pub async fn submit_estimator_job(
        &self,
        backend: &str,
        pubs: Vec<EstimatorPub>,
        options: EstimatorOptions,
    ) -> IbmResult<SubmitResponse> {
        let url = format!("{}/v1/jobs", self.endpoint);
        let body = EstimatorJobRequest {
            program_id: "estimator",
            backend,
            hub: if self.cloud_api {
                None
            } else {
                self.instance.as_deref()
            },
            params: EstimatorParams {
                version: 2,
                pubs,
                options,
            },
        };

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// Get job status.
    pub async fn get_job_status(&self, job_id: &str) -> IbmResult<JobStatusResponse> {
        let url = format!("{}/v1/jobs/{}", self.endpoint, job_id);
        let response = self.client.get(&url).send().await?;
        match response.status() {
            s if s.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(IbmError::JobNotFound(job_id.to_string())),
            _ => Err(api_error(response).await),
        }
    }

    /// Get job results.
    pub async fn get_job_results(&self, job_id: &str) -> IbmResult<JobResultResponse> {
        let url = format!("{}/v1/jobs/{}/results", self.endpoint, job_id);
        let response = self.client.get(&url).send().await?;
        match response.status() {
            s if s.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(IbmError::JobNotFound(job_id.to_string())),
            _ => Err(api_error(response).await),
        }
    }

    /// Cancel a job.
    pub async fn cancel_job(&self, job_id: &str) -> IbmResult<()> {
        let url = format!("{}/v1/jobs/{}/cancel", self.endpoint, job_id);
        let response = self.client.post(&url).send().await?;
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(IbmError::JobNotFound(job_id.to_string())),
            _ => Err(api_error(response).await),
        }
    }
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Serialize)]
struct EstimatorJobRequest<'a> {
    program_id: &'a str,
    backend: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hub: Option<&'a str>,
    params: EstimatorParams,
}

#[derive(Debug, Serialize)]
struct EstimatorParams {
    version: u8,
    pubs: Vec<EstimatorPub>,
    options: EstimatorOptions,
}

/// One primitive unified bloc: a circuit and the observables measured on it.
///
/// Serialized as the two-element array `[qasm, [labels...]]`. Labels are in
/// little-endian order (qubit 0 rightmost).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimatorPub(pub String, pub Vec<String>);

/// Estimator options sent with a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimatorOptions {
    /// Error-mitigation level.
    pub resilience_level: u32,
    /// Shots per observable.
    pub default_shots: u32,
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Cloud API device list (`{"devices": [...]}`).
#[derive(Debug, Deserialize)]
struct DevicesResponse {
    devices: Vec<DeviceEntry>,
}

#[derive(Debug, Deserialize)]
struct DeviceEntry {
    name: String,
}

/// Legacy API backend list (`{"backends": [...]}`).
#[derive(Debug, Deserialize)]
struct LegacyBackendsResponse {
    backends: Vec<BackendInfo>,
}

/// Cloud API `/backends/{name}/configuration`.
#[derive(Debug, Deserialize)]
struct BackendConfigResponse {
    backend_name: String,
    n_qubits: u32,
    #[serde(default)]
    basis_gates: Vec<String>,
    #[serde(default)]
    coupling_map: Option<Vec<[u32; 2]>>,
    #[serde(default)]
    simulator: Option<bool>,
}

/// Cloud API `/backends/{name}/status`.
#[derive(Debug, Deserialize)]
struct BackendStatusResponse {
    state: bool,
    #[serde(default)]
    status: String,
    #[serde(default)]
    length_queue: u64,
}

/// Backend information.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendInfo {
    /// Backend name.
    pub name: String,
    /// Number of qubits.
    pub num_qubits: u32,
    /// Backend status.
    pub status: BackendStatus,
    /// Basis gates.
    #[serde(default)]
    pub basis_gates: Vec<String>,
    /// Coupling map (pairs of connected qubits).
    #[serde(default)]
    pub coupling_map: Vec<[u32; 2]>,
    /// Whether this is a simulator.
    #[serde(default)]
    pub simulator: bool,
}

/// Backend status.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendStatus {
    /// Whether the backend accepts jobs.
    pub operational: bool,
    /// Status message.
    #[serde(default)]
    pub status_msg: Option<String>,
    /// Number of pending jobs.
    #[serde(default)]
    pub pending_jobs: Option<u32>,
}

/// Job submission response.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Job ID.
    pub id: String,
}

/// Job status response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    /// Job ID.
    pub id: String,
    /// Job status; mixed case on the Cloud API.
    pub status: String,
    /// Error information if failed (legacy API).
    #[serde(default)]
    pub error: Option<JobError>,
    /// State object with reason (Cloud API).
    #[serde(default)]
    pub state: Option<JobState>,
}

/// Job error information (legacy API).
#[derive(Debug, Clone, Deserialize)]
pub struct JobError {
    /// Error message.
    pub message: String,
}

/// Job state with reason (Cloud API).
#[derive(Debug, Clone, Deserialize)]
pub struct JobState {
    /// Reason for failure.
    #[serde(default)]
    pub reason: Option<String>,
}

impl JobStatusResponse {
    /// The failure reason, preferring the Cloud API `state.reason`.
    pub fn error_message(&self) -> Option<String> {
        self.state
            .as_ref()
            .and_then(|s| s.reason.clone())
            .or_else(|| self.error.as_ref().map(|e| e.message.clone()))
    }
}

/// Job result response: one entry per PUB.
#[derive(Debug, Deserialize)]
pub struct JobResultResponse {
    /// Per-PUB results.
    pub results: Vec<PubResult>,
}

/// Estimator result for one PUB.
#[derive(Debug, Deserialize)]
pub struct PubResult {
    /// Expectation values and standard errors.
    pub data: PubData,
    /// Service metadata.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Estimator data arrays.
#[derive(Debug, Deserialize)]
pub struct PubData {
    /// Expectation values, one per observable.
    #[serde(deserialize_with = "one_or_many")]
    pub evs: Vec<f64>,
    /// Standard errors, one per observable.
    #[serde(default, deserialize_with = "one_or_many")]
    pub stds: Vec<f64>,
}

/// A PUB with a single observable may come back with scalar arrays.
fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(f64),
        Many(Vec<f64>),
    }
    Ok(match OneOrMany::deserialize(d)? {
        OneOrMany::One(v) => vec![v],
        OneOrMany::Many(v) => v,
    })
}
