//! Error types for the IBM Quantum adapter.

use qrelay_hal::HalError;
use thiserror::Error;

/// Result type for IBM operations.
pub type IbmResult<T> = Result<T, IbmError>;

/// Errors that can occur when talking to IBM Quantum.
#[derive(Debug, Error)]
pub enum IbmError {
    /// Missing API token.
    #[error(
        "IBM Quantum API token not found. Set IBM_API_KEY or IBM_QUANTUM_TOKEN environment variable."
    )]
    MissingToken,

    /// Token cannot be used as a header value.
    #[error("Invalid IBM Quantum API token")]
    InvalidToken,

    /// IAM token exchange failed.
    #[error("IAM token exchange failed: {0}")]
    IamTokenExchange(String),

    /// Missing service CRN.
    #[error("IBM_SERVICE_CRN environment variable is required when using IBM_API_KEY")]
    MissingServiceCrn,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("IBM Quantum API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or error message.
        message: String,
    },

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Backend unknown or offline.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Circuit cannot be expressed in OpenQASM 3.
    #[error("Circuit conversion error: {0}")]
    Circuit(String),

    /// A completed job returned an unusable payload.
    #[error("Malformed job result: {0}")]
    MalformedResult(String),

    /// Invalid parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl IbmError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            IbmError::Http(e) => !(e.is_builder() || e.is_decode() || e.is_redirect()),
            IbmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<IbmError> for HalError {
    fn from(e: IbmError) -> Self {
        match e {
            IbmError::MissingToken
            | IbmError::InvalidToken
            | IbmError::IamTokenExchange(_)
            | IbmError::MissingServiceCrn => HalError::Configuration(e.to_string()),
            IbmError::Http(e) => HalError::Network(e),
            IbmError::Api { status, message } => {
                let msg = format!("IBM Quantum API error ({status}): {message}");
                match status {
                    429 | 500.. => HalError::Transport(msg),
                    401 | 403 => HalError::Configuration(msg),
                    _ => HalError::InvalidResponse(msg),
                }
            }
            IbmError::JobNotFound(id) => HalError::JobNotFound(id),
            IbmError::BackendUnavailable(name) => HalError::NoBackendAvailable(name),
            IbmError::Json(e) => HalError::Serialization(e),
            IbmError::Circuit(msg) | IbmError::InvalidParameter(msg) => {
                HalError::InvalidArgument(msg)
            }
            IbmError::MalformedResult(msg) => HalError::InvalidResponse(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_display() {
        assert!(IbmError::MissingToken.to_string().contains("IBM_API_KEY"));
        assert!(
            IbmError::MissingServiceCrn
                .to_string()
                .contains("IBM_SERVICE_CRN")
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = IbmError::Api {
            status: 401,
            message: "Unauthorized".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("Unauthorized"));
    }

    #[test]
    fn test_transient_statuses() {
        let api = |status| IbmError::Api {
            status,
            message: String::new(),
        };
        assert!(api(429).is_transient());
        assert!(api(502).is_transient());
        assert!(api(503).is_transient());
        assert!(!api(400).is_transient());
        assert!(!api(401).is_transient());
        assert!(!IbmError::JobNotFound("j".into()).is_transient());
    }

    #[test]
    fn test_api_errors_to_hal() {
        let hal: HalError = IbmError::Api {
            status: 503,
            message: "maintenance".into(),
        }
        .into();
        assert!(matches!(hal, HalError::Transport(_)));
        assert!(hal.is_transient());

        let hal: HalError = IbmError::Api {
            status: 401,
            message: "bad token".into(),
        }
        .into();
        assert!(matches!(hal, HalError::Configuration(_)));

        let hal: HalError = IbmError::Api {
            status: 400,
            message: "bad pub".into(),
        }
        .into();
        assert!(matches!(hal, HalError::InvalidResponse(_)));
    }

    #[test]
    fn test_auth_errors_to_hal() {
        for err in [
            IbmError::MissingToken,
            IbmError::InvalidToken,
            IbmError::IamTokenExchange("fail".into()),
            IbmError::MissingServiceCrn,
        ] {
            assert!(matches!(HalError::from(err), HalError::Configuration(_)));
        }
    }

    #[test]
    fn test_job_not_found_to_hal() {
        let hal: HalError = IbmError::JobNotFound("j1".into()).into();
        assert!(matches!(hal, HalError::JobNotFound(id) if id == "j1"));
    }

    #[test]
    fn test_backend_unavailable_to_hal() {
        let hal: HalError = IbmError::BackendUnavailable("ibm_kyoto".into()).into();
        assert!(matches!(hal, HalError::NoBackendAvailable(name) if name == "ibm_kyoto"));
    }

    #[test]
    fn test_circuit_error_to_hal() {
        let hal: HalError = IbmError::Circuit("bad".into()).into();
        assert!(hal.is_validation());
    }
}
