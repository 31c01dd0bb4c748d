//! Error types for the HAL crate.

use std::time::Duration;

use qrelay_compile::CompileError;
use qrelay_ir::IrError;
use thiserror::Error;

use crate::job::JobId;

/// Errors that can occur in HAL operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Local validation failed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Index outside a sequence.
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Sequence length.
        len: usize,
    },

    /// The remote service rejected the submission.
    #[error("Job submission failed: {0}")]
    SubmissionFailed(String),

    /// The optimizer could not place the circuit.
    #[error("Optimization failed: {0}")]
    Optimization(String),

    /// No backend matched the selection filters.
    #[error("No backend available: {0}")]
    NoBackendAvailable(String),

    /// Polling kept failing with transient errors.
    #[error("Remote service unavailable for job {job_id} after {attempts} attempts: {last_error}")]
    RemoteUnavailable {
        /// Job being polled.
        job_id: JobId,
        /// Consecutive failed queries.
        attempts: u32,
        /// Last transient error seen.
        last_error: String,
    },

    /// Job execution failed remotely.
    #[error("Job {job_id} failed: {reason}")]
    JobFailed {
        /// Failed job.
        job_id: JobId,
        /// Diagnostic reported by the service.
        reason: String,
    },

    /// Job was cancelled.
    #[error("Job {job_id} cancelled")]
    JobCancelled {
        /// Cancelled job.
        job_id: JobId,
    },

    /// Local wait budget exceeded. The job keeps running remotely.
    #[error("Timeout waiting for job {job_id} after {waited:?}")]
    Timeout {
        /// Job still pending.
        job_id: JobId,
        /// Time spent waiting.
        waited: Duration,
    },

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Transient transport failure reported by a service implementation.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The service answered with something unusable.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl HalError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            HalError::Transport(_) => true,
            HalError::Network(e) => !(e.is_builder() || e.is_decode() || e.is_redirect()),
            _ => false,
        }
    }

    /// Whether this is a local validation error.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            HalError::InvalidArgument(_) | HalError::IndexOutOfRange { .. }
        )
    }
}

impl From<IrError> for HalError {
    fn from(e: IrError) -> Self {
        match e {
            IrError::IndexOutOfRange {
                qubit, num_qubits, ..
            } => HalError::IndexOutOfRange {
                index: qubit.index(),
                len: num_qubits as usize,
            },
            other => HalError::InvalidArgument(other.to_string()),
        }
    }
}

impl From<CompileError> for HalError {
    fn from(e: CompileError) -> Self {
        match e {
            CompileError::InvalidLayout(msg) => HalError::InvalidArgument(msg),
            CompileError::Ir(ir) => ir.into(),
            other => HalError::Optimization(other.to_string()),
        }
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;

#[cfg(test)]
mod tests {
    use super::*;
    use qrelay_ir::QubitId;

    #[test]
    fn test_transient_classification() {
        assert!(HalError::Transport("connection reset".into()).is_transient());
        assert!(!HalError::JobNotFound("x".into()).is_transient());
        assert!(!HalError::SubmissionFailed("401".into()).is_transient());
    }

    #[test]
    fn test_ir_conversion() {
        let err: HalError = IrError::IndexOutOfRange {
            qubit: QubitId(5),
            num_qubits: 2,
            gate_name: None,
        }
        .into();
        assert!(matches!(err, HalError::IndexOutOfRange { index: 5, len: 2 }));

        let err: HalError = IrError::InvalidPauli {
            symbol: 'Q',
            position: 0,
        }
        .into();
        assert!(err.is_validation());
    }

    #[test]
    fn test_compile_conversion() {
        let err: HalError = CompileError::InvalidLayout("unmapped".into()).into();
        assert!(matches!(err, HalError::InvalidArgument(_)));

        let err: HalError = CompileError::InvalidLevel(9).into();
        assert!(matches!(err, HalError::Optimization(_)));
    }

    #[test]
    fn test_display_carries_context() {
        let err = HalError::JobFailed {
            job_id: JobId::new("job-7"),
            reason: "calibration drift".into(),
        };
        assert_eq!(err.to_string(), "Job job-7 failed: calibration drift");
    }
}
