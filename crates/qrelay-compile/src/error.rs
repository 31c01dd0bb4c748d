//! Error types for the compile crate.

use qrelay_ir::IrError;
use thiserror::Error;

/// Errors that can occur during placement and layout remapping.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// The layout does not cover what it is applied to, or points outside
    /// the target register.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Circuit needs more qubits than the target provides.
    #[error("Circuit requires {required} qubits but target only has {available}")]
    CircuitTooLarge {
        /// Qubits needed.
        required: u32,
        /// Qubits available.
        available: u32,
    },

    /// Optimization level outside the supported range.
    #[error("Unsupported optimization level {0} (expected 0..=3)")]
    InvalidLevel(u8),

    /// A two-qubit gate lands on physical qubits that are not coupled.
    #[error("Gate '{gate}' on physical qubits ({q1}, {q2}) needs routing, which this optimizer does not perform")]
    RoutingRequired {
        /// Gate name.
        gate: String,
        /// First physical qubit.
        q1: u32,
        /// Second physical qubit.
        q2: u32,
    },

    /// Error from the circuit model.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),
}

/// Result type for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;
