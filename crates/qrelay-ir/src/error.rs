//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Errors that can occur while building circuits and observables.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Generic invalid argument (e.g. an empty register, or a two-qubit
    /// gate whose control and target coincide).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Qubit index outside the register.
    #[error(
        "Qubit {qubit} out of range for a {num_qubits}-qubit register{}",
        format_gate_context(.gate_name)
    )]
    IndexOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Size of the register.
        num_qubits: u32,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Gate applied through the wrong arity.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Unrecognized symbol in an observable label.
    #[error("Invalid Pauli symbol '{symbol}' at position {position} (expected one of I, X, Y, Z)")]
    InvalidPauli {
        /// The unrecognized symbol.
        symbol: char,
        /// Position of the symbol in the label.
        position: usize,
    },
}

impl IrError {
    /// True for every variant except [`IrError::IndexOutOfRange`].
    ///
    /// Callers that collapse IR errors into a coarse taxonomy treat all of
    /// these as invalid arguments.
    pub fn is_invalid_argument(&self) -> bool {
        !matches!(self, IrError::IndexOutOfRange { .. })
    }
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_out_of_range_display() {
        let err = IrError::IndexOutOfRange {
            qubit: QubitId(5),
            num_qubits: 2,
            gate_name: Some("cx".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("q5"));
        assert!(msg.contains("2-qubit"));
        assert!(msg.contains("(gate: cx)"));
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_invalid_pauli_display() {
        let err = IrError::InvalidPauli {
            symbol: 'Q',
            position: 1,
        };
        assert!(err.to_string().contains("'Q'"));
        assert!(err.is_invalid_argument());
    }
}
