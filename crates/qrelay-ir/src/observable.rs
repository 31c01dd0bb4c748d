//! Pauli observables.
//!
//! An [`Observable`] is a tensor product of single-qubit Pauli labels, one
//! per register slot:
//!
//!   O = P_0 ⊗ P_1 ⊗ … ⊗ P_{n-1},   P_k ∈ {I, X, Y, Z}
//!
//! Labels are written in register order, so `"ZI"` measures Z on qubit 0
//! and leaves qubit 1 alone.
//!
//! # Example
//!
//! ```rust
//! use qrelay_ir::{Observable, Pauli};
//!
//! let obs: Observable = "ZIX".parse().unwrap();
//! assert_eq!(obs.num_qubits(), 3);
//! assert_eq!(obs.get(2), Some(Pauli::X));
//! assert_eq!(obs.weight(), 2);
//! assert_eq!(obs.to_little_endian_label(), "XIZ");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{IrError, IrResult};

/// Single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Identity.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
}

impl Pauli {
    /// Parse a label symbol. Only the upper-case symbols are recognized.
    pub fn from_char(symbol: char) -> Option<Self> {
        match symbol {
            'I' => Some(Pauli::I),
            'X' => Some(Pauli::X),
            'Y' => Some(Pauli::Y),
            'Z' => Some(Pauli::Z),
            _ => None,
        }
    }

    /// The label symbol.
    pub fn as_char(self) -> char {
        match self {
            Pauli::I => 'I',
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }

    /// Whether this is the identity.
    pub fn is_identity(self) -> bool {
        self == Pauli::I
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A measurement operator over a full qubit register.
///
/// Observables are built independently of any circuit; the width check
/// against a circuit happens when the two are paired into a request.
/// Equality and hashing are structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Observable {
    /// One label per qubit, indexed by register slot.
    labels: Vec<Pauli>,
}

impl Observable {
    /// Create an observable from its per-qubit labels.
    pub fn new(labels: Vec<Pauli>) -> IrResult<Self> {
        if labels.is_empty() {
            return Err(IrError::InvalidArgument(
                "an observable needs at least one label".into(),
            ));
        }
        Ok(Self { labels })
    }

    /// Parse a label string such as `"IZ"`.
    pub fn from_label(label: &str) -> IrResult<Self> {
        let labels = label
            .chars()
            .enumerate()
            .map(|(position, symbol)| {
                Pauli::from_char(symbol).ok_or(IrError::InvalidPauli { symbol, position })
            })
            .collect::<IrResult<Vec<_>>>()?;
        Self::new(labels)
    }

    /// The all-identity observable on `num_qubits` qubits.
    pub fn identity(num_qubits: u32) -> IrResult<Self> {
        Self::new(vec![Pauli::I; num_qubits as usize])
    }

    /// Build an observable from `(qubit, pauli)` pairs; unlisted qubits are
    /// identity. Later pairs overwrite earlier ones on the same qubit.
    pub fn from_sparse(
        num_qubits: u32,
        terms: impl IntoIterator<Item = (u32, Pauli)>,
    ) -> IrResult<Self> {
        let mut labels = vec![Pauli::I; num_qubits as usize];
        for (qubit, pauli) in terms {
            let slot = labels.get_mut(qubit as usize).ok_or_else(|| {
                IrError::InvalidArgument(format!(
                    "qubit {qubit} outside a {num_qubits}-qubit observable"
                ))
            })?;
            *slot = pauli;
        }
        Self::new(labels)
    }

    /// Number of qubits this observable spans.
    pub fn num_qubits(&self) -> u32 {
        self.labels.len() as u32
    }

    /// Per-qubit labels in register order.
    pub fn labels(&self) -> &[Pauli] {
        &self.labels
    }

    /// Label on a given qubit.
    pub fn get(&self, qubit: usize) -> Option<Pauli> {
        self.labels.get(qubit).copied()
    }

    /// Number of non-identity labels.
    pub fn weight(&self) -> usize {
        self.labels.iter().filter(|p| !p.is_identity()).count()
    }

    /// Whether every label is the identity.
    pub fn is_identity(&self) -> bool {
        self.weight() == 0
    }

    /// Iterate over `(qubit, pauli)` pairs with a non-identity label.
    pub fn support(&self) -> impl Iterator<Item = (usize, Pauli)> + '_ {
        self.labels
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, p)| !p.is_identity())
    }

    /// Label string with qubit 0 as the rightmost symbol.
    pub fn to_little_endian_label(&self) -> String {
        self.labels.iter().rev().map(|p| p.as_char()).collect()
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.labels {
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

impl FromStr for Observable {
    type Err = IrError;

    fn from_str(s: &str) -> IrResult<Self> {
        Self::from_label(s)
    }
}

impl TryFrom<String> for Observable {
    type Error = IrError;

    fn try_from(s: String) -> IrResult<Self> {
        Self::from_label(&s)
    }
}

impl From<Observable> for String {
    fn from(obs: Observable) -> Self {
        obs.to_string()
    }
}
