//! Circuit model and builder API.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::qubit::QubitId;

/// A gate applied to its operands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Single-qubit gate.
    Single {
        /// The gate.
        gate: StandardGate,
        /// Target qubit.
        target: QubitId,
    },
    /// Two-qubit gate.
    Two {
        /// The gate.
        gate: StandardGate,
        /// Control (first) qubit.
        control: QubitId,
        /// Target (second) qubit.
        target: QubitId,
    },
}

impl Operation {
    /// The gate of this operation.
    pub fn gate(&self) -> &StandardGate {
        match self {
            Operation::Single { gate, .. } | Operation::Two { gate, .. } => gate,
        }
    }

    /// Qubits touched by this operation, control first.
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> {
        let pair = match *self {
            Operation::Single { target, .. } => [Some(target), None],
            Operation::Two {
                control, target, ..
            } => [Some(control), Some(target)],
        };
        pair.into_iter().flatten()
    }

    /// Check the operation against a register of `num_qubits` slots.
    fn validate(&self, num_qubits: u32) -> IrResult<()> {
        let gate = self.gate();
        let got = match self {
            Operation::Single { .. } => 1,
            Operation::Two { .. } => 2,
        };
        if gate.num_qubits() != got {
            return Err(IrError::QubitCountMismatch {
                gate_name: gate.name().to_string(),
                expected: gate.num_qubits(),
                got,
            });
        }

        for qubit in self.qubits() {
            if qubit.0 >= num_qubits {
                return Err(IrError::IndexOutOfRange {
                    qubit,
                    num_qubits,
                    gate_name: Some(gate.name().to_string()),
                });
            }
        }

        if let Operation::Two {
            control, target, ..
        } = *self
        {
            if control == target {
                return Err(IrError::InvalidArgument(format!(
                    "gate '{}' uses {control} as both control and target",
                    gate.name()
                )));
            }
        }

        Ok(())
    }
}

/// A quantum circuit.
///
/// A circuit is a register size plus an ordered sequence of [`Operation`]s.
/// It is frozen: the only way to grow one is through a [`CircuitBuilder`],
/// which checks every operand on the way in. Two circuits compare equal when
/// their register sizes and operation sequences match; the name is
/// informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "CircuitData")]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Size of the qubit register.
    num_qubits: u32,
    /// Operations in application order.
    operations: Vec<Operation>,
}

impl Circuit {
    /// Start building a circuit over `num_qubits` qubits.
    ///
    /// Fails with [`IrError::InvalidArgument`] when `num_qubits` is zero.
    pub fn builder(num_qubits: u32) -> IrResult<CircuitBuilder> {
        CircuitBuilder::new(num_qubits)
    }

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the register size.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the operations in application order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the circuit has no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Circuit depth: the length of the longest chain of operations that
    /// share a qubit.
    pub fn depth(&self) -> usize {
        let mut layer = vec![0usize; self.num_qubits as usize];
        for op in &self.operations {
            let next = op.qubits().map(|q| layer[q.index()]).max().unwrap_or(0) + 1;
            for q in op.qubits() {
                layer[q.index()] = next;
            }
        }
        layer.into_iter().max().unwrap_or(0)
    }

    /// Count operations by gate name.
    pub fn count_ops(&self) -> FxHashMap<&'static str, usize> {
        let mut counts = FxHashMap::default();
        for op in &self.operations {
            *counts.entry(op.gate().name()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of two-qubit operations.
    pub fn num_two_qubit_ops(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Two { .. }))
            .count()
    }

    // =========================================================================
    // Common circuits
    // =========================================================================

    /// Create a Bell state circuit: `H(0)` followed by `CX(0, 1)`.
    pub fn bell() -> IrResult<Self> {
        let mut builder = Self::builder(2)?.with_name("bell");
        builder.h(QubitId(0))?.cx(QubitId(0), QubitId(1))?;
        Ok(builder.build())
    }

    /// Create an n-qubit GHZ state circuit.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut builder = Self::builder(n)?.with_name("ghz");
        builder.h(QubitId(0))?;
        for i in 0..n - 1 {
            builder.cx(QubitId(i), QubitId(i + 1))?;
        }
        Ok(builder.build())
    }
}

impl PartialEq for Circuit {
    fn eq(&self, other: &Self) -> bool {
        self.num_qubits == other.num_qubits && self.operations == other.operations
    }
}

/// Unvalidated wire form of a [`Circuit`].
#[derive(Deserialize)]
struct CircuitData {
    #[serde(default)]
    name: String,
    num_qubits: u32,
    #[serde(default)]
    operations: Vec<Operation>,
}

impl TryFrom<CircuitData> for Circuit {
    type Error = IrError;

    fn try_from(data: CircuitData) -> IrResult<Self> {
        let mut builder = CircuitBuilder::new(data.num_qubits)?.with_name(data.name);
        for op in data.operations {
            builder.push(op)?;
        }
        Ok(builder.build())
    }
}

/// Append-only builder for [`Circuit`].
///
/// Every append checks the operands against the register size, so a built
/// circuit never references an out-of-range qubit.
#[derive(Debug, Clone)]
pub struct CircuitBuilder {
    name: String,
    num_qubits: u32,
    operations: Vec<Operation>,
}

impl CircuitBuilder {
    /// Create a builder for a register of `num_qubits` qubits.
    pub fn new(num_qubits: u32) -> IrResult<Self> {
        if num_qubits == 0 {
            return Err(IrError::InvalidArgument(
                "a circuit needs at least one qubit".into(),
            ));
        }
        Ok(Self {
            name: "circuit".to_string(),
            num_qubits,
            operations: vec![],
        })
    }

    /// Set the circuit name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Register size of the circuit under construction.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Append a validated operation.
    pub fn push(&mut self, op: Operation) -> IrResult<&mut Self> {
        op.validate(self.num_qubits)?;
        self.operations.push(op);
        Ok(self)
    }

    /// Append a single-qubit gate.
    pub fn add_single_qubit_gate(
        &mut self,
        gate: StandardGate,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Operation::Single { gate, target })
    }

    /// Append a two-qubit gate.
    ///
    /// Fails with [`IrError::IndexOutOfRange`] for an operand outside the
    /// register and [`IrError::InvalidArgument`] when `control == target`.
    pub fn add_two_qubit_gate(
        &mut self,
        gate: StandardGate,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.push(Operation::Two {
            gate,
            control,
            target,
        })
    }

    /// Freeze the circuit.
    pub fn build(self) -> Circuit {
        Circuit {
            name: self.name,
            num_qubits: self.num_qubits,
            operations: self.operations,
        }
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_single_qubit_gate(StandardGate::H, qubit)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_single_qubit_gate(StandardGate::X, qubit)
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_single_qubit_gate(StandardGate::Y, qubit)
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_single_qubit_gate(StandardGate::Z, qubit)
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_single_qubit_gate(StandardGate::S, qubit)
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_single_qubit_gate(StandardGate::T, qubit)
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_single_qubit_gate(StandardGate::SX, qubit)
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_single_qubit_gate(StandardGate::Rx(theta), qubit)
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_single_qubit_gate(StandardGate::Ry(theta), qubit)
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_single_qubit_gate(StandardGate::Rz(theta), qubit)
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.add_two_qubit_gate(StandardGate::CX, control, target)
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.add_two_qubit_gate(StandardGate::CZ, control, target)
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.add_two_qubit_gate(StandardGate::Swap, q1, q2)
    }

    /// Apply ZZ rotation gate.
    pub fn rzz(&mut self, theta: f64, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.add_two_qubit_gate(StandardGate::RZZ(theta), q1, q2)
    }
}
