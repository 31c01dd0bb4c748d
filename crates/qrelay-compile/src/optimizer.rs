//! Circuit placement.
//!
//! An [`Optimizer`] takes a logical circuit and a [`Target`] and returns a
//! [`PlacedCircuit`]: the same computation rewritten into the target's
//! physical index space, plus the [`Layout`] that records where each logical
//! qubit went. Observables must follow that layout through
//! [`remap`](crate::remap) before they can be paired with the placed circuit.
//!
//! [`LayoutOptimizer`] is the in-tree implementation. It performs placement
//! only and never inserts SWAPs, so a two-qubit gate that lands on uncoupled
//! physical qubits is an error rather than a routing problem.
//!
//! | Level | Effect |
//! |-------|--------|
//! | 0 | placement only |
//! | 1 | + drop identity gates |
//! | 2, 3 | + cancel adjacent self-inverse pairs |

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use qrelay_ir::{Circuit, CircuitBuilder, Operation, QubitId, StandardGate};

use crate::error::{CompileError, CompileResult};
use crate::layout::Layout;
use crate::target::Target;

/// Highest optimization level accepted.
pub const MAX_OPTIMIZATION_LEVEL: u8 = 3;

/// Capability to place a logical circuit onto a target.
///
/// Implementations must be deterministic for a given input and must not
/// cache results across calls.
pub trait Optimizer: Send + Sync {
    /// Optimizer name, for logs.
    fn name(&self) -> &str;

    /// Place `circuit` onto `target` at the given optimization level.
    fn optimize(&self, circuit: &Circuit, target: &Target, level: u8)
    -> CompileResult<PlacedCircuit>;
}

/// A circuit rewritten into a target's physical index space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PlacedCircuitData")]
pub struct PlacedCircuit {
    circuit: Circuit,
    layout: Layout,
    logical_qubits: u32,
}

impl PlacedCircuit {
    /// Bundle a physical circuit with its layout.
    ///
    /// Fails if the layout does not map every logical qubit into the
    /// physical register.
    pub fn new(circuit: Circuit, layout: Layout, logical_qubits: u32) -> CompileResult<Self> {
        layout.validate(logical_qubits, circuit.num_qubits())?;
        Ok(Self {
            circuit,
            layout,
            logical_qubits,
        })
    }

    /// Physical circuit. Its width is the target's qubit count.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Logical-to-physical layout used for placement.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Width of the circuit before placement.
    pub fn logical_qubits(&self) -> u32 {
        self.logical_qubits
    }

    /// Width of the physical circuit.
    pub fn physical_qubits(&self) -> u32 {
        self.circuit.num_qubits()
    }

    /// Split into circuit and layout.
    pub fn into_parts(self) -> (Circuit, Layout) {
        (self.circuit, self.layout)
    }
}

/// Unchecked wire form of [`PlacedCircuit`].
#[derive(Deserialize)]
struct PlacedCircuitData {
    circuit: Circuit,
    layout: Layout,
    logical_qubits: u32,
}

impl TryFrom<PlacedCircuitData> for PlacedCircuit {
    type Error = CompileError;

    fn try_from(data: PlacedCircuitData) -> CompileResult<Self> {
        Self::new(data.circuit, data.layout, data.logical_qubits)
    }
}

/// How [`LayoutOptimizer`] chooses the initial layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStrategy {
    /// Logical qubit i on physical qubit i.
    #[default]
    Trivial,
    /// Logical qubit i on `physical[i]`.
    Fixed(Vec<u32>),
}

/// Deterministic placement without routing.
#[derive(Debug, Clone, Default)]
pub struct LayoutOptimizer {
    strategy: LayoutStrategy,
}

impl LayoutOptimizer {
    /// Optimizer with the trivial layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Optimizer with an explicit initial layout.
    pub fn with_initial_layout(physical: Vec<u32>) -> Self {
        Self {
            strategy: LayoutStrategy::Fixed(physical),
        }
    }

    /// Active layout strategy.
    pub fn strategy(&self) -> &LayoutStrategy {
        &self.strategy
    }

    fn initial_layout(&self, logical_qubits: u32) -> CompileResult<Layout> {
        match &self.strategy {
            LayoutStrategy::Trivial => Ok(Layout::trivial(logical_qubits)),
            LayoutStrategy::Fixed(physical) => {
                if physical.len() != logical_qubits as usize {
                    return Err(CompileError::InvalidLayout(format!(
                        "initial layout has {} entries for a {logical_qubits}-qubit circuit",
                        physical.len()
                    )));
                }
                Layout::from_physical(physical)
            }
        }
    }
}

impl Optimizer for LayoutOptimizer {
    fn name(&self) -> &str {
        "layout"
    }

    #[instrument(skip(self, circuit, target), fields(circuit = circuit.name(), target = %target.name))]
    fn optimize(
        &self,
        circuit: &Circuit,
        target: &Target,
        level: u8,
    ) -> CompileResult<PlacedCircuit> {
        if level > MAX_OPTIMIZATION_LEVEL {
            return Err(CompileError::InvalidLevel(level));
        }

        let logical_qubits = circuit.num_qubits();
        let physical_qubits = target.num_qubits();
        if logical_qubits > physical_qubits {
            return Err(CompileError::CircuitTooLarge {
                required: logical_qubits,
                available: physical_qubits,
            });
        }

        let layout = self.initial_layout(logical_qubits)?;
        layout.validate(logical_qubits, physical_qubits)?;

        let mut ops: Vec<Operation> = circuit
            .operations()
            .iter()
            .map(|op| place(op, &layout))
            .collect::<CompileResult<_>>()?;

        if level >= 1 {
            ops.retain(|op| *op.gate() != StandardGate::I);
        }
        if level >= 2 {
            ops = cancel_inverse_pairs(ops, physical_qubits);
        }

        let mut builder = CircuitBuilder::new(physical_qubits)?.with_name(circuit.name());
        for op in ops {
            if let Operation::Two {
                gate,
                control,
                target: t,
            } = op
            {
                if !target.coupling_map.is_connected(control.0, t.0) {
                    return Err(CompileError::RoutingRequired {
                        gate: gate.name().to_string(),
                        q1: control.0,
                        q2: t.0,
                    });
                }
            }
            builder.push(op)?;
        }
        let placed = builder.build();

        debug!(
            logical_qubits,
            physical_qubits,
            ops_before = circuit.len(),
            ops_after = placed.len(),
            "placed circuit"
        );

        PlacedCircuit::new(placed, layout, logical_qubits)
    }
}

fn physical(layout: &Layout, logical: QubitId) -> CompileResult<QubitId> {
    layout
        .get_physical(logical)
        .map(QubitId)
        .ok_or_else(|| CompileError::InvalidLayout(format!("logical qubit {logical} is not mapped")))
}

fn place(op: &Operation, layout: &Layout) -> CompileResult<Operation> {
    Ok(match *op {
        Operation::Single { gate, target } => Operation::Single {
            gate,
            target: physical(layout, target)?,
        },
        Operation::Two {
            gate,
            control,
            target,
        } => Operation::Two {
            gate,
            control: physical(layout, control)?,
            target: physical(layout, target)?,
        },
    })
}

fn is_self_inverse(gate: &StandardGate) -> bool {
    matches!(
        gate,
        StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
    )
}

/// Remove pairs of identical self-inverse operations with nothing between
/// them on any of their qubits.
fn cancel_inverse_pairs(ops: Vec<Operation>, num_qubits: u32) -> Vec<Operation> {
    let mut kept: Vec<Option<Operation>> = Vec::with_capacity(ops.len());
    // Per-qubit stack of indices into `kept`.
    let mut wires: Vec<Vec<usize>> = vec![Vec::new(); num_qubits as usize];

    for op in ops {
        if is_self_inverse(op.gate()) {
            let previous = op
                .qubits()
                .map(|q| wires[q.index()].last().copied())
                .collect::<Vec<_>>();
            let first = previous[0];
            let same_predecessor = previous.iter().all(|p| *p == first);
            if let Some(i) = first.filter(|_| same_predecessor) {
                if kept[i] == Some(op) {
                    kept[i] = None;
                    for q in op.qubits() {
                        wires[q.index()].pop();
                    }
                    continue;
                }
            }
        }

        let index = kept.len();
        kept.push(Some(op));
        for q in op.qubits() {
            wires[q.index()].push(index);
        }
    }

    kept.into_iter().flatten().collect()
}
