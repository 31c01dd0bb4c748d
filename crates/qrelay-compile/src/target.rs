//! Target device description: qubit count, connectivity and native gates.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Coupling map representing qubit connectivity.
///
/// Edges are bidirectional. The adjacency list is rebuilt on
/// deserialization, so a map read back from JSON answers
/// [`is_connected`](Self::is_connected) without further setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "CouplingMapData")]
pub struct CouplingMap {
    /// List of connected qubit pairs.
    edges: Vec<(u32, u32)>,
    /// Number of physical qubits.
    num_qubits: u32,
    /// Adjacency list for fast lookup.
    #[serde(skip)]
    adjacency: FxHashMap<u32, Vec<u32>>,
}

#[derive(Deserialize)]
struct CouplingMapData {
    edges: Vec<(u32, u32)>,
    num_qubits: u32,
}

impl From<CouplingMapData> for CouplingMap {
    fn from(data: CouplingMapData) -> Self {
        Self::from_edges(data.num_qubits, data.edges)
    }
}

impl PartialEq for CouplingMap {
    fn eq(&self, other: &Self) -> bool {
        self.num_qubits == other.num_qubits && self.edges == other.edges
    }
}

impl CouplingMap {
    /// Create a coupling map with the given number of qubits and no edges.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            edges: vec![],
            num_qubits,
            adjacency: FxHashMap::default(),
        }
    }

    /// Create a coupling map from an edge list.
    pub fn from_edges(num_qubits: u32, edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut map = Self::new(num_qubits);
        for (q1, q2) in edges {
            map.add_edge(q1, q2);
        }
        map
    }

    /// Add an edge between two qubits (bidirectional).
    ///
    /// Duplicate edges (including reversed pairs) are silently ignored.
    pub fn add_edge(&mut self, q1: u32, q2: u32) {
        if self.is_connected(q1, q2) {
            return;
        }
        self.edges.push((q1, q2));
        self.adjacency.entry(q1).or_default().push(q2);
        self.adjacency.entry(q2).or_default().push(q1);
    }

    /// Check if two qubits are directly connected.
    #[inline]
    pub fn is_connected(&self, q1: u32, q2: u32) -> bool {
        self.adjacency
            .get(&q1)
            .is_some_and(|neighbors| neighbors.contains(&q2))
    }

    /// Get the number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the coupling edges.
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Get neighbors of a qubit.
    pub fn neighbors(&self, qubit: u32) -> impl Iterator<Item = u32> + '_ {
        self.adjacency
            .get(&qubit)
            .map(|v| v.iter().copied())
            .into_iter()
            .flatten()
    }

    /// Create a linear coupling map (0-1-2-3-...).
    pub fn linear(n: u32) -> Self {
        Self::from_edges(n, (0..n.saturating_sub(1)).map(|i| (i, i + 1)))
    }

    /// Create a fully connected coupling map.
    pub fn full(n: u32) -> Self {
        Self::from_edges(n, (0..n).flat_map(|i| ((i + 1)..n).map(move |j| (i, j))))
    }

    /// Create a star topology (center qubit connected to all others).
    pub fn star(n: u32) -> Self {
        Self::from_edges(n, (1..n).map(|i| (0, i)))
    }
}

/// Basis gates for the target device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasisGates {
    gates: Vec<String>,
}

impl BasisGates {
    /// Create a new basis gates set.
    pub fn new(gates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            gates: gates.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if a gate is in the basis.
    pub fn contains(&self, gate: &str) -> bool {
        self.gates.iter().any(|g| g == gate)
    }

    /// Get the basis gates.
    pub fn gates(&self) -> &[String] {
        &self.gates
    }

    /// IBM Eagle-class basis (RZ + SX + X + ECR/CX).
    pub fn ibm() -> Self {
        Self::new(["rz", "sx", "x", "cx", "ecr", "id"])
    }

    /// IBM Heron-class basis (RZ + SX + X + CZ).
    pub fn heron() -> Self {
        Self::new(["rz", "sx", "x", "cz", "id", "rx", "rzz"])
    }

    /// Every gate the circuit model knows.
    pub fn universal() -> Self {
        Self::new([
            "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "sxdg", "rx", "ry", "rz", "p",
            "u", "cx", "cy", "cz", "ch", "swap", "iswap", "crz", "cp", "rzz",
        ])
    }
}

/// A compilation target: what the optimizer may place a circuit onto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Device name.
    pub name: String,
    /// Qubit connectivity.
    pub coupling_map: CouplingMap,
    /// Native gate set.
    pub basis_gates: BasisGates,
}

impl Target {
    /// Create a target.
    pub fn new(name: impl Into<String>, coupling_map: CouplingMap, basis_gates: BasisGates) -> Self {
        Self {
            name: name.into(),
            coupling_map,
            basis_gates,
        }
    }

    /// A fully connected target accepting every gate.
    pub fn all_to_all(name: impl Into<String>, num_qubits: u32) -> Self {
        Self::new(name, CouplingMap::full(num_qubits), BasisGates::universal())
    }

    /// Number of physical qubits.
    pub fn num_qubits(&self) -> u32 {
        self.coupling_map.num_qubits()
    }
}
