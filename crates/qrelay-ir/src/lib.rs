//! qrelay Circuit and Observable Model
//!
//! This crate provides the data structures a client uses to describe a small
//! quantum computation before handing it to a remote estimator: an
//! append-only [`Circuit`] over a fixed register of qubits, and the
//! [`Observable`]s (tensor products of single-qubit Pauli labels) to measure
//! on it.
//!
//! # Core Components
//!
//! - **Qubits**: [`QubitId`] addresses a slot of the register
//! - **Gates**: [`StandardGate`] for the built-in one- and two-qubit gates
//! - **Operations**: [`Operation`] pairs a gate with its operands
//! - **Circuit**: [`CircuitBuilder`] during construction, frozen [`Circuit`] afterwards
//! - **Observables**: [`Pauli`] labels collected into an [`Observable`]
//!
//! # Example: Bell State with Correlators
//!
//! ```rust
//! use qrelay_ir::{Circuit, Observable, QubitId};
//!
//! let mut builder = Circuit::builder(2).unwrap();
//! builder.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
//! let circuit = builder.build();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.len(), 2);
//!
//! let zz: Observable = "ZZ".parse().unwrap();
//! assert_eq!(zz.num_qubits(), circuit.num_qubits());
//! ```
//!
//! # Label Ordering
//!
//! Observable labels are written in register order: the first symbol acts on
//! qubit 0. Wire formats that expect the reverse convention use
//! [`Observable::to_little_endian_label`].
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `I`, `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `H` | 1 | Hadamard gate |
//! | `S`, `Sdg`, `T`, `Tdg` | 1 | Phase gates |
//! | `SX`, `SXdg` | 1 | sqrt(X) and its inverse |
//! | `Rx`, `Ry`, `Rz`, `P` | 1 | Rotation and phase gates |
//! | `U` | 1 | Universal single-qubit gate U(θ,φ,λ) |
//! | `CX`, `CY`, `CZ`, `CH` | 2 | Controlled gates |
//! | `Swap`, `ISwap` | 2 | Swap family |
//! | `CRz`, `CP`, `RZZ` | 2 | Parameterized two-qubit gates |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod observable;
pub mod qubit;

pub use circuit::{Circuit, CircuitBuilder, Operation};
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use observable::{Observable, Pauli};
pub use qubit::QubitId;
