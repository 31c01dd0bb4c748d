//! qrelay Placement and Layout Remapping
//!
//! This crate sits between the circuit model and the execution layer. It
//! places a logical circuit onto a device and keeps track of where every
//! logical qubit went, so that observables written against the logical
//! register can be carried onto the same physical qubits.
//!
//! # Overview
//!
//! ```text
//! Circuit (logical) ──► Optimizer ──► PlacedCircuit (physical) + Layout
//!                                                        │
//! Observables (logical) ──────────────► remap_all ◄──────┘
//!                                           │
//!                                           ▼
//!                               Observables (physical)
//! ```
//!
//! # Example
//!
//! ```rust
//! use qrelay_compile::{remap_all, LayoutOptimizer, Optimizer, Target};
//! use qrelay_ir::{Circuit, Observable};
//!
//! let circuit = Circuit::bell().unwrap();
//! let target = Target::all_to_all("device", 4);
//!
//! let placed = LayoutOptimizer::with_initial_layout(vec![2, 0])
//!     .optimize(&circuit, &target, 1)
//!     .unwrap();
//!
//! let observables: Vec<Observable> = vec!["ZZ".parse().unwrap(), "XI".parse().unwrap()];
//! let physical = remap_all(&observables, placed.layout(), placed.physical_qubits()).unwrap();
//!
//! assert_eq!(physical[0].to_string(), "ZIZI");
//! assert_eq!(physical[1].to_string(), "IIXI");
//! ```

pub mod error;
pub mod layout;
pub mod optimizer;
pub mod target;

pub use error::{CompileError, CompileResult};
pub use layout::{Layout, remap, remap_all};
pub use optimizer::{
    LayoutOptimizer, LayoutStrategy, MAX_OPTIMIZATION_LEVEL, Optimizer, PlacedCircuit,
};
pub use target::{BasisGates, CouplingMap, Target};
