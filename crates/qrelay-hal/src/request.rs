//! Execution requests.
//!
//! An [`ExecutionRequest`] is one submittable unit: a placed circuit, the
//! observables to estimate on it (already carried through the circuit's
//! layout), and the run options. Requests are immutable once built.
//!
//! ```
//! use qrelay_compile::{LayoutOptimizer, Optimizer, Target};
//! use qrelay_hal::ExecutionRequest;
//! use qrelay_ir::Circuit;
//!
//! let placed = LayoutOptimizer::with_initial_layout(vec![1, 0])
//!     .optimize(&Circuit::bell().unwrap(), &Target::all_to_all("dev", 3), 0)
//!     .unwrap();
//!
//! let request = ExecutionRequest::builder(placed)
//!     .observable("ZI".parse().unwrap())
//!     .shots(1000)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.observables()[0].to_string(), "IZI");
//! ```

use serde::{Deserialize, Serialize};

use qrelay_compile::{PlacedCircuit, remap_all};
use qrelay_ir::Observable;

use crate::error::{HalError, HalResult};

/// Named options forwarded to the remote estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Repetitions averaged into each estimate. Must be positive.
    pub shots: u32,
    /// Error-mitigation strategy selector, interpreted by the service.
    pub resilience_level: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            shots: 4096,
            resilience_level: 1,
        }
    }
}

impl RunOptions {
    /// Options with the given shot count.
    pub fn with_shots(shots: u32) -> Self {
        Self {
            shots,
            ..Self::default()
        }
    }

    /// Set the resilience level.
    pub fn resilience_level(mut self, level: u32) -> Self {
        self.resilience_level = level;
        self
    }

    fn validate(&self) -> HalResult<()> {
        if self.shots == 0 {
            return Err(HalError::InvalidArgument("shots must be positive".into()));
        }
        Ok(())
    }
}

/// A placed circuit, its remapped observables, and run options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRequest {
    circuit: PlacedCircuit,
    observables: Vec<Observable>,
    options: RunOptions,
}

impl ExecutionRequest {
    /// Start building a request for a placed circuit.
    pub fn builder(circuit: PlacedCircuit) -> ExecutionRequestBuilder {
        ExecutionRequestBuilder::new(circuit)
    }

    /// The placed circuit.
    pub fn circuit(&self) -> &PlacedCircuit {
        &self.circuit
    }

    /// Observables in physical index space, in submission order.
    pub fn observables(&self) -> &[Observable] {
        &self.observables
    }

    /// Run options.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Number of observables.
    pub fn num_observables(&self) -> usize {
        self.observables.len()
    }

    /// Re-check the shape of the request.
    ///
    /// Every observable must span exactly the placed circuit's register,
    /// there must be at least one observable, and shots must be positive.
    pub fn validate(&self) -> HalResult<()> {
        if self.observables.is_empty() {
            return Err(HalError::InvalidArgument(
                "a request needs at least one observable".into(),
            ));
        }
        let width = self.circuit.physical_qubits();
        if let Some((index, obs)) = self
            .observables
            .iter()
            .enumerate()
            .find(|(_, o)| o.num_qubits() != width)
        {
            return Err(HalError::InvalidArgument(format!(
                "observable {index} ({obs}) spans {} qubits, circuit has {width}",
                obs.num_qubits()
            )));
        }
        self.options.validate()
    }
}

/// Builder for [`ExecutionRequest`].
///
/// Observables are added in the circuit's logical index space; `build`
/// checks their width and remaps all of them through the placed circuit's
/// single layout.
#[derive(Debug, Clone)]
pub struct ExecutionRequestBuilder {
    circuit: PlacedCircuit,
    observables: Vec<Observable>,
    options: RunOptions,
}

impl ExecutionRequestBuilder {
    /// Create a builder with default options.
    pub fn new(circuit: PlacedCircuit) -> Self {
        Self {
            circuit,
            observables: Vec::new(),
            options: RunOptions::default(),
        }
    }

    /// Add one logical observable.
    pub fn observable(mut self, observable: Observable) -> Self {
        self.observables.push(observable);
        self
    }

    /// Add several logical observables.
    pub fn observables(mut self, observables: impl IntoIterator<Item = Observable>) -> Self {
        self.observables.extend(observables);
        self
    }

    /// Replace the run options.
    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the shot count.
    pub fn shots(mut self, shots: u32) -> Self {
        self.options.shots = shots;
        self
    }

    /// Set the resilience level.
    pub fn resilience_level(mut self, level: u32) -> Self {
        self.options.resilience_level = level;
        self
    }

    /// Validate and remap.
    pub fn build(self) -> HalResult<ExecutionRequest> {
        if self.observables.is_empty() {
            return Err(HalError::InvalidArgument(
                "a request needs at least one observable".into(),
            ));
        }
        let logical = self.circuit.logical_qubits();
        for (index, obs) in self.observables.iter().enumerate() {
            if obs.num_qubits() != logical {
                return Err(HalError::InvalidArgument(format!(
                    "observable {index} ({obs}) spans {} qubits, circuit has {logical}",
                    obs.num_qubits()
                )));
            }
        }
        self.options.validate()?;

        let observables = remap_all(
            &self.observables,
            self.circuit.layout(),
            self.circuit.physical_qubits(),
        )?;

        let request = ExecutionRequest {
            circuit: self.circuit,
            observables,
            options: self.options,
        };
        request.validate()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrelay_compile::{Layout, LayoutOptimizer, Optimizer, Target};
    use qrelay_ir::Circuit;

    fn placed(layout: Vec<u32>, width: u32) -> PlacedCircuit {
        LayoutOptimizer::with_initial_layout(layout)
            .optimize(&Circuit::bell().unwrap(), &Target::all_to_all("dev", width), 0)
            .unwrap()
    }

    fn obs(label: &str) -> Observable {
        label.parse().unwrap()
    }

    #[test]
    fn test_build_remaps_every_observable_with_one_layout() {
        let request = ExecutionRequest::builder(placed(vec![2, 0], 3))
            .observables(["ZI", "IX", "ZZ"].map(obs))
            .shots(1000)
            .resilience_level(1)
            .build()
            .unwrap();

        let labels: Vec<_> = request.observables().iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["IIZ", "XII", "ZIZ"]);
        assert_eq!(request.options().shots, 1000);
        assert_eq!(request.circuit().layout(), &Layout::from_physical(&[2, 0]).unwrap());
    }

    #[test]
    fn test_build_rejects_width_mismatch() {
        let err = ExecutionRequest::builder(placed(vec![0, 1], 2))
            .observable(obs("ZZZ"))
            .build()
            .unwrap_err();
        assert!(matches!(err, HalError::InvalidArgument(_)));
    }

    #[test]
    fn test_build_rejects_zero_shots() {
        let err = ExecutionRequest::builder(placed(vec![0, 1], 2))
            .observable(obs("ZZ"))
            .shots(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, HalError::InvalidArgument(_)));
    }

    #[test]
    fn test_build_rejects_empty_observable_set() {
        assert!(
            ExecutionRequest::builder(placed(vec![0, 1], 2))
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_run_options_serde() {
        let options: RunOptions = serde_json::from_str(r#"{"shots": 100}"#).unwrap();
        assert_eq!(options, RunOptions::with_shots(100));
        assert_eq!(options.resilience_level, 1);
    }
}
