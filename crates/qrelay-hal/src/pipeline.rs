//! End-to-end estimator pipeline.
//!
//! ```text
//! Circuit + Observables
//!     │  optimize (blocking task)
//!     ▼
//! PlacedCircuit + Layout ──► ExecutionRequest ──► JobClient::submit ──► JobClient::wait
//! ```

use std::sync::Arc;

use tracing::{debug, instrument};

use qrelay_compile::{Optimizer, PlacedCircuit};
use qrelay_ir::{Circuit, Observable};

use crate::client::JobClient;
use crate::error::{HalError, HalResult};
use crate::job::JobHandle;
use crate::request::{ExecutionRequest, RunOptions};
use crate::result::EstimatorResult;

/// Wires an optimizer to a job client.
///
/// Every submission runs the optimizer afresh; nothing is cached.
#[derive(Clone)]
pub struct EstimatorPipeline {
    optimizer: Arc<dyn Optimizer>,
    client: JobClient,
    optimization_level: u8,
}

impl EstimatorPipeline {
    /// Create a pipeline at optimization level 1.
    pub fn new(optimizer: Arc<dyn Optimizer>, client: JobClient) -> Self {
        Self {
            optimizer,
            client,
            optimization_level: 1,
        }
    }

    /// Set the optimization level passed to the optimizer.
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.optimization_level = level;
        self
    }

    /// The underlying job client.
    pub fn client(&self) -> &JobClient {
        &self.client
    }

    /// Place a circuit on the client's backend.
    ///
    /// The optimizer is CPU-bound, so it runs on the blocking pool.
    pub async fn place(&self, circuit: &Circuit) -> HalResult<PlacedCircuit> {
        let optimizer = Arc::clone(&self.optimizer);
        let circuit = circuit.clone();
        let target = self.client.backend().target.clone();
        let level = self.optimization_level;

        let placed = tokio::task::spawn_blocking(move || optimizer.optimize(&circuit, &target, level))
            .await
            .map_err(|e| HalError::Optimization(format!("optimizer task failed: {e}")))?
            .map_err(|e| HalError::Optimization(e.to_string()))?;

        debug!(
            optimizer = self.optimizer.name(),
            physical_qubits = placed.physical_qubits(),
            "circuit placed"
        );
        Ok(placed)
    }

    /// Optimize, build and submit. Returns as soon as the job is accepted.
    #[instrument(skip_all, fields(circuit = circuit.name(), observables = observables.len()))]
    pub async fn submit(
        &self,
        circuit: &Circuit,
        observables: &[Observable],
        options: RunOptions,
    ) -> HalResult<JobHandle> {
        // Shape errors are cheaper to report before optimizing.
        if observables.is_empty() {
            return Err(HalError::InvalidArgument(
                "a request needs at least one observable".into(),
            ));
        }
        if let Some(obs) = observables
            .iter()
            .find(|o| o.num_qubits() != circuit.num_qubits())
        {
            return Err(HalError::InvalidArgument(format!(
                "observable {obs} spans {} qubits, circuit has {}",
                obs.num_qubits(),
                circuit.num_qubits()
            )));
        }

        let placed = self.place(circuit).await?;
        let request = ExecutionRequest::builder(placed)
            .observables(observables.iter().cloned())
            .options(options)
            .build()?;
        self.client.submit(&request).await
    }

    /// Optimize, submit and wait for the result.
    pub async fn run(
        &self,
        circuit: &Circuit,
        observables: &[Observable],
        options: RunOptions,
    ) -> HalResult<EstimatorResult> {
        let handle = self.submit(circuit, observables, options).await?;
        self.client.wait(&handle).await
    }
}
