//! qrelay Local Estimator Runtime
//!
//! An in-process [`RuntimeService`](qrelay_hal::RuntimeService) backed by a
//! statevector engine. It is the reference service for tests and demos: jobs
//! follow the same `Queued → Running → Completed` lifecycle a remote runtime
//! reports, but expectation values are exact unless shot noise is enabled.
//!
//! # Memory
//!
//! | Qubits | Memory |
//! |--------|--------|
//! | 10 | ~16 KB |
//! | 20 | ~16 MB |
//! | 24 | ~256 MB |
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use qrelay_adapter_sim::SimulatorRuntime;
//! use qrelay_compile::LayoutOptimizer;
//! use qrelay_hal::{EstimatorPipeline, JobClient, RunOptions};
//! use qrelay_ir::{Circuit, Observable};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = Arc::new(SimulatorRuntime::new());
//!     let client = JobClient::new(runtime.clone(), runtime.descriptor().clone());
//!     let pipeline = EstimatorPipeline::new(Arc::new(LayoutOptimizer::new()), client);
//!
//!     let zz: Observable = "ZZ".parse()?;
//!     let result = pipeline
//!         .run(&Circuit::bell()?, &[zz], RunOptions::default())
//!         .await?;
//!     println!("<ZZ> = {:.3}", result.extract(0)?.0);
//!     Ok(())
//! }
//! ```

mod simulator;
mod statevector;

pub use simulator::{MAX_SIM_QUBITS, SimConfig, SimulatorRuntime};
pub use statevector::Statevector;
