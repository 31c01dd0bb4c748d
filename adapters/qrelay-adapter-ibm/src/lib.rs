//! IBM Quantum Runtime Adapter
//!
//! Runs estimator requests on IBM Quantum devices through the Estimator V2
//! primitive. A request becomes one PUB: the placed circuit as OpenQASM 3 and
//! its observables as little-endian Pauli labels (qubit 0 rightmost).
//!
//! # Authentication
//!
//! | Variables | API |
//! |-----------|-----|
//! | `IBM_API_KEY` + `IBM_SERVICE_CRN` | IBM Cloud (`quantum.cloud.ibm.com`), IAM token exchange |
//! | `IBM_QUANTUM_TOKEN` | legacy (`api.quantum-computing.ibm.com`), bearer token |
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use qrelay_adapter_ibm::IbmRuntime;
//! use qrelay_compile::LayoutOptimizer;
//! use qrelay_hal::{BackendSelector, EstimatorPipeline, JobClient, RunOptions, SelectionFilters};
//! use qrelay_ir::{Circuit, Observable};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = Arc::new(IbmRuntime::connect().await?);
//!     let backend = runtime.least_busy(&SelectionFilters::default()).await?;
//!
//!     let client = JobClient::new(runtime, backend);
//!     let pipeline = EstimatorPipeline::new(Arc::new(LayoutOptimizer::new()), client);
//!
//!     let zz: Observable = "ZZ".parse()?;
//!     let result = pipeline
//!         .run(&Circuit::bell()?, &[zz], RunOptions::with_shots(4096))
//!         .await?;
//!     println!("<ZZ> = {:.3} ± {:.3}", result.extract(0)?.0, result.extract(0)?.1);
//!     Ok(())
//! }
//! ```

pub mod api;
mod backend;
mod error;
pub mod qasm;

pub use api::{DEFAULT_ENDPOINT, IbmClient, LEGACY_ENDPOINT};
pub use backend::IbmRuntime;
pub use error::{IbmError, IbmResult};
