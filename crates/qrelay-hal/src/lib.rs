//! qrelay Execution Layer
//!
//! This crate turns a placed circuit and a set of observables into a remote
//! estimator job and brings the per-observable results back.
//!
//! # Overview
//!
//! - [`BackendDescriptor`] and the [`BackendSelector`] capability describe
//!   and choose the device
//! - [`ExecutionRequest`] pairs a placed circuit with its remapped
//!   observables and [`RunOptions`]
//! - [`RuntimeService`] is the capability interface to the remote service
//! - [`JobClient`] validates, submits, polls (with retries) and cancels
//! - [`EstimatorResult`] extracts `(value, std_error)` per observable
//! - [`EstimatorPipeline`] wires an optimizer to a job client
//!
//! # Supported Services
//!
//! | Service | Crate | Authentication |
//! |---------|-------|----------------|
//! | Local statevector runtime | `qrelay-adapter-sim` | None |
//! | IBM Quantum Runtime | `qrelay-adapter-ibm` | `IBM_QUANTUM_TOKEN` or `IBM_API_KEY` + `IBM_SERVICE_CRN` |
//!
//! # Example: Bell Correlators
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use qrelay_adapter_sim::SimulatorRuntime;
//! use qrelay_compile::LayoutOptimizer;
//! use qrelay_hal::{BackendSelector, EstimatorPipeline, JobClient, RunOptions, SelectionFilters};
//! use qrelay_ir::{Circuit, Observable};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = Arc::new(SimulatorRuntime::new());
//!     let backend = runtime.least_busy(&SelectionFilters::any()).await?;
//!
//!     let client = JobClient::new(runtime, backend);
//!     let pipeline = EstimatorPipeline::new(Arc::new(LayoutOptimizer::new()), client);
//!
//!     let observables: Vec<Observable> = ["ZZ", "XX"]
//!         .iter()
//!         .map(|l| l.parse())
//!         .collect::<Result<_, _>>()?;
//!     let result = pipeline
//!         .run(&Circuit::bell()?, &observables, RunOptions::with_shots(1000))
//!         .await?;
//!
//!     println!("{}", result.report(&observables)?);
//!     Ok(())
//! }
//! ```
//!
//! # Implementing a Custom Service
//!
//! ```ignore
//! use async_trait::async_trait;
//! use qrelay_hal::{
//!     BackendDescriptor, ExecutionRequest, HalResult, JobId, JobSnapshot, RuntimeService,
//! };
//!
//! struct MyService;
//!
//! #[async_trait]
//! impl RuntimeService for MyService {
//!     fn name(&self) -> &str { "my_service" }
//!
//!     async fn submit(&self, backend: &BackendDescriptor, request: &ExecutionRequest) -> HalResult<JobId> {
//!         // Serialize the request and post it.
//!         # todo!()
//!     }
//!
//!     async fn poll(&self, job_id: &JobId) -> HalResult<JobSnapshot> {
//!         // Query job status, attaching the result once completed.
//!         # todo!()
//!     }
//!
//!     async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
//!         # todo!()
//!     }
//! }
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod job;
pub mod pipeline;
pub mod request;
pub mod result;
pub mod service;

pub use backend::{BackendDescriptor, BackendSelector, SelectionFilters, StaticSelector};
pub use client::JobClient;
pub use config::{PollConfig, ServiceConfig};
pub use error::{HalError, HalResult};
pub use job::{JobHandle, JobId, JobStatus};
pub use pipeline::EstimatorPipeline;
pub use request::{ExecutionRequest, ExecutionRequestBuilder, RunOptions};
pub use result::{EstimatorResult, ObservableSummary, Report};
pub use service::{JobSnapshot, RuntimeService};
