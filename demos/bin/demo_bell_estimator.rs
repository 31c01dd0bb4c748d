//! Bell Correlator Estimation Demo
//!
//! Prepares a Bell pair, places it on a device, and estimates six Pauli
//! observables through the remote-execution pipeline.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use qrelay_adapter_ibm::IbmRuntime;
use qrelay_adapter_sim::{SimConfig, SimulatorRuntime};
use qrelay_compile::{LayoutOptimizer, MAX_OPTIMIZATION_LEVEL};
use qrelay_demos::{
    BELL_OBSERVABLES, create_spinner, parse_observables, print_header, print_info, print_report,
    print_result, print_section, print_success,
};
use qrelay_hal::{
    BackendDescriptor, BackendSelector, EstimatorPipeline, JobClient, PollConfig, RunOptions,
    RuntimeService, SelectionFilters,
};
use qrelay_ir::Circuit;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Service {
    /// Local statevector runtime
    Sim,
    /// IBM Quantum Runtime
    Ibm,
}

#[derive(Parser, Debug)]
#[command(name = "demo-bell-estimator")]
#[command(about = "Estimate Bell-state correlators through the qrelay pipeline")]
struct Args {
    /// Execution service
    #[arg(short, long, value_enum, default_value = "sim")]
    backend: Service,

    /// Device name (IBM only; least busy operational device if omitted)
    #[arg(long, env = "IBM_BACKEND")]
    device: Option<String>,

    /// Shots per observable
    #[arg(short, long, default_value = "4096")]
    shots: u32,

    /// Error-mitigation level
    #[arg(short, long, default_value = "1")]
    resilience: u32,

    /// Optimization level (0-3)
    #[arg(short = 'O', long, default_value = "1")]
    optimization_level: u8,

    /// Poll interval in milliseconds (overrides QRELAY_POLL_INTERVAL_MS)
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Wait timeout in seconds (overrides QRELAY_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Simulated queue length in polls (sim only)
    #[arg(long, default_value = "3")]
    queue_polls: u32,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

async fn connect(args: &Args) -> anyhow::Result<(Arc<dyn RuntimeService>, BackendDescriptor)> {
    match args.backend {
        Service::Sim => {
            let runtime = SimulatorRuntime::with_config(SimConfig {
                queue_polls: args.queue_polls,
                run_polls: 2,
                ..SimConfig::default()
            });
            let backend = runtime.descriptor().clone();
            Ok((Arc::new(runtime), backend))
        }
        Service::Ibm => {
            let runtime = IbmRuntime::connect()
                .await
                .context("connecting to IBM Quantum")?;
            let backend = match &args.device {
                Some(name) => runtime.backend(name).await?,
                None => {
                    runtime
                        .least_busy(&SelectionFilters::default().with_min_qubits(2))
                        .await?
                }
            };
            Ok((Arc::new(runtime), backend))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    anyhow::ensure!(
        args.optimization_level <= MAX_OPTIMIZATION_LEVEL,
        "optimization level must be at most {MAX_OPTIMIZATION_LEVEL}"
    );

    print_header("Bell Correlator Estimation");

    let mut poll = PollConfig::from_env()?;
    if let Some(ms) = args.poll_interval_ms {
        poll = poll.with_poll_interval(Duration::from_millis(ms));
    }
    if let Some(secs) = args.timeout_secs {
        poll = poll.with_timeout(Duration::from_secs(secs));
    }

    let (service, backend) = connect(&args).await?;
    debug!(service = service.name(), backend = %backend.name, "backend selected");

    print_section("Backend");
    print_result("Service", service.name());
    print_result("Device", &backend.name);
    print_result("Qubits", backend.num_qubits());
    print_result("Pending jobs", backend.pending_jobs);

    let circuit = Circuit::bell()?;
    let observables = parse_observables(BELL_OBSERVABLES.iter().map(|(l, _)| *l))?;
    let options = RunOptions::with_shots(args.shots).resilience_level(args.resilience);

    print_section("Request");
    print_result("Circuit", format!("{} ({} ops)", circuit.name(), circuit.len()));
    print_result("Observables", observables.len());
    print_result("Shots", options.shots);
    print_result("Resilience level", options.resilience_level);
    print_result("Optimization level", args.optimization_level);

    let client = JobClient::new(service, backend).with_poll_config(poll);
    let pipeline = EstimatorPipeline::new(Arc::new(LayoutOptimizer::new()), client)
        .with_optimization_level(args.optimization_level);

    let handle = pipeline.submit(&circuit, &observables, options).await?;
    print_info(&format!("Submitted job {}", handle.id));

    let spinner = create_spinner("Waiting for results...");
    let outcome = pipeline.client().wait(&handle).await;
    spinner.finish_and_clear();
    let result = outcome?;

    print_section("Results");
    print_report(&result.report(&observables)?, BELL_OBSERVABLES);

    print_success("Estimation complete");
    Ok(())
}
