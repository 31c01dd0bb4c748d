//! Optimize, build, submit and wait through `EstimatorPipeline`.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{MockRuntime, device};
use qrelay_compile::LayoutOptimizer;
use qrelay_hal::{EstimatorPipeline, HalError, JobClient, PollConfig, RunOptions};
use qrelay_ir::{Circuit, Observable};

fn observables(labels: &[&str]) -> Vec<Observable> {
    labels.iter().map(|l| l.parse().unwrap()).collect()
}

fn pipeline(runtime: &Arc<MockRuntime>, width: u32, optimizer: LayoutOptimizer) -> EstimatorPipeline {
    let client = JobClient::new(runtime.clone(), device(width))
        .with_poll_config(PollConfig::default().with_poll_interval(Duration::from_millis(50)));
    EstimatorPipeline::new(Arc::new(optimizer), client)
}

#[tokio::test(start_paused = true)]
async fn test_bell_scenario_end_to_end() {
    let runtime = Arc::new(MockRuntime::completing().with_bell_fixture());
    let pipeline = pipeline(&runtime, 2, LayoutOptimizer::new());
    let obs = observables(&["IZ", "IX", "ZI", "XI", "ZZ", "XX"]);

    let result = pipeline
        .run(
            &Circuit::bell().unwrap(),
            &obs,
            RunOptions::with_shots(1000).resilience_level(1),
        )
        .await
        .unwrap();

    let report = result.report(&obs).unwrap();
    let zz = report.lookup(&"ZZ".parse().unwrap()).unwrap();
    let xx = report.lookup(&"XX".parse().unwrap()).unwrap();
    let iz = report.lookup(&"IZ".parse().unwrap()).unwrap();
    assert!((zz.value - 1.0).abs() < 0.05);
    assert!((xx.value - 1.0).abs() < 0.05);
    assert!(iz.value.abs() < 0.05);
}

#[tokio::test]
async fn test_observables_follow_the_placement() {
    let runtime = Arc::new(MockRuntime::completing());
    let pipeline = pipeline(&runtime, 3, LayoutOptimizer::with_initial_layout(vec![2, 1]));

    let handle = pipeline
        .submit(
            &Circuit::bell().unwrap(),
            &observables(&["ZI", "IX", "ZZ"]),
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        runtime.labels(&handle.id).unwrap(),
        vec!["IIZ", "IXI", "IZZ"]
    );
}

#[tokio::test]
async fn test_optimizer_failures_are_optimization_errors() {
    let runtime = Arc::new(MockRuntime::completing());
    let pipeline = pipeline(&runtime, 2, LayoutOptimizer::new()).with_optimization_level(7);

    let err = pipeline
        .submit(&Circuit::bell().unwrap(), &observables(&["ZZ"]), RunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::Optimization(_)));

    let too_big = Circuit::ghz(3).unwrap();
    let err = pipeline
        .with_optimization_level(0)
        .submit(&too_big, &observables(&["ZZZ"]), RunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::Optimization(_)));
    assert_eq!(runtime.submits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_shape_errors_are_reported_before_optimizing() {
    let runtime = Arc::new(MockRuntime::completing());
    let pipeline = pipeline(&runtime, 2, LayoutOptimizer::new()).with_optimization_level(7);

    // An invalid level would fail in the optimizer; the width check comes first.
    let err = pipeline
        .submit(&Circuit::bell().unwrap(), &observables(&["ZZZ"]), RunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::InvalidArgument(_)));

    let err = pipeline
        .submit(&Circuit::bell().unwrap(), &[], RunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HalError::InvalidArgument(_)));
}
