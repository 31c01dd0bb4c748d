//! qrelay Demo Suite
//!
//! Console helpers shared by the demo binaries, plus the observable sets
//! they estimate.
//!
//! - **Bell correlators**: `demo-bell-estimator` prepares
//!   `(|00⟩ + |11⟩)/√2` and estimates single-qubit and two-qubit Paulis on
//!   the local simulator or an IBM device.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use qrelay_hal::Report;
use qrelay_ir::Observable;

/// Observables estimated by the Bell demo, with their ideal values.
pub const BELL_OBSERVABLES: &[(&str, f64)] = &[
    ("IZ", 0.0),
    ("IX", 0.0),
    ("ZI", 0.0),
    ("XI", 0.0),
    ("ZZ", 1.0),
    ("XX", 1.0),
];

/// Parse Pauli labels into observables.
pub fn parse_observables<'a>(
    labels: impl IntoIterator<Item = &'a str>,
) -> anyhow::Result<Vec<Observable>> {
    labels
        .into_iter()
        .map(|l| l.parse::<Observable>().map_err(anyhow::Error::from))
        .collect()
}

/// Create a spinner for a pending job.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}

/// Format estimator rows next to their ideal values.
///
/// Rows whose value lies more than three standard errors (or 0.1, whichever
/// is larger) from the ideal are flagged.
pub fn report_lines(report: &Report<'_>, ideal: &[(&str, f64)]) -> Vec<String> {
    report
        .rows()
        .iter()
        .map(|(obs, summary)| {
            let label = obs.to_string();
            let expected = ideal.iter().find(|(l, _)| *l == label).map(|&(_, v)| v);
            let mark = match expected {
                Some(v) if (summary.value - v).abs() > (3.0 * summary.std_error).max(0.1) => "!",
                Some(_) => " ",
                None => "?",
            };
            let expected = expected.map_or_else(|| "-".to_string(), |v| format!("{v:+.3}"));
            format!(
                "{mark} <{label}> = {:+.4} ± {:.4}   (ideal {expected})",
                summary.value, summary.std_error
            )
        })
        .collect()
}

/// Print estimator rows next to their ideal values.
pub fn print_report(report: &Report<'_>, ideal: &[(&str, f64)]) {
    for line in report_lines(report, ideal) {
        if line.starts_with('!') {
            println!("  {}", style(line).yellow());
        } else {
            println!("  {line}");
        }
    }
}
