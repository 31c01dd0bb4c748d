//! OpenQASM 3 emission for estimator PUBs.
//!
//! Estimator circuits carry no measurements; the runtime measures in the
//! bases the observables ask for.

use std::f64::consts::PI;
use std::fmt::Write as _;

use qrelay_ir::{Circuit, Operation, StandardGate};

/// Gates missing from `stdgates.inc`, with their definitions.
const EXTRA_GATES: &[(&str, &str)] = &[
    ("sxdg", "gate sxdg a { inv @ sx a; }"),
    ("iswap", "gate iswap a, b { s a; s b; h a; cx a, b; cx b, a; h b; }"),
    ("rzz", "gate rzz(theta) a, b { cx a, b; rz(theta) b; cx a, b; }"),
];

/// Emit a circuit as OpenQASM 3.0 source.
pub fn emit(circuit: &Circuit) -> String {
    let mut out = String::from("OPENQASM 3.0;\ninclude \"stdgates.inc\";\n");

    for (name, definition) in EXTRA_GATES {
        if circuit.operations().iter().any(|op| op.gate().name() == *name) {
            out.push_str(definition);
            out.push('\n');
        }
    }

    let num_qubits = circuit.num_qubits();
    if num_qubits > 0 {
        let _ = write!(out, "\nqubit[{num_qubits}] q;\n\n");
    }

    for op in circuit.operations() {
        emit_operation(&mut out, op);
    }
    out
}

fn emit_operation(out: &mut String, op: &Operation) {
    let gate = op.gate();
    let params = gate.params();
    let name = match gate {
        // `U` is the language builtin.
        StandardGate::U(..) => "U",
        other => other.name(),
    };
    let qubits = op
        .qubits()
        .map(|q| format!("q[{}]", q.0))
        .collect::<Vec<_>>()
        .join(", ");

    if params.is_empty() {
        let _ = writeln!(out, "{name} {qubits};");
    } else {
        let params = params.iter().map(|&p| emit_param(p)).collect::<Vec<_>>();
        let _ = writeln!(out, "{name}({}) {qubits};", params.join(", "));
    }
}

fn emit_param(v: f64) -> String {
    const NAMED: &[(f64, &str)] = &[
        (PI, "pi"),
        (PI / 2.0, "pi/2"),
        (PI / 4.0, "pi/4"),
        (-PI, "-pi"),
        (-PI / 2.0, "-pi/2"),
        (-PI / 4.0, "-pi/4"),
    ];
    NAMED
        .iter()
        .find(|(c, _)| (v - c).abs() < 1e-10)
        .map_or_else(|| format!("{v:.6}"), |(_, s)| (*s).to_string())
}
