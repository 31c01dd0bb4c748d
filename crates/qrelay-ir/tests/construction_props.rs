//! Property tests: a built circuit never holds an out-of-range operand.

use proptest::prelude::*;
use qrelay_ir::{Circuit, IrError, Observable, Operation, QubitId, StandardGate};

fn single_gate() -> impl Strategy<Value = StandardGate> {
    prop_oneof![
        Just(StandardGate::H),
        Just(StandardGate::X),
        Just(StandardGate::Z),
        Just(StandardGate::S),
        (-3.2f64..3.2).prop_map(StandardGate::Rz),
    ]
}

fn two_gate() -> impl Strategy<Value = StandardGate> {
    prop_oneof![
        Just(StandardGate::CX),
        Just(StandardGate::CZ),
        Just(StandardGate::Swap),
        (-3.2f64..3.2).prop_map(StandardGate::RZZ),
    ]
}

#[derive(Debug, Clone)]
enum Append {
    Single(StandardGate, u32),
    Two(StandardGate, u32, u32),
}

fn append() -> impl Strategy<Value = Append> {
    prop_oneof![
        (single_gate(), 0u32..12).prop_map(|(g, q)| Append::Single(g, q)),
        (two_gate(), 0u32..12, 0u32..12).prop_map(|(g, c, t)| Append::Two(g, c, t)),
    ]
}

proptest! {
    #[test]
    fn test_built_circuits_only_reference_register_slots(
        num_qubits in 1u32..8,
        appends in prop::collection::vec(append(), 0..40),
    ) {
        let mut builder = Circuit::builder(num_qubits).unwrap();
        let mut accepted = 0usize;

        for append in appends {
            let self_loop = matches!(append, Append::Two(_, c, t) if c == t);
            let outcome = match append {
                Append::Single(gate, q) => builder.add_single_qubit_gate(gate, QubitId(q)).map(|_| ()),
                Append::Two(gate, c, t) => builder.add_two_qubit_gate(gate, QubitId(c), QubitId(t)).map(|_| ()),
            };
            match outcome {
                Ok(()) => accepted += 1,
                Err(IrError::IndexOutOfRange { qubit, .. }) => prop_assert!(qubit.0 >= num_qubits),
                Err(IrError::InvalidArgument(_)) => prop_assert!(self_loop),
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }

        let circuit = builder.build();
        prop_assert_eq!(circuit.num_qubits(), num_qubits);
        prop_assert_eq!(circuit.len(), accepted);
        for op in circuit.operations() {
            for q in op.qubits() {
                prop_assert!(q.0 < num_qubits);
            }
            if let Operation::Two { control, target, .. } = op {
                prop_assert_ne!(control, target);
            }
        }
    }

    #[test]
    fn test_observable_labels_round_trip(label in "[IXYZ]{1,16}") {
        let obs: Observable = label.parse().unwrap();
        prop_assert_eq!(obs.num_qubits() as usize, label.len());
        prop_assert_eq!(obs.to_string(), label);
    }

    #[test]
    fn test_observable_rejects_foreign_symbols(label in "[IXYZ]{0,4}[a-hA-HJ-W0-9][IXYZ]{0,4}") {
        prop_assert!(Observable::from_label(&label).is_err());
    }
}
