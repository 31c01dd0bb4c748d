//! Logical-to-physical qubit layouts and observable remapping.
//!
//! The optimizer places a logical circuit onto physical qubits and reports
//! where each logical qubit ended up as a [`Layout`]. Observables are written
//! against the logical register, so before they can be paired with the placed
//! circuit they must be carried through the same layout with [`remap`].
//!
//! ```
//! use qrelay_compile::{Layout, remap};
//! use qrelay_ir::{Observable, QubitId};
//!
//! // Logical 0 -> physical 3, logical 1 -> physical 1.
//! let layout = Layout::from_physical(&[3, 1]).unwrap();
//! let zx: Observable = "ZX".parse().unwrap();
//!
//! let placed = remap(&zx, &layout, 5).unwrap();
//! assert_eq!(placed.to_string(), "IXIZI");
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use qrelay_ir::{Observable, Pauli, QubitId};

use crate::error::{CompileError, CompileResult};

/// A mapping from logical qubits to physical qubits.
///
/// Both directions are kept in sync, so the mapping is always injective.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Map from logical qubit to physical qubit index.
    logical_to_physical: FxHashMap<QubitId, u32>,
    /// Map from physical qubit index to logical qubit.
    physical_to_logical: FxHashMap<u32, QubitId>,
}

impl Layout {
    /// Create a new empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a trivial layout (logical qubit i -> physical qubit i).
    pub fn trivial(num_qubits: u32) -> Self {
        let mut layout = Self::new();
        for i in 0..num_qubits {
            layout.add(QubitId(i), i);
        }
        layout
    }

    /// Create a layout from a list where entry `i` is the physical qubit of
    /// logical qubit `i`.
    ///
    /// Fails if two logical qubits share a physical qubit.
    pub fn from_physical(physical: &[u32]) -> CompileResult<Self> {
        let mut layout = Self::new();
        for (logical, &p) in physical.iter().enumerate() {
            if let Some(other) = layout.get_logical(p) {
                return Err(CompileError::InvalidLayout(format!(
                    "physical qubit {p} assigned to both {other} and q{logical}"
                )));
            }
            layout.add(QubitId(logical as u32), p);
        }
        Ok(layout)
    }

    /// Add a mapping from logical to physical qubit.
    ///
    /// If the physical qubit is already mapped to a different logical qubit,
    /// the old mapping is removed first to keep both maps consistent.
    /// Similarly, if the logical qubit is already mapped to a different physical
    /// qubit, that old physical mapping is removed.
    pub fn add(&mut self, logical: QubitId, physical: u32) {
        if let Some(&old_logical) = self.physical_to_logical.get(&physical) {
            if old_logical != logical {
                self.logical_to_physical.remove(&old_logical);
            }
        }
        if let Some(&old_physical) = self.logical_to_physical.get(&logical) {
            if old_physical != physical {
                self.physical_to_logical.remove(&old_physical);
            }
        }
        self.logical_to_physical.insert(logical, physical);
        self.physical_to_logical.insert(physical, logical);
    }

    /// Get the physical qubit for a logical qubit.
    pub fn get_physical(&self, logical: QubitId) -> Option<u32> {
        self.logical_to_physical.get(&logical).copied()
    }

    /// Get the logical qubit for a physical qubit.
    pub fn get_logical(&self, physical: u32) -> Option<QubitId> {
        self.physical_to_logical.get(&physical).copied()
    }

    /// Get the number of mapped qubits.
    pub fn len(&self) -> usize {
        self.logical_to_physical.len()
    }

    /// Check if the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.logical_to_physical.is_empty()
    }

    /// Iterate over (logical, physical) pairs, ordered by logical qubit.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, u32)> + '_ {
        let mut pairs: Vec<_> = self.logical_to_physical.iter().map(|(&l, &p)| (l, p)).collect();
        pairs.sort_unstable_by_key(|(l, _)| *l);
        pairs.into_iter()
    }

    /// Largest physical index in use, if any.
    pub fn max_physical(&self) -> Option<u32> {
        self.physical_to_logical.keys().copied().max()
    }

    /// Check that every logical qubit `0..num_logical` is mapped into
    /// `0..num_physical`.
    pub fn validate(&self, num_logical: u32, num_physical: u32) -> CompileResult<()> {
        for l in 0..num_logical {
            let logical = QubitId(l);
            let physical = self.get_physical(logical).ok_or_else(|| {
                CompileError::InvalidLayout(format!("logical qubit {logical} is not mapped"))
            })?;
            if physical >= num_physical {
                return Err(CompileError::InvalidLayout(format!(
                    "logical qubit {logical} maps to physical qubit {physical}, outside a {num_physical}-qubit target"
                )));
            }
        }
        Ok(())
    }
}

/// Carry an observable through a layout onto a `target_qubits`-wide register.
///
/// Every position of the result starts as identity; each non-identity label
/// on logical qubit `i` is then written to physical slot `layout[i]`.
///
/// Fails with [`CompileError::InvalidLayout`] when a non-identity label sits
/// on an unmapped logical qubit, or when any logical qubit the observable
/// spans maps outside `0..target_qubits`.
pub fn remap(
    observable: &Observable,
    layout: &Layout,
    target_qubits: u32,
) -> CompileResult<Observable> {
    let mut labels = vec![Pauli::I; target_qubits as usize];

    for (index, &pauli) in observable.labels().iter().enumerate() {
        let logical = QubitId(index as u32);
        match layout.get_physical(logical) {
            Some(physical) if physical >= target_qubits => {
                return Err(CompileError::InvalidLayout(format!(
                    "logical qubit {logical} maps to physical qubit {physical}, outside a {target_qubits}-qubit target"
                )));
            }
            Some(physical) => labels[physical as usize] = pauli,
            None if pauli.is_identity() => {}
            None => {
                return Err(CompileError::InvalidLayout(format!(
                    "observable {observable} acts on unmapped logical qubit {logical}"
                )));
            }
        }
    }

    Ok(Observable::new(labels)?)
}

/// Remap a whole observable set through one layout.
///
/// All observables destined for the same request must share exactly one
/// layout; taking them together makes that the only possible usage.
pub fn remap_all(
    observables: &[Observable],
    layout: &Layout,
    target_qubits: u32,
) -> CompileResult<Vec<Observable>> {
    observables
        .iter()
        .map(|obs| remap(obs, layout, target_qubits))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(label: &str) -> Observable {
        label.parse().unwrap()
    }

    #[test]
    fn test_trivial_layout() {
        let layout = Layout::trivial(3);
        assert_eq!(layout.len(), 3);
        assert_eq!(layout.get_physical(QubitId(2)), Some(2));
        assert_eq!(layout.get_logical(1), Some(QubitId(1)));
    }

    #[test]
    fn test_add_replaces_conflicts() {
        let mut layout = Layout::new();
        layout.add(QubitId(0), 4);
        layout.add(QubitId(1), 4);
        assert_eq!(layout.get_physical(QubitId(0)), None);
        assert_eq!(layout.get_logical(4), Some(QubitId(1)));
        assert_eq!(layout.len(), 1);
    }

    #[test]
    fn test_from_physical_rejects_collisions() {
        assert!(Layout::from_physical(&[2, 0, 1]).is_ok());
        assert!(matches!(
            Layout::from_physical(&[2, 2]),
            Err(CompileError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_iter_is_ordered() {
        let layout = Layout::from_physical(&[5, 3, 9]).unwrap();
        let pairs: Vec<_> = layout.iter().collect();
        assert_eq!(pairs, vec![(QubitId(0), 5), (QubitId(1), 3), (QubitId(2), 9)]);
        assert_eq!(layout.max_physical(), Some(9));
    }

    #[test]
    fn test_validate() {
        let layout = Layout::from_physical(&[1, 0]).unwrap();
        assert!(layout.validate(2, 2).is_ok());
        assert!(layout.validate(3, 4).is_err());
        assert!(layout.validate(2, 1).is_err());
    }

    #[test]
    fn test_remap_identity_layout() {
        let layout = Layout::trivial(2);
        assert_eq!(remap(&obs("XZ"), &layout, 2).unwrap(), obs("XZ"));
    }

    #[test]
    fn test_remap_widens_and_permutes() {
        let layout = Layout::from_physical(&[4, 0]).unwrap();
        let placed = remap(&obs("ZX"), &layout, 6).unwrap();
        assert_eq!(placed.to_string(), "XIIIZI");
    }

    #[test]
    fn test_remap_unmapped_identity_is_fine() {
        let mut layout = Layout::new();
        layout.add(QubitId(0), 2);
        let placed = remap(&obs("ZI"), &layout, 3).unwrap();
        assert_eq!(placed.to_string(), "IIZ");
    }

    #[test]
    fn test_remap_unmapped_non_identity_fails() {
        let mut layout = Layout::new();
        layout.add(QubitId(0), 2);
        assert!(matches!(
            remap(&obs("IZ"), &layout, 3),
            Err(CompileError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_remap_out_of_bounds_fails() {
        let layout = Layout::from_physical(&[0, 7]).unwrap();
        assert!(matches!(
            remap(&obs("ZI"), &layout, 4),
            Err(CompileError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_remap_all_shares_layout() {
        let layout = Layout::from_physical(&[1, 0]).unwrap();
        let placed = remap_all(&[obs("ZI"), obs("IX")], &layout, 2).unwrap();
        assert_eq!(placed, vec![obs("IZ"), obs("XI")]);
    }
}
