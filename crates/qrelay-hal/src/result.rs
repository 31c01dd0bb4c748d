//! Estimator results.
//!
//! A completed estimator job yields one [`ObservableSummary`] per submitted
//! observable, in submission order. [`EstimatorResult`] only extracts and
//! packages these; any averaging over shots has already happened remotely.

use std::fmt;

use serde::{Deserialize, Serialize};

use qrelay_ir::Observable;

use crate::error::{HalError, HalResult};

/// Expectation value and standard error for one observable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservableSummary {
    /// Estimated expectation value.
    pub value: f64,
    /// Standard error of the estimate.
    pub std_error: f64,
}

impl ObservableSummary {
    /// Create a summary.
    pub fn new(value: f64, std_error: f64) -> Self {
        Self { value, std_error }
    }
}

/// Per-observable summaries of a completed job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimatorResult {
    summaries: Vec<ObservableSummary>,
    /// Free-form metadata reported by the service.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl EstimatorResult {
    /// Create a result from summaries in submission order.
    pub fn new(summaries: Vec<ObservableSummary>) -> Self {
        Self {
            summaries,
            metadata: serde_json::Map::new(),
        }
    }

    /// Zip parallel value and error arrays, as remote services report them.
    pub fn from_arrays(values: &[f64], std_errors: &[f64]) -> HalResult<Self> {
        if values.len() != std_errors.len() {
            return Err(HalError::InvalidResponse(format!(
                "{} expectation values but {} standard errors",
                values.len(),
                std_errors.len()
            )));
        }
        Ok(Self::new(
            values
                .iter()
                .zip(std_errors)
                .map(|(&v, &e)| ObservableSummary::new(v, e))
                .collect(),
        ))
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Number of observables.
    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    /// Whether there are no observables.
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// `(value, std_error)` for the observable at `index`.
    pub fn extract(&self, index: usize) -> HalResult<(f64, f64)> {
        self.summaries
            .get(index)
            .map(|s| (s.value, s.std_error))
            .ok_or(HalError::IndexOutOfRange {
                index,
                len: self.summaries.len(),
            })
    }

    /// Summary at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&ObservableSummary> {
        self.summaries.get(index)
    }

    /// All summaries in submission order.
    pub fn summaries(&self) -> &[ObservableSummary] {
        &self.summaries
    }

    /// Iterate over summaries in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &ObservableSummary> {
        self.summaries.iter()
    }

    /// Expectation values in submission order.
    pub fn values(&self) -> Vec<f64> {
        self.summaries.iter().map(|s| s.value).collect()
    }

    /// Standard errors in submission order.
    pub fn std_errors(&self) -> Vec<f64> {
        self.summaries.iter().map(|s| s.std_error).collect()
    }

    /// Pair each summary with the observable it was computed for.
    ///
    /// `observables` must be the request's observables in submission order,
    /// in either index space.
    pub fn report<'a>(&self, observables: &'a [Observable]) -> HalResult<Report<'a>> {
        if observables.len() != self.summaries.len() {
            return Err(HalError::InvalidArgument(format!(
                "{} observables for {} results",
                observables.len(),
                self.summaries.len()
            )));
        }
        Ok(Report {
            rows: observables.iter().zip(self.summaries.iter().copied()).collect(),
        })
    }
}

impl<'a> IntoIterator for &'a EstimatorResult {
    type Item = &'a ObservableSummary;
    type IntoIter = std::slice::Iter<'a, ObservableSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.summaries.iter()
    }
}

impl fmt::Display for EstimatorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>5}  {:>10}  {:>10}", "#", "value", "std_error")?;
        for (i, s) in self.summaries.iter().enumerate() {
            writeln!(f, "{i:>5}  {:>10.4}  {:>10.4}", s.value, s.std_error)?;
        }
        Ok(())
    }
}

/// Observables paired with their summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Report<'a> {
    rows: Vec<(&'a Observable, ObservableSummary)>,
}

impl<'a> Report<'a> {
    /// Rows in submission order.
    pub fn rows(&self) -> &[(&'a Observable, ObservableSummary)] {
        &self.rows
    }

    /// Summary for the first row whose observable equals `observable`.
    pub fn lookup(&self, observable: &Observable) -> Option<ObservableSummary> {
        self.rows
            .iter()
            .find(|(o, _)| *o == observable)
            .map(|(_, s)| *s)
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|(o, _)| o.num_qubits() as usize)
            .max()
            .unwrap_or(0)
            .max("observable".len());
        writeln!(f, "{:<width$}  {:>10}  {:>10}", "observable", "value", "std_error")?;
        for (obs, s) in &self.rows {
            writeln!(
                f,
                "{:<width$}  {:>10.4}  {:>10.4}",
                obs.to_string(),
                s.value,
                s.std_error
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bell_fixture() -> EstimatorResult {
        EstimatorResult::from_arrays(
            &[0.01, -0.02, 0.0, 0.03, 0.98, 0.97],
            &[0.03, 0.03, 0.03, 0.03, 0.01, 0.01],
        )
        .unwrap()
    }

    #[test]
    fn test_extract() {
        let result = bell_fixture();
        assert_eq!(result.len(), 6);
        assert_eq!(result.extract(4).unwrap(), (0.98, 0.01));
        assert!(matches!(
            result.extract(6),
            Err(HalError::IndexOutOfRange { index: 6, len: 6 })
        ));
    }

    #[test]
    fn test_from_arrays_length_mismatch() {
        assert!(matches!(
            EstimatorResult::from_arrays(&[1.0], &[]),
            Err(HalError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_values_and_errors_keep_order() {
        let result = bell_fixture();
        assert_eq!(result.values(), vec![0.01, -0.02, 0.0, 0.03, 0.98, 0.97]);
        assert_eq!(result.std_errors()[5], 0.01);
        assert_eq!(result.iter().count(), 6);
    }

    #[test]
    fn test_report() {
        let observables: Vec<Observable> = ["IZ", "IX", "ZI", "XI", "ZZ", "XX"]
            .iter()
            .map(|l| l.parse().unwrap())
            .collect();
        let result = bell_fixture();
        let report = result.report(&observables).unwrap();

        let zz = report.lookup(&"ZZ".parse().unwrap()).unwrap();
        assert_eq!(zz.value, 0.98);
        assert!(report.to_string().contains("XX"));

        assert!(matches!(
            result.report(&observables[..2]),
            Err(HalError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_display() {
        let text = bell_fixture().to_string();
        assert_eq!(text.lines().count(), 7);
        assert!(text.contains("0.9800"));
    }

    #[test]
    fn test_serde() {
        let result = bell_fixture().with_metadata("backend", serde_json::json!("sim"));
        let json = serde_json::to_string(&result).unwrap();
        let back: EstimatorResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
