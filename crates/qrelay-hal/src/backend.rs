//! Backend descriptors and backend selection.
//!
//! A [`BackendDescriptor`] is the read-only identity of a remote device: its
//! name, compilation [`Target`] and the queue information a selector needs.
//! Descriptors come from a [`BackendSelector`], which is the capability
//! interface to whatever service lists devices.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use qrelay_compile::Target;

use crate::error::{HalError, HalResult};

/// Read-only description of a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Backend name, as the remote service knows it.
    pub name: String,
    /// Connectivity and native gates.
    pub target: Target,
    /// Whether the backend is a simulator.
    pub simulator: bool,
    /// Whether the backend currently accepts jobs.
    pub operational: bool,
    /// Jobs waiting in the backend's queue.
    pub pending_jobs: u32,
}

impl BackendDescriptor {
    /// Create an operational hardware descriptor with an empty queue.
    pub fn new(name: impl Into<String>, target: Target) -> Self {
        Self {
            name: name.into(),
            target,
            simulator: false,
            operational: true,
            pending_jobs: 0,
        }
    }

    /// Mark the backend as a simulator.
    pub fn simulator(mut self) -> Self {
        self.simulator = true;
        self
    }

    /// Set the operational flag.
    pub fn with_operational(mut self, operational: bool) -> Self {
        self.operational = operational;
        self
    }

    /// Set the queue length.
    pub fn with_pending_jobs(mut self, pending_jobs: u32) -> Self {
        self.pending_jobs = pending_jobs;
        self
    }

    /// Number of physical qubits.
    pub fn num_qubits(&self) -> u32 {
        self.target.num_qubits()
    }
}

/// Filters applied by [`BackendSelector::least_busy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionFilters {
    /// Skip simulators.
    pub exclude_simulators: bool,
    /// Skip backends that are not operational.
    pub require_operational: bool,
    /// Skip backends with fewer qubits.
    pub min_qubits: Option<u32>,
}

impl Default for SelectionFilters {
    fn default() -> Self {
        Self {
            exclude_simulators: true,
            require_operational: true,
            min_qubits: None,
        }
    }
}

impl SelectionFilters {
    /// Filters that accept every backend.
    pub fn any() -> Self {
        Self {
            exclude_simulators: false,
            require_operational: false,
            min_qubits: None,
        }
    }

    /// Require at least `n` qubits.
    pub fn with_min_qubits(mut self, n: u32) -> Self {
        self.min_qubits = Some(n);
        self
    }

    /// Whether a backend passes these filters.
    pub fn matches(&self, backend: &BackendDescriptor) -> bool {
        if self.exclude_simulators && backend.simulator {
            return false;
        }
        if self.require_operational && !backend.operational {
            return false;
        }
        self.min_qubits.is_none_or(|n| backend.num_qubits() >= n)
    }
}

/// Capability to list backends and pick one.
#[async_trait]
pub trait BackendSelector: Send + Sync {
    /// All backends visible to this selector.
    async fn backends(&self) -> HalResult<Vec<BackendDescriptor>>;

    /// The matching backend with the shortest queue.
    ///
    /// Ties go to the backend listed first.
    async fn least_busy(&self, filters: &SelectionFilters) -> HalResult<BackendDescriptor> {
        let candidates = self.backends().await?;
        let total = candidates.len();

        let chosen = candidates
            .into_iter()
            .filter(|b| filters.matches(b))
            .min_by_key(|b| b.pending_jobs)
            .ok_or_else(|| {
                HalError::NoBackendAvailable(format!(
                    "none of {total} backends match {filters:?}"
                ))
            })?;

        debug!(backend = %chosen.name, pending_jobs = chosen.pending_jobs, "selected least busy backend");
        Ok(chosen)
    }
}

/// A selector over a fixed list of descriptors.
#[derive(Debug, Clone, Default)]
pub struct StaticSelector {
    backends: Vec<BackendDescriptor>,
}

impl StaticSelector {
    /// Create a selector over the given backends.
    pub fn new(backends: impl IntoIterator<Item = BackendDescriptor>) -> Self {
        Self {
            backends: backends.into_iter().collect(),
        }
    }
}

#[async_trait]
impl BackendSelector for StaticSelector {
    async fn backends(&self) -> HalResult<Vec<BackendDescriptor>> {
        Ok(self.backends.clone())
    }
}
