//! The ordered collection of supervisors built from configuration
//!
//! The registry preserves configuration order because the menu's 1-based
//! index numbering is derived from it. It is constructed once at startup
//! and passed by reference to whatever consumes it; there is no global
//! process list.

use log::info;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::config::ProcessSpec;
use crate::rotation::LogRotator;
use crate::supervisor::ProcessSupervisor;

/// A menu selection that does not match any process entry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No process entry at index {0}")]
pub struct LookupError(pub usize);

/// Holds one supervisor per configured process, in configuration order
pub struct SupervisorRegistry {
    supervisors: Vec<ProcessSupervisor>,
}

impl SupervisorRegistry {
    /// Build one supervisor per spec. All supervisors share the log
    /// directory and retention count; each writes under its own base name.
    pub fn new(specs: Vec<ProcessSpec>, log_dir: &Path, retain: usize) -> Self {
        let supervisors = specs
            .into_iter()
            .map(|spec| ProcessSupervisor::new(spec, LogRotator::new(log_dir, retain)))
            .collect();
        Self { supervisors }
    }

    /// Apply a shared graceful-termination wait to every supervisor
    pub fn with_stop_grace(self, grace: Duration) -> Self {
        Self {
            supervisors: self
                .supervisors
                .into_iter()
                .map(|s| s.with_stop_grace(grace))
                .collect(),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.supervisors.len()
    }

    /// Whether the registry holds no entries
    pub fn is_empty(&self) -> bool {
        self.supervisors.is_empty()
    }

    /// All supervisors in display order, for status-snapshot rendering
    pub fn all(&self) -> impl Iterator<Item = &ProcessSupervisor> {
        self.supervisors.iter()
    }

    /// Entry at `index`, 1-based as displayed in the menu
    pub fn get(&self, index: usize) -> Result<&ProcessSupervisor, LookupError> {
        index
            .checked_sub(1)
            .and_then(|i| self.supervisors.get(i))
            .ok_or(LookupError(index))
    }

    /// Mutable entry at `index`, 1-based as displayed in the menu
    pub fn get_mut(&mut self, index: usize) -> Result<&mut ProcessSupervisor, LookupError> {
        index
            .checked_sub(1)
            .and_then(|i| self.supervisors.get_mut(i))
            .ok_or(LookupError(index))
    }

    /// Stop every running process in order. Individual failures are logged
    /// by the supervisors and never interrupt the sweep.
    pub async fn shutdown_all(&mut self) {
        info!("Stopping all running processes");
        for supervisor in &mut self.supervisors {
            supervisor.cleanup().await;
        }
    }
}
