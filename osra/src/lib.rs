//! # OSRA
//!
//! Service binary for the OSRA orphan registry.
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency initialization
//! - [`report`]: Registry summary built from the collection filters

pub mod config;
pub mod report;

pub use config::{ConnectionMode, Dependencies, Settings};
pub use report::RegistryReport;

use osra_repository::{OrphanServiceError, RepositoryError};
use thiserror::Error;

/// Errors that can occur during startup or while building the report.
#[derive(Error, Debug)]
pub enum OsraError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Service error: {0}")]
    Service(#[from] OrphanServiceError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OsraError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
