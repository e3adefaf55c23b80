//! Error types for the record stores and lookups.

use thiserror::Error;
use uuid::Uuid;

/// Represents errors that can occur within a record store or lookup.
///
/// This enum consolidates the failure conditions of store interactions, such as
/// SQLx errors during database operations or rows that cannot be decoded.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Orphan not found: {0}")]
    NotFound(Uuid),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// The stored record changed since the caller loaded it.
    #[error("Orphan {0} was modified concurrently")]
    Conflict(Uuid),

    /// A record that cannot be written because a field is missing or unparsed.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Decode error: {0}")]
    DecodeError(String),
}

impl RepositoryError {
    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }

    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }
}
