//! Error types for the persistence pipeline.

use osra_shared::{StatusCategory, ValidationErrors};
use thiserror::Error;
use uuid::Uuid;

use super::{RepositoryError, SequenceError};

/// Errors returned by `OrphanService`.
///
/// `Validation` carries every failed rule keyed by field; nothing was written when
/// it is returned. The other variants are hard failures of a collaborator.
#[derive(Debug, Error)]
pub enum OrphanServiceError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Orphan not found: {0}")]
    NotFound(Uuid),

    #[error("Orphan {0} has already been created")]
    AlreadyPersisted(Uuid),

    /// A named status is missing from its lookup table.
    #[error("Status not found: {category} {name:?}")]
    StatusNotFound {
        category: StatusCategory,
        name: String,
    },

    /// The orphan list is missing or has no partner to take a province code from.
    #[error("Orphan list {0} has no partner")]
    MissingPartner(Uuid),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),
}

impl OrphanServiceError {
    pub fn status_not_found(category: StatusCategory, name: impl Into<String>) -> Self {
        Self::StatusNotFound {
            category,
            name: name.into(),
        }
    }

    /// The field errors, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
