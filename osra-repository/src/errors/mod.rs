//! Error types for the OSRA repository.
//! Consolidates and re-exports the errors of the record store, the sequence
//! generator and the persistence pipeline.

mod repository;
mod sequence;
mod service;

pub use repository::RepositoryError;
pub use sequence::SequenceError;
pub use service::OrphanServiceError;
