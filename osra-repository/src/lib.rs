//! # OSRA Repository
//!
//! This crate provides the traits, implementations and persistence pipeline for
//! orphan records. It includes definitions for errors, the collaborator interfaces
//! (record store, status lookup, orphan list lookup, sequence generator), concrete
//! implementations for PostgreSQL and in-memory stores, and the `OrphanService`
//! that runs default-fill, validation and identifier generation before a write.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;
pub mod service;

pub use config::OrphanServiceConfig;
pub use errors::{OrphanServiceError, RepositoryError, SequenceError};
pub use interfaces::{OrphanListLookup, OrphanRepository, SequenceGenerator, StatusLookup};
pub use memory::{
    MemoryOrphanListLookup, MemoryOrphanRepository, MemorySequenceGenerator, MemoryStatusLookup,
};
pub use postgres::{
    PostgresOrphanListLookup, PostgresOrphanRepository, PostgresSequenceGenerator,
    PostgresStatusLookup,
};
pub use service::OrphanService;
