//! Interface definitions for the collaborators of the persistence pipeline.
//!
//! These traits allow dependency injection and swappable backends (PostgreSQL,
//! in-memory) behind `OrphanService`.

mod orphan_list_lookup;
mod orphan_repository;
mod sequence_generator;
mod status_lookup;

pub use orphan_list_lookup::OrphanListLookup;
pub use orphan_repository::OrphanRepository;
pub use sequence_generator::SequenceGenerator;
pub use status_lookup::StatusLookup;
