//! In-memory implementations of the collaborator traits.
//!
//! Used by tests and by callers that embed the registry without a database.

mod orphan_list_lookup;
mod orphan_repository;
mod sequence_generator;
mod status_lookup;

pub use orphan_list_lookup::MemoryOrphanListLookup;
pub use orphan_repository::MemoryOrphanRepository;
pub use sequence_generator::MemorySequenceGenerator;
pub use status_lookup::MemoryStatusLookup;
