//! This module defines the `OrphanRepository` trait, which abstracts the store
//! holding orphan records, their addresses and their sponsorships.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use osra_shared::{Orphan, OrphanFilter, Sponsor};
use uuid::Uuid;

use crate::errors::RepositoryError;

/// A trait that defines the interface for the orphan record store.
///
/// Implementations write a record and its owned addresses as one unit: either all
/// of it is stored or none of it is. They do not validate; `OrphanService` only
/// hands them records that passed validation.
#[async_trait]
pub trait OrphanRepository: Send + Sync {
    /// Store a new record.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the record and its addresses were stored
    /// * `Err(RepositoryError::Duplicate)` - If the id, the OSRA number or an
    ///   address id is taken
    /// * `Err(RepositoryError)` - If the write fails
    async fn insert(&self, orphan: &Orphan) -> Result<(), RepositoryError>;

    /// Overwrite an existing record.
    ///
    /// Addresses removed from the record are deleted. An address id the stored
    /// record does not own is inserted as a new row. The OSRA number, sequence
    /// number and creation time of the stored record are left as they are.
    ///
    /// The write only happens while the stored `updated_at` still equals
    /// `expected_updated_at`.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the record was updated
    /// * `Err(RepositoryError::NotFound)` - If no record has this id
    /// * `Err(RepositoryError::Conflict)` - If the stored record changed in between
    /// * `Err(RepositoryError::Duplicate)` - If an address id belongs to another record
    /// * `Err(RepositoryError)` - If the write fails
    async fn update(
        &self,
        orphan: &Orphan,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError>;

    /// Load a record by id.
    async fn find(&self, id: Uuid) -> Result<Option<Orphan>, RepositoryError>;

    /// Load every record matching `filter`, ordered by sequence number.
    async fn list(&self, filter: &OrphanFilter) -> Result<Vec<Orphan>, RepositoryError>;

    /// Number of records matching `filter`.
    async fn count(&self, filter: &OrphanFilter) -> Result<u64, RepositoryError>;

    /// Whether the record with `id` is in the collection selected by `filter`.
    async fn contains(&self, id: Uuid, filter: &OrphanFilter) -> Result<bool, RepositoryError>;

    /// Sponsors linked to the record through its sponsorships.
    async fn sponsors(&self, orphan_id: Uuid) -> Result<Vec<Sponsor>, RepositoryError>;
}
