use async_trait::async_trait;
use osra_shared::OrphanList;
use uuid::Uuid;

use crate::errors::RepositoryError;

/// Loads orphan lists together with their partner.
#[async_trait]
pub trait OrphanListLookup: Send + Sync {
    async fn find_orphan_list(&self, id: Uuid) -> Result<Option<OrphanList>, RepositoryError>;
}
