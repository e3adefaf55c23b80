use async_trait::async_trait;
use osra_shared::{StatusCategory, StatusRef};

use crate::errors::RepositoryError;

/// Resolves named rows of the status lookup tables.
#[async_trait]
pub trait StatusLookup: Send + Sync {
    /// Find the status called `name` in `category`'s table.
    ///
    /// Returns `Ok(None)` when the table has no such row.
    async fn find_by_name(
        &self,
        category: StatusCategory,
        name: &str,
    ) -> Result<Option<StatusRef>, RepositoryError>;
}
