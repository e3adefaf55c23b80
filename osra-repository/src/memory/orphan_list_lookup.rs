use async_trait::async_trait;
use osra_shared::OrphanList;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::interfaces::OrphanListLookup;

/// In-memory orphan lists.
#[derive(Default)]
pub struct MemoryOrphanListLookup {
    lists: RwLock<HashMap<Uuid, OrphanList>>,
}

impl MemoryOrphanListLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, list: OrphanList) {
        self.lists.write().await.insert(list.id, list);
    }
}

#[async_trait]
impl OrphanListLookup for MemoryOrphanListLookup {
    async fn find_orphan_list(&self, id: Uuid) -> Result<Option<OrphanList>, RepositoryError> {
        Ok(self.lists.read().await.get(&id).cloned())
    }
}
