use async_trait::async_trait;
use chrono::{DateTime, Utc};
use osra_shared::{Orphan, OrphanFilter, Sponsor, Sponsorship};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::interfaces::OrphanRepository;

/// In-memory orphan store.
#[derive(Default)]
pub struct MemoryOrphanRepository {
    orphans: RwLock<HashMap<Uuid, Orphan>>,
    sponsors: RwLock<HashMap<Uuid, Sponsor>>,
    sponsorships: RwLock<Vec<Sponsorship>>,
}

impl MemoryOrphanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `sponsor` to an orphan, registering the sponsor if it is new.
    pub async fn add_sponsorship(&self, sponsor: Sponsor, sponsorship: Sponsorship) {
        self.sponsors.write().await.insert(sponsor.id, sponsor);
        self.sponsorships.write().await.push(sponsorship);
    }

    pub async fn len(&self) -> usize {
        self.orphans.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orphans.read().await.is_empty()
    }
}

fn address_ids(orphan: &Orphan) -> impl Iterator<Item = Uuid> + '_ {
    [&orphan.original_address, &orphan.current_address]
        .into_iter()
        .flatten()
        .map(|address| address.id)
}

/// Every address row has a single owner, and one owner holds it in one slot.
fn check_address_owner(
    orphans: &HashMap<Uuid, Orphan>,
    orphan: &Orphan,
) -> Result<(), RepositoryError> {
    let ids: Vec<Uuid> = address_ids(orphan).collect();
    if ids.len() == 2 && ids[0] == ids[1] {
        return Err(RepositoryError::duplicate(format!("address {} used twice", ids[0])));
    }
    for other in orphans.values().filter(|other| other.id != orphan.id) {
        if let Some(id) = address_ids(other).find(|id| ids.contains(id)) {
            return Err(RepositoryError::duplicate(format!("address {}", id)));
        }
    }
    Ok(())
}

#[async_trait]
impl OrphanRepository for MemoryOrphanRepository {
    async fn insert(&self, orphan: &Orphan) -> Result<(), RepositoryError> {
        let mut orphans = self.orphans.write().await;
        if orphans.contains_key(&orphan.id) {
            return Err(RepositoryError::duplicate(format!("orphan id {}", orphan.id)));
        }
        if let Some(osra_num) = &orphan.osra_num {
            if orphans
                .values()
                .any(|existing| existing.osra_num.as_ref() == Some(osra_num))
            {
                return Err(RepositoryError::duplicate(format!("osra_num {}", osra_num)));
            }
        }
        check_address_owner(&orphans, orphan)?;
        orphans.insert(orphan.id, orphan.clone());
        Ok(())
    }

    async fn update(
        &self,
        orphan: &Orphan,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let mut orphans = self.orphans.write().await;
        let current = orphans
            .get(&orphan.id)
            .ok_or(RepositoryError::NotFound(orphan.id))?;
        if current.updated_at != expected_updated_at {
            return Err(RepositoryError::Conflict(orphan.id));
        }
        check_address_owner(&orphans, orphan)?;

        let stored = orphans
            .get_mut(&orphan.id)
            .ok_or(RepositoryError::NotFound(orphan.id))?;

        let mut updated = orphan.clone();
        updated.osra_num = stored.osra_num.clone();
        updated.sequential_id = stored.sequential_id;
        updated.created_at = stored.created_at;
        *stored = updated;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Orphan>, RepositoryError> {
        Ok(self.orphans.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &OrphanFilter) -> Result<Vec<Orphan>, RepositoryError> {
        let mut matching: Vec<Orphan> = self
            .orphans
            .read()
            .await
            .values()
            .filter(|orphan| filter.matches(orphan))
            .cloned()
            .collect();
        matching.sort_by_key(|orphan| orphan.sequential_id);
        Ok(matching)
    }

    async fn count(&self, filter: &OrphanFilter) -> Result<u64, RepositoryError> {
        let orphans = self.orphans.read().await;
        Ok(orphans.values().filter(|orphan| filter.matches(orphan)).count() as u64)
    }

    async fn contains(&self, id: Uuid, filter: &OrphanFilter) -> Result<bool, RepositoryError> {
        Ok(self
            .orphans
            .read()
            .await
            .get(&id)
            .is_some_and(|orphan| filter.matches(orphan)))
    }

    async fn sponsors(&self, orphan_id: Uuid) -> Result<Vec<Sponsor>, RepositoryError> {
        let sponsors = self.sponsors.read().await;
        Ok(self
            .sponsorships
            .read()
            .await
            .iter()
            .filter(|sponsorship| sponsorship.orphan_id == orphan_id)
            .filter_map(|sponsorship| sponsors.get(&sponsorship.sponsor_id).cloned())
            .collect())
    }
}
