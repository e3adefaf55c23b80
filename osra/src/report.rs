//! Registry summary.

use osra_repository::OrphanService;
use osra_shared::OrphanFilter;
use serde::Serialize;

use crate::OsraError;

/// Record counts per collection filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryReport {
    pub total: u64,
    pub active: u64,
    pub unsponsored: u64,
    pub high_priority: u64,
    /// Active and unsponsored.
    pub eligible: u64,
}

impl RegistryReport {
    pub async fn collect(service: &OrphanService) -> Result<Self, OsraError> {
        let count = |filter: OrphanFilter| async move { service.count(&filter).await };

        Ok(Self {
            total: count(OrphanFilter::new()).await?,
            active: count(OrphanFilter::new().active()).await?,
            unsponsored: count(OrphanFilter::new().unsponsored()).await?,
            high_priority: count(OrphanFilter::new().high_priority()).await?,
            eligible: count(OrphanFilter::eligible()).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osra_repository::{
        MemoryOrphanListLookup, MemoryOrphanRepository, MemorySequenceGenerator,
        MemoryStatusLookup, OrphanRepository,
    };
    use osra_shared::{Orphan, OrphanSponsorshipStatus, OrphanStatus, Priority};
    use std::sync::Arc;

    fn stored(
        sequence: i64,
        status: OrphanStatus,
        sponsorship: OrphanSponsorshipStatus,
        priority: Priority,
    ) -> Orphan {
        let mut orphan = Orphan::new();
        orphan.sequential_id = Some(sequence);
        orphan.osra_num = Some(format!("KR{:05}", sequence));
        orphan.orphan_status = Some(status);
        orphan.orphan_sponsorship_status = Some(sponsorship);
        orphan.priority = Some(priority.into());
        orphan
    }

    #[tokio::test]
    async fn test_collect_counts_each_filter() {
        let repository = Arc::new(MemoryOrphanRepository::new());
        for orphan in [
            stored(
                1,
                OrphanStatus::Active,
                OrphanSponsorshipStatus::Unsponsored,
                Priority::High,
            ),
            stored(
                2,
                OrphanStatus::Active,
                OrphanSponsorshipStatus::Sponsored,
                Priority::Normal,
            ),
            stored(
                3,
                OrphanStatus::Inactive,
                OrphanSponsorshipStatus::Unsponsored,
                Priority::High,
            ),
        ] {
            repository.insert(&orphan).await.unwrap();
        }

        let service = OrphanService::new(
            repository,
            Arc::new(MemoryStatusLookup::new()),
            Arc::new(MemoryOrphanListLookup::new()),
            Arc::new(MemorySequenceGenerator::new()),
        );

        let report = RegistryReport::collect(&service).await.unwrap();
        assert_eq!(
            report,
            RegistryReport {
                total: 3,
                active: 2,
                unsponsored: 2,
                high_priority: 2,
                eligible: 1,
            }
        );
    }
}
