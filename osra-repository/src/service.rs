//! Orphan persistence service.
//!
//! This module provides the pipeline every orphan write goes through. Application
//! code uses this to create and update records and to move them between
//! sponsorship states.
//!
//! # Pipeline
//!
//! A record is default-filled, then validated, and only then receives its OSRA
//! number and is written. A record that fails validation is never written and
//! consumes no sequence number.
//!
//! Writes to a stored record are read-modify-write cycles. The store rejects a
//! write whose record changed after it was loaded, and the cycle is rerun on the
//! fresh record a bounded number of times.

use chrono::{DateTime, SubsecRound, Utc};
use osra_shared::{
    format_osra_num, validate_orphan, Orphan, OrphanFilter, OrphanSponsorshipStatus, OrphanStatus,
    OrphanUpdate, Priority, Sponsor, Status, ValidationErrors,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::OrphanServiceConfig;
use crate::errors::{OrphanServiceError, RepositoryError};
use crate::interfaces::{OrphanListLookup, OrphanRepository, SequenceGenerator, StatusLookup};

/// Attempts of a read-modify-write cycle before a conflict is returned.
const MAX_WRITE_ATTEMPTS: usize = 5;

/// Timestamps are kept at the precision PostgreSQL stores.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// The main service for reading and writing orphan records.
///
/// This is the high-level API that application code should use. It fills defaults,
/// runs validation, generates identifiers and delegates storage to an
/// `OrphanRepository`. All operations return `OrphanServiceError`.
///
/// # Example
///
/// ```no_run
/// use osra_repository::{
///     MemoryOrphanListLookup, MemoryOrphanRepository, MemorySequenceGenerator,
///     MemoryStatusLookup, OrphanService,
/// };
/// use osra_shared::Orphan;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = OrphanService::new(
///     Arc::new(MemoryOrphanRepository::new()),
///     Arc::new(MemoryStatusLookup::new()),
///     Arc::new(MemoryOrphanListLookup::new()),
///     Arc::new(MemorySequenceGenerator::new()),
/// );
///
/// match service.create(Orphan::new()).await {
///     Ok(orphan) => println!("created {}", orphan.osra_num.unwrap_or_default()),
///     Err(err) => println!("rejected: {}", err),
/// }
/// # Ok(())
/// # }
/// ```
pub struct OrphanService {
    repository: Arc<dyn OrphanRepository>,
    statuses: Arc<dyn StatusLookup>,
    orphan_lists: Arc<dyn OrphanListLookup>,
    sequence: Arc<dyn SequenceGenerator>,
    config: OrphanServiceConfig,
}

impl OrphanService {
    /// Create a new OrphanService with default configuration.
    ///
    /// # Arguments
    ///
    /// * `repository` - Store for orphan records
    /// * `statuses` - Lookup for the status tables
    /// * `orphan_lists` - Lookup for orphan lists and their partners
    /// * `sequence` - Source of OSRA sequence numbers
    pub fn new(
        repository: Arc<dyn OrphanRepository>,
        statuses: Arc<dyn StatusLookup>,
        orphan_lists: Arc<dyn OrphanListLookup>,
        sequence: Arc<dyn SequenceGenerator>,
    ) -> Self {
        Self::with_config(
            repository,
            statuses,
            orphan_lists,
            sequence,
            OrphanServiceConfig::default(),
        )
    }

    /// Create a new OrphanService with custom configuration.
    pub fn with_config(
        repository: Arc<dyn OrphanRepository>,
        statuses: Arc<dyn StatusLookup>,
        orphan_lists: Arc<dyn OrphanListLookup>,
        sequence: Arc<dyn SequenceGenerator>,
        config: OrphanServiceConfig,
    ) -> Self {
        Self {
            repository,
            statuses,
            orphan_lists,
            sequence,
            config,
        }
    }

    pub fn config(&self) -> &OrphanServiceConfig {
        &self.config
    }

    /// Resolve the named status row and return it as its enum.
    async fn resolve_status<S: Status>(&self, status: S) -> Result<S, OrphanServiceError> {
        self.statuses
            .find_by_name(S::CATEGORY, status.name())
            .await?
            .and_then(|row| row.resolve::<S>())
            .ok_or_else(|| OrphanServiceError::status_not_found(S::CATEGORY, status.name()))
    }

    /// Fill the status and priority fields that are unset.
    ///
    /// Statuses are resolved through the lookup tables, so a missing "Active" or
    /// "Unsponsored" row is an error. Explicit values are never overwritten, which
    /// makes this safe to run on every save.
    pub async fn initialize(&self, mut orphan: Orphan) -> Result<Orphan, OrphanServiceError> {
        if orphan.orphan_status.is_none() {
            orphan.orphan_status = Some(self.resolve_status(OrphanStatus::Active).await?);
        }
        if orphan.orphan_sponsorship_status.is_none() {
            orphan.orphan_sponsorship_status =
                Some(self.resolve_status(OrphanSponsorshipStatus::Unsponsored).await?);
        }
        if orphan.priority.is_none() {
            orphan.priority = Some(Priority::Normal.into());
        }
        Ok(orphan)
    }

    /// Run every validation rule and collect the failures.
    ///
    /// On top of the field rules this checks that the referenced orphan list
    /// exists. An empty result means the record can be saved.
    pub async fn validate(&self, orphan: &Orphan) -> Result<ValidationErrors, OrphanServiceError> {
        let mut errors = validate_orphan(orphan, Utc::now().date_naive());

        if let Some(list_id) = orphan.orphan_list_id {
            if self.orphan_lists.find_orphan_list(list_id).await?.is_none() {
                errors.add("orphan_list", osra_shared::validation::BLANK);
            }
        }

        Ok(errors)
    }

    async fn ensure_valid(&self, orphan: &Orphan) -> Result<(), OrphanServiceError> {
        let errors = self.validate(orphan).await?;
        if errors.is_empty() {
            Ok(())
        } else {
            debug!(orphan_id = %orphan.id, errors = %errors, "Orphan failed validation");
            Err(OrphanServiceError::Validation(errors))
        }
    }

    /// Build the OSRA number for a record about to be persisted.
    ///
    /// The partner is checked before a sequence number is drawn, so a list
    /// without a partner does not burn a number. A partner without a province
    /// code yields the bare padded sequence.
    async fn generate_osra_num(&self, orphan: &Orphan) -> Result<(i64, String), OrphanServiceError> {
        let list_id = orphan
            .orphan_list_id
            .ok_or(OrphanServiceError::MissingPartner(orphan.id))?;
        let list = self
            .orphan_lists
            .find_orphan_list(list_id)
            .await?
            .ok_or(OrphanServiceError::MissingPartner(list_id))?;
        if list.partner.is_none() {
            return Err(OrphanServiceError::MissingPartner(list_id));
        }
        let province_code = list.partner_province_code().unwrap_or_default();

        let sequence = self.sequence.next(&self.config.sequence_scope).await?;
        let osra_num = format_osra_num(province_code, sequence, self.config.osra_num_width);
        Ok((sequence, osra_num))
    }

    /// Create a new record.
    ///
    /// Runs default-fill and validation, then assigns the sequence number and OSRA
    /// number and inserts the record. Any `osra_num` or `sequential_id` supplied by
    /// the caller is replaced.
    ///
    /// # Returns
    ///
    /// * `Ok(Orphan)` - The stored record, with identifier and timestamps set
    /// * `Err(OrphanServiceError::Validation)` - If any rule failed; nothing was written
    /// * `Err(OrphanServiceError::AlreadyPersisted)` - If the record was created before
    /// * `Err(OrphanServiceError)` - If a collaborator failed
    #[instrument(skip_all, fields(orphan_id = %orphan.id))]
    pub async fn create(&self, orphan: Orphan) -> Result<Orphan, OrphanServiceError> {
        if orphan.is_persisted() {
            return Err(OrphanServiceError::AlreadyPersisted(orphan.id));
        }

        let mut orphan = self.initialize(orphan).await?;
        self.ensure_valid(&orphan).await?;

        let (sequence, osra_num) = self.generate_osra_num(&orphan).await?;
        orphan.sequential_id = Some(sequence);
        orphan.osra_num = Some(osra_num);

        let created_at = now();
        orphan.created_at = Some(created_at);
        orphan.updated_at = Some(created_at);

        self.repository.insert(&orphan).await?;

        info!(
            osra_num = orphan.osra_num.as_deref().unwrap_or_default(),
            sequential_id = sequence,
            "Orphan created"
        );
        Ok(orphan)
    }

    /// Apply a field update to a stored record.
    ///
    /// The record is re-validated after the update. The OSRA number is never
    /// recomputed.
    #[instrument(skip_all, fields(orphan_id = %id))]
    pub async fn update(&self, id: Uuid, update: OrphanUpdate) -> Result<Orphan, OrphanServiceError> {
        self.modify(id, |orphan| orphan.apply(update.clone())).await
    }

    /// Set the sponsorship status to "Sponsored" and persist.
    pub async fn mark_sponsored(&self, id: Uuid) -> Result<Orphan, OrphanServiceError> {
        self.transition_sponsorship(id, OrphanSponsorshipStatus::Sponsored)
            .await
    }

    /// Set the sponsorship status to "Unsponsored" and persist.
    pub async fn mark_unsponsored(&self, id: Uuid) -> Result<Orphan, OrphanServiceError> {
        self.transition_sponsorship(id, OrphanSponsorshipStatus::Unsponsored)
            .await
    }

    #[instrument(skip(self, status), fields(status = %status))]
    async fn transition_sponsorship(
        &self,
        id: Uuid,
        status: OrphanSponsorshipStatus,
    ) -> Result<Orphan, OrphanServiceError> {
        let status = self.resolve_status(status).await?;
        let orphan = self
            .modify(id, |orphan| orphan.orphan_sponsorship_status = Some(status))
            .await?;
        info!(
            osra_num = orphan.osra_num.as_deref().unwrap_or_default(),
            "Sponsorship status changed"
        );
        Ok(orphan)
    }

    async fn load(&self, id: Uuid) -> Result<Orphan, OrphanServiceError> {
        self.repository
            .find(id)
            .await?
            .ok_or(OrphanServiceError::NotFound(id))
    }

    /// Load the record, apply `change` and save it, starting over on the fresh
    /// record when another write got in between.
    async fn modify<F>(&self, id: Uuid, change: F) -> Result<Orphan, OrphanServiceError>
    where
        F: Fn(&mut Orphan) + Send + Sync,
    {
        let mut attempt = 1;
        loop {
            let mut orphan = self.load(id).await?;
            let loaded_at = orphan.updated_at;
            change(&mut orphan);

            match self.save(orphan, loaded_at).await {
                Err(OrphanServiceError::Repository(RepositoryError::Conflict(_)))
                    if attempt < MAX_WRITE_ATTEMPTS =>
                {
                    debug!(orphan_id = %id, attempt, "Concurrent write, reloading");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Default-fill, validate and write an already persisted record.
    async fn save(
        &self,
        orphan: Orphan,
        loaded_at: Option<DateTime<Utc>>,
    ) -> Result<Orphan, OrphanServiceError> {
        let mut orphan = self.initialize(orphan).await?;
        self.ensure_valid(&orphan).await?;

        // Always later than the loaded value.
        let mut updated_at = now();
        if let Some(loaded_at) = loaded_at {
            if updated_at <= loaded_at {
                updated_at = loaded_at + chrono::Duration::microseconds(1);
            }
        }
        orphan.updated_at = Some(updated_at);
        self.repository.update(&orphan, loaded_at).await?;
        Ok(orphan)
    }

    /// Whether the record can take a new sponsor: it is persisted, "Active" and
    /// "Unsponsored".
    ///
    /// The answer comes from the store, so it reflects the persisted state rather
    /// than unsaved changes on `orphan`.
    pub async fn eligible_for_sponsorship(&self, orphan: &Orphan) -> Result<bool, OrphanServiceError> {
        if !orphan.is_persisted() {
            return Ok(false);
        }
        Ok(self
            .repository
            .contains(orphan.id, &OrphanFilter::eligible())
            .await?)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Orphan>, OrphanServiceError> {
        Ok(self.repository.find(id).await?)
    }

    /// Every stored record matching `filter`, in sequence order.
    pub async fn list(&self, filter: &OrphanFilter) -> Result<Vec<Orphan>, OrphanServiceError> {
        Ok(self.repository.list(filter).await?)
    }

    /// Number of stored records matching `filter`.
    pub async fn count(&self, filter: &OrphanFilter) -> Result<u64, OrphanServiceError> {
        Ok(self.repository.count(filter).await?)
    }

    pub async fn sponsors(&self, orphan_id: Uuid) -> Result<Vec<Sponsor>, OrphanServiceError> {
        Ok(self.repository.sponsors(orphan_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{RepositoryError, SequenceError};
    use crate::memory::{
        MemoryOrphanListLookup, MemoryOrphanRepository, MemorySequenceGenerator,
        MemoryStatusLookup,
    };
    use chrono::NaiveDate;
    use osra_shared::{Address, FieldValue, Gender, OrphanList, Partner, StatusCategory};

    struct Fixture {
        repository: Arc<MemoryOrphanRepository>,
        sequence: Arc<MemorySequenceGenerator>,
        service: OrphanService,
        list_id: Uuid,
    }

    async fn fixture_with(statuses: MemoryStatusLookup, province_code: Option<&str>) -> Fixture {
        let repository = Arc::new(MemoryOrphanRepository::new());
        let orphan_lists = Arc::new(MemoryOrphanListLookup::new());
        let sequence = Arc::new(MemorySequenceGenerator::new());

        let list_id = Uuid::new_v4();
        orphan_lists
            .insert(OrphanList {
                id: list_id,
                osra_num: None,
                partner: Some(Partner {
                    id: Uuid::new_v4(),
                    name: "Karam".to_string(),
                    province_code: province_code.map(str::to_string),
                }),
            })
            .await;

        let service = OrphanService::new(
            repository.clone(),
            Arc::new(statuses),
            orphan_lists,
            sequence.clone(),
        );

        Fixture {
            repository,
            sequence,
            service,
            list_id,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(MemoryStatusLookup::new(), Some("KR")).await
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn complete_orphan(list_id: Uuid) -> Orphan {
        let mut orphan = Orphan::new();
        orphan.name = Some("Omar".to_string());
        orphan.father_name = Some("Hassan".to_string());
        orphan.father_is_martyr = Some(true);
        orphan.father_date_of_death = Some(date(2014, 6, 1).into());
        orphan.mother_name = Some("Fatima".to_string());
        orphan.mother_alive = Some(false);
        orphan.date_of_birth = Some(date(2014, 12, 1).into());
        orphan.gender = Some(Gender::Male.into());
        orphan.contact_number = Some("0944 123 456".to_string());
        orphan.sponsored_by_another_org = Some(false);
        orphan.minor_siblings_count = Some(2);
        orphan.original_address = Some(Address::new("Homs", "HM", "Bab Amr"));
        orphan.current_address = Some(Address::new("Idlib", "ID", "Old town"));
        orphan.orphan_list_id = Some(list_id);
        orphan
    }

    #[tokio::test]
    async fn test_initialize_fills_unset_fields_only() {
        let f = fixture().await;

        let filled = f.service.initialize(Orphan::new()).await.unwrap();
        assert_eq!(filled.orphan_status, Some(OrphanStatus::Active));
        assert_eq!(
            filled.orphan_sponsorship_status,
            Some(OrphanSponsorshipStatus::Unsponsored)
        );
        assert_eq!(filled.priority(), Some(Priority::Normal));

        let mut explicit = Orphan::new();
        explicit.orphan_status = Some(OrphanStatus::OnHold);
        explicit.orphan_sponsorship_status = Some(OrphanSponsorshipStatus::Sponsored);
        explicit.priority = Some(Priority::High.into());

        let kept = f.service.initialize(explicit.clone()).await.unwrap();
        assert_eq!(kept, explicit);

        let again = f.service.initialize(kept.clone()).await.unwrap();
        assert_eq!(again, kept);
    }

    #[tokio::test]
    async fn test_initialize_keeps_unparsed_priority() {
        let f = fixture().await;
        let mut orphan = Orphan::new();
        orphan.priority = Some(FieldValue::parse("Urgent"));

        let filled = f.service.initialize(orphan).await.unwrap();
        assert_eq!(filled.priority, Some(FieldValue::Invalid("Urgent".to_string())));
    }

    #[tokio::test]
    async fn test_initialize_missing_status_row() {
        let statuses = MemoryStatusLookup::new().without(StatusCategory::Orphan, "Active");
        let f = fixture_with(statuses, Some("KR")).await;

        let err = f.service.initialize(Orphan::new()).await.unwrap_err();
        assert!(matches!(
            err,
            OrphanServiceError::StatusNotFound { category: StatusCategory::Orphan, ref name }
                if name == "Active"
        ));
    }

    #[tokio::test]
    async fn test_create_assigns_osra_num() {
        let f = fixture().await;

        let created = f.service.create(complete_orphan(f.list_id)).await.unwrap();
        assert_eq!(created.osra_num.as_deref(), Some("KR00001"));
        assert_eq!(created.sequential_id, Some(1));
        assert!(created.is_persisted());
        assert_eq!(created.orphan_status, Some(OrphanStatus::Active));
        assert_eq!(
            created.orphan_sponsorship_status,
            Some(OrphanSponsorshipStatus::Unsponsored)
        );

        let second = f.service.create(complete_orphan(f.list_id)).await.unwrap();
        assert_eq!(second.osra_num.as_deref(), Some("KR00002"));
        assert_eq!(f.repository.len().await, 2);
    }

    #[tokio::test]
    async fn test_create_overwrites_supplied_identifier() {
        let f = fixture().await;
        let mut orphan = complete_orphan(f.list_id);
        orphan.osra_num = Some("ZZ99999".to_string());
        orphan.sequential_id = Some(99999);

        let created = f.service.create(orphan).await.unwrap();
        assert_eq!(created.osra_num.as_deref(), Some("KR00001"));
        assert_eq!(created.sequential_id, Some(1));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_record_without_drawing_sequence() {
        let f = fixture().await;
        let mut orphan = complete_orphan(f.list_id);
        orphan.name = None;
        orphan.gender = Some(FieldValue::parse("Other"));
        orphan.minor_siblings_count = Some(-1);

        let err = f.service.create(orphan).await.unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.on("name"), ["can't be blank"]);
        assert_eq!(errors.on("gender"), ["is not included in the list"]);
        assert_eq!(errors.on("minor_siblings_count"), ["must be greater than or equal to 0"]);
        assert!(f.repository.is_empty().await);

        let created = f.service.create(complete_orphan(f.list_id)).await.unwrap();
        assert_eq!(created.sequential_id, Some(1));
    }

    #[tokio::test]
    async fn test_create_reports_unknown_orphan_list() {
        let f = fixture().await;
        let orphan = complete_orphan(Uuid::new_v4());

        let err = f.service.create(orphan).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().on("orphan_list"),
            ["can't be blank"]
        );
    }

    #[tokio::test]
    async fn test_create_without_province_code_uses_bare_sequence() {
        let f = fixture_with(MemoryStatusLookup::new(), None).await;

        let created = f.service.create(complete_orphan(f.list_id)).await.unwrap();
        assert_eq!(created.osra_num.as_deref(), Some("00001"));
        assert_eq!(created.sequential_id, Some(1));
    }

    #[tokio::test]
    async fn test_create_requires_partner() {
        let f = fixture().await;
        let orphan_lists = Arc::new(MemoryOrphanListLookup::new());
        let list_id = Uuid::new_v4();
        orphan_lists
            .insert(OrphanList {
                id: list_id,
                osra_num: None,
                partner: None,
            })
            .await;
        let service = OrphanService::new(
            f.repository.clone(),
            Arc::new(MemoryStatusLookup::new()),
            orphan_lists,
            f.sequence.clone(),
        );

        let err = service.create(complete_orphan(list_id)).await.unwrap_err();
        assert!(matches!(err, OrphanServiceError::MissingPartner(id) if id == list_id));
        assert!(f.repository.is_empty().await);
        assert_eq!(f.sequence.next("orphans").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_accepts_empty_province_code() {
        let f = fixture_with(MemoryStatusLookup::new(), Some("")).await;

        let created = f.service.create(complete_orphan(f.list_id)).await.unwrap();
        assert_eq!(created.osra_num.as_deref(), Some("00001"));
    }

    #[tokio::test]
    async fn test_create_twice_is_rejected() {
        let f = fixture().await;
        let created = f.service.create(complete_orphan(f.list_id)).await.unwrap();

        let err = f.service.create(created.clone()).await.unwrap_err();
        assert!(matches!(err, OrphanServiceError::AlreadyPersisted(id) if id == created.id));
    }

    #[tokio::test]
    async fn test_create_uses_configured_scope_and_width() {
        let f = fixture().await;
        let sequence = Arc::new(MemorySequenceGenerator::starting_at("registry", 123456));
        let orphan_lists = Arc::new(MemoryOrphanListLookup::new());
        orphan_lists
            .insert(OrphanList {
                id: f.list_id,
                osra_num: None,
                partner: Some(Partner {
                    id: Uuid::new_v4(),
                    name: "Karam".to_string(),
                    province_code: Some("AL".to_string()),
                }),
            })
            .await;

        let service = OrphanService::with_config(
            f.repository.clone(),
            Arc::new(MemoryStatusLookup::new()),
            orphan_lists,
            sequence,
            OrphanServiceConfig::default()
                .with_sequence_scope("registry")
                .with_osra_num_width(7),
        );

        assert_eq!(service.config().sequence_scope, "registry");

        let created = service.create(complete_orphan(f.list_id)).await.unwrap();
        assert_eq!(created.osra_num.as_deref(), Some("AL0123456"));
    }

    #[tokio::test]
    async fn test_update_revalidates_and_keeps_identifier() {
        let f = fixture().await;
        let created = f.service.create(complete_orphan(f.list_id)).await.unwrap();

        let updated = f
            .service
            .update(
                created.id,
                OrphanUpdate {
                    name: Some("Amr".to_string()),
                    priority: Some(Priority::High.into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name(), "Amr Hassan");
        assert_eq!(updated.osra_num, created.osra_num);
        assert_eq!(updated.sequential_id, created.sequential_id);

        let err = f
            .service
            .update(
                created.id,
                OrphanUpdate {
                    date_of_birth: Some(date(2016, 1, 1).into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().on("date_of_birth"),
            ["date of birth must be within the gestation period of father's death"]
        );

        let stored = f.service.find(created.id).await.unwrap().unwrap();
        assert_eq!(stored.date_of_birth(), Some(date(2014, 12, 1)));
        assert_eq!(stored.name.as_deref(), Some("Amr"));
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let f = fixture().await;
        let id = Uuid::new_v4();

        let err = f
            .service
            .update(id, OrphanUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OrphanServiceError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_sponsorship_transitions() {
        let f = fixture().await;
        let created = f.service.create(complete_orphan(f.list_id)).await.unwrap();
        assert!(f.service.eligible_for_sponsorship(&created).await.unwrap());

        let sponsored = f.service.mark_sponsored(created.id).await.unwrap();
        assert_eq!(
            sponsored.orphan_sponsorship_status,
            Some(OrphanSponsorshipStatus::Sponsored)
        );
        assert!(!f.service.eligible_for_sponsorship(&sponsored).await.unwrap());

        let unsponsored = f.service.mark_unsponsored(created.id).await.unwrap();
        assert_eq!(
            unsponsored.orphan_sponsorship_status,
            Some(OrphanSponsorshipStatus::Unsponsored)
        );
        assert!(f.service.eligible_for_sponsorship(&unsponsored).await.unwrap());
    }

    #[tokio::test]
    async fn test_transition_fails_on_invalid_stored_record() {
        let f = fixture().await;
        let mut orphan = complete_orphan(f.list_id);
        orphan.contact_number = None;
        orphan.orphan_status = Some(OrphanStatus::Active);
        orphan.orphan_sponsorship_status = Some(OrphanSponsorshipStatus::Unsponsored);
        orphan.priority = Some(Priority::Normal.into());
        orphan.created_at = Some(Utc::now());
        f.repository.insert(&orphan).await.unwrap();

        let err = f.service.mark_sponsored(orphan.id).await.unwrap_err();
        assert!(err.validation_errors().unwrap().contains("contact_number"));

        let stored = f.service.find(orphan.id).await.unwrap().unwrap();
        assert_eq!(
            stored.orphan_sponsorship_status,
            Some(OrphanSponsorshipStatus::Unsponsored)
        );
    }

    #[tokio::test]
    async fn test_transition_missing_status_row() {
        let statuses =
            MemoryStatusLookup::new().without(StatusCategory::Sponsorship, "Sponsored");
        let f = fixture_with(statuses, Some("KR")).await;
        let created = f.service.create(complete_orphan(f.list_id)).await.unwrap();

        let err = f.service.mark_sponsored(created.id).await.unwrap_err();
        assert!(matches!(
            err,
            OrphanServiceError::StatusNotFound { category: StatusCategory::Sponsorship, .. }
        ));
    }

    #[tokio::test]
    async fn test_unpersisted_record_is_not_eligible() {
        let f = fixture().await;
        let orphan = f.service.initialize(complete_orphan(f.list_id)).await.unwrap();
        assert!(!f.service.eligible_for_sponsorship(&orphan).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let f = fixture().await;
        let first = f.service.create(complete_orphan(f.list_id)).await.unwrap();
        let mut urgent = complete_orphan(f.list_id);
        urgent.priority = Some(Priority::High.into());
        let second = f.service.create(urgent).await.unwrap();
        f.service.mark_sponsored(first.id).await.unwrap();

        let all = f.service.list(&OrphanFilter::new()).await.unwrap();
        assert_eq!(
            all.iter().map(|o| o.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );

        let eligible = f.service.list(&OrphanFilter::eligible()).await.unwrap();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, second.id);

        let high = f
            .service
            .list(&OrphanFilter::new().high_priority())
            .await
            .unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].id, second.id);
    }

    /// Store that lets another writer rename the record right before the first
    /// update it receives.
    struct InterleavedWriter {
        inner: Arc<MemoryOrphanRepository>,
        interleaved: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl OrphanRepository for InterleavedWriter {
        async fn insert(&self, orphan: &Orphan) -> Result<(), RepositoryError> {
            self.inner.insert(orphan).await
        }

        async fn update(
            &self,
            orphan: &Orphan,
            expected_updated_at: Option<DateTime<Utc>>,
        ) -> Result<(), RepositoryError> {
            if !self
                .interleaved
                .swap(true, std::sync::atomic::Ordering::SeqCst)
            {
                let mut other = self.inner.find(orphan.id).await?.unwrap();
                let loaded_at = other.updated_at;
                other.name = Some("Amr".to_string());
                other.updated_at = loaded_at.map(|t| t + chrono::Duration::milliseconds(1));
                self.inner.update(&other, loaded_at).await?;
            }
            self.inner.update(orphan, expected_updated_at).await
        }

        async fn find(&self, id: Uuid) -> Result<Option<Orphan>, RepositoryError> {
            self.inner.find(id).await
        }

        async fn list(&self, filter: &OrphanFilter) -> Result<Vec<Orphan>, RepositoryError> {
            self.inner.list(filter).await
        }

        async fn count(&self, filter: &OrphanFilter) -> Result<u64, RepositoryError> {
            self.inner.count(filter).await
        }

        async fn contains(&self, id: Uuid, filter: &OrphanFilter) -> Result<bool, RepositoryError> {
            self.inner.contains(id, filter).await
        }

        async fn sponsors(&self, orphan_id: Uuid) -> Result<Vec<Sponsor>, RepositoryError> {
            self.inner.sponsors(orphan_id).await
        }
    }

    #[tokio::test]
    async fn test_transition_keeps_concurrent_update() {
        let f = fixture().await;
        let created = f.service.create(complete_orphan(f.list_id)).await.unwrap();

        let orphan_lists = Arc::new(MemoryOrphanListLookup::new());
        orphan_lists
            .insert(OrphanList {
                id: f.list_id,
                osra_num: None,
                partner: None,
            })
            .await;
        let service = OrphanService::new(
            Arc::new(InterleavedWriter {
                inner: f.repository.clone(),
                interleaved: Default::default(),
            }),
            Arc::new(MemoryStatusLookup::new()),
            orphan_lists,
            f.sequence.clone(),
        );

        let sponsored = service.mark_sponsored(created.id).await.unwrap();
        assert_eq!(sponsored.name.as_deref(), Some("Amr"));

        let stored = f.service.find(created.id).await.unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("Amr"));
        assert_eq!(
            stored.orphan_sponsorship_status,
            Some(OrphanSponsorshipStatus::Sponsored)
        );
    }

    #[tokio::test]
    async fn test_update_keeps_concurrent_update() {
        let f = fixture().await;
        let created = f.service.create(complete_orphan(f.list_id)).await.unwrap();

        let orphan_lists = Arc::new(MemoryOrphanListLookup::new());
        orphan_lists
            .insert(OrphanList {
                id: f.list_id,
                osra_num: None,
                partner: None,
            })
            .await;
        let service = OrphanService::new(
            Arc::new(InterleavedWriter {
                inner: f.repository.clone(),
                interleaved: Default::default(),
            }),
            Arc::new(MemoryStatusLookup::new()),
            orphan_lists,
            f.sequence.clone(),
        );

        service
            .update(
                created.id,
                OrphanUpdate {
                    priority: Some(Priority::High.into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stored = f.service.find(created.id).await.unwrap().unwrap();
        assert_eq!(stored.name.as_deref(), Some("Amr"));
        assert_eq!(stored.priority(), Some(Priority::High));
    }

    #[tokio::test]
    async fn test_count_matches_list() {
        let f = fixture().await;
        let first = f.service.create(complete_orphan(f.list_id)).await.unwrap();
        f.service.create(complete_orphan(f.list_id)).await.unwrap();
        f.service.mark_sponsored(first.id).await.unwrap();

        assert_eq!(f.service.count(&OrphanFilter::new()).await.unwrap(), 2);
        assert_eq!(f.service.count(&OrphanFilter::eligible()).await.unwrap(), 1);
        assert_eq!(
            f.service.count(&OrphanFilter::new().high_priority()).await.unwrap(),
            0
        );
    }

    struct FailingSequence;

    #[async_trait::async_trait]
    impl SequenceGenerator for FailingSequence {
        async fn next(&self, scope: &str) -> Result<i64, SequenceError> {
            Err(SequenceError::Exhausted(scope.to_string()))
        }
    }

    #[tokio::test]
    async fn test_sequence_failure_propagates() {
        let f = fixture().await;
        let orphan_lists = Arc::new(MemoryOrphanListLookup::new());
        orphan_lists
            .insert(OrphanList {
                id: f.list_id,
                osra_num: None,
                partner: Some(Partner {
                    id: Uuid::new_v4(),
                    name: "Karam".to_string(),
                    province_code: Some("KR".to_string()),
                }),
            })
            .await;
        let service = OrphanService::new(
            f.repository.clone(),
            Arc::new(MemoryStatusLookup::new()),
            orphan_lists,
            Arc::new(FailingSequence),
        );

        let err = service.create(complete_orphan(f.list_id)).await.unwrap_err();
        assert!(matches!(err, OrphanServiceError::Sequence(_)));
        assert!(f.repository.is_empty().await);
    }

    #[tokio::test]
    async fn test_duplicate_osra_num_surfaces_repository_error() {
        let f = fixture().await;
        f.service.create(complete_orphan(f.list_id)).await.unwrap();

        let orphan_lists = Arc::new(MemoryOrphanListLookup::new());
        orphan_lists
            .insert(OrphanList {
                id: f.list_id,
                osra_num: None,
                partner: Some(Partner {
                    id: Uuid::new_v4(),
                    name: "Karam".to_string(),
                    province_code: Some("KR".to_string()),
                }),
            })
            .await;
        let reset = OrphanService::new(
            f.repository.clone(),
            Arc::new(MemoryStatusLookup::new()),
            orphan_lists,
            Arc::new(MemorySequenceGenerator::new()),
        );

        let err = reset.create(complete_orphan(f.list_id)).await.unwrap_err();
        assert!(matches!(
            err,
            OrphanServiceError::Repository(RepositoryError::Duplicate(_))
        ));
        assert_eq!(f.repository.len().await, 1);
    }
}
