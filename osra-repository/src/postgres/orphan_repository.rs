//! PostgreSQL implementation of the orphan record store.
//!
//! A record spans the `orphans` row and up to two `addresses` rows. Statuses are
//! stored as foreign keys into the lookup tables and written by name.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use osra_shared::{
    Address, FieldValue, Gender, Orphan, OrphanFilter, OrphanSponsorshipStatus, OrphanStatus,
    Priority, Sponsor, Sponsorship, Status,
};
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::interfaces::OrphanRepository;

const SELECT_ORPHANS: &str = r#"SELECT o.id, o.osra_num, o.sequential_id, o.name, o.father_name,
       o.father_is_martyr, o.father_date_of_death, o.mother_name, o.mother_alive,
       o.date_of_birth, o.gender, o.contact_number, o.sponsored_by_another_org,
       o.minor_siblings_count, o.priority, o.orphan_list_id, o.created_at, o.updated_at,
       s.name AS orphan_status, ss.name AS orphan_sponsorship_status,
       oa.id AS oa_id, oa.city AS oa_city, oa.province_code AS oa_province_code,
       oa.neighborhood AS oa_neighborhood, oa.street AS oa_street, oa.details AS oa_details,
       ca.id AS ca_id, ca.city AS ca_city, ca.province_code AS ca_province_code,
       ca.neighborhood AS ca_neighborhood, ca.street AS ca_street, ca.details AS ca_details
FROM orphans o
JOIN orphan_statuses s ON s.id = o.orphan_status_id
JOIN orphan_sponsorship_statuses ss ON ss.id = o.orphan_sponsorship_status_id
LEFT JOIN addresses oa ON oa.id = o.original_address_id
LEFT JOIN addresses ca ON ca.id = o.current_address_id"#;

const FROM_ORPHANS: &str = r#"FROM orphans o
JOIN orphan_statuses s ON s.id = o.orphan_status_id
JOIN orphan_sponsorship_statuses ss ON ss.id = o.orphan_sponsorship_status_id"#;

/// PostgreSQL-backed orphan store.
pub struct PostgresOrphanRepository {
    /// PostgreSQL connection pool
    pool: sqlx::PgPool,
}

impl PostgresOrphanRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Link `sponsor` to an orphan, registering the sponsor if it is new.
    pub async fn add_sponsorship(
        &self,
        sponsor: &Sponsor,
        sponsorship: &Sponsorship,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO sponsors (id, name) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name",
        )
        .bind(sponsor.id)
        .bind(&sponsor.name)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO sponsorships (id, orphan_id, sponsor_id, start_date, active) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(sponsorship.id)
        .bind(sponsorship.orphan_id)
        .bind(sponsorship.sponsor_id)
        .bind(sponsorship.start_date)
        .bind(sponsorship.active)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// The column values of a record that is complete enough to be written.
struct OrphanRow<'a> {
    name: &'a str,
    father_name: &'a str,
    father_is_martyr: bool,
    father_date_of_death: NaiveDate,
    mother_name: &'a str,
    mother_alive: bool,
    date_of_birth: NaiveDate,
    gender: Gender,
    contact_number: &'a str,
    sponsored_by_another_org: bool,
    minor_siblings_count: i32,
    orphan_status: OrphanStatus,
    orphan_sponsorship_status: OrphanSponsorshipStatus,
    priority: Priority,
    orphan_list_id: Uuid,
    updated_at: DateTime<Utc>,
}

impl<'a> OrphanRow<'a> {
    fn from_orphan(orphan: &'a Orphan) -> Result<Self, RepositoryError> {
        Ok(Self {
            name: required(orphan.name.as_deref(), "name")?,
            father_name: required(orphan.father_name.as_deref(), "father_name")?,
            father_is_martyr: required(orphan.father_is_martyr, "father_is_martyr")?,
            father_date_of_death: required(
                orphan.father_date_of_death(),
                "father_date_of_death",
            )?,
            mother_name: required(orphan.mother_name.as_deref(), "mother_name")?,
            mother_alive: required(orphan.mother_alive, "mother_alive")?,
            date_of_birth: required(orphan.date_of_birth(), "date_of_birth")?,
            gender: required(
                orphan.gender.as_ref().and_then(FieldValue::valid).copied(),
                "gender",
            )?,
            contact_number: required(orphan.contact_number.as_deref(), "contact_number")?,
            sponsored_by_another_org: required(
                orphan.sponsored_by_another_org,
                "sponsored_by_another_org",
            )?,
            minor_siblings_count: required(orphan.minor_siblings_count, "minor_siblings_count")?,
            orphan_status: required(orphan.orphan_status, "orphan_status")?,
            orphan_sponsorship_status: required(
                orphan.orphan_sponsorship_status,
                "orphan_sponsorship_status",
            )?,
            priority: required(orphan.priority(), "priority")?,
            orphan_list_id: required(orphan.orphan_list_id, "orphan_list_id")?,
            updated_at: required(orphan.updated_at, "updated_at")?,
        })
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, RepositoryError> {
    value.ok_or_else(|| RepositoryError::invalid_record(format!("{} is not set", field)))
}

/// Store a new address row. An id that is already stored belongs to another record.
async fn insert_address(
    tx: &mut Transaction<'_, Postgres>,
    address: &Address,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"INSERT INTO addresses (id, city, province_code, neighborhood, street, details)
           VALUES ($1, $2, $3, $4, $5, $6)"#,
    )
    .bind(address.id)
    .bind(&address.city)
    .bind(&address.province_code)
    .bind(&address.neighborhood)
    .bind(&address.street)
    .bind(&address.details)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_address_error(e, address))?;
    Ok(())
}

/// Overwrite an address row the record already owns.
async fn update_address(
    tx: &mut Transaction<'_, Postgres>,
    address: &Address,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"UPDATE addresses SET
               city = $2, province_code = $3, neighborhood = $4, street = $5, details = $6
           WHERE id = $1"#,
    )
    .bind(address.id)
    .bind(&address.city)
    .bind(&address.province_code)
    .bind(&address.neighborhood)
    .bind(&address.street)
    .bind(&address.details)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Both address slots must hold distinct rows.
fn check_distinct_addresses(orphan: &Orphan) -> Result<(), RepositoryError> {
    match (&orphan.original_address, &orphan.current_address) {
        (Some(original), Some(current)) if original.id == current.id => Err(
            RepositoryError::duplicate(format!("address {} used twice", original.id)),
        ),
        _ => Ok(()),
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &OrphanFilter) {
    if filter.active {
        builder
            .push(" AND s.name = ")
            .push_bind(OrphanStatus::Active.name());
    }
    if filter.unsponsored {
        builder
            .push(" AND ss.name = ")
            .push_bind(OrphanSponsorshipStatus::Unsponsored.name());
    }
    if filter.high_priority {
        builder
            .push(" AND o.priority = ")
            .push_bind(Priority::High.as_str());
    }
}

fn map_write_error(err: sqlx::Error, orphan: &Orphan) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::duplicate(format!(
                "orphan {} ({})",
                orphan.id,
                orphan.osra_num.as_deref().unwrap_or_default()
            ));
        }
    }
    RepositoryError::DatabaseError(err)
}

fn map_address_error(err: sqlx::Error, address: &Address) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::duplicate(format!("address {}", address.id));
        }
    }
    RepositoryError::DatabaseError(err)
}

fn decode_address(row: &PgRow, prefix: &str) -> Result<Option<Address>, RepositoryError> {
    let column = |name: &str| format!("{}_{}", prefix, name);

    let id: Option<Uuid> = row.try_get(column("id").as_str())?;
    let Some(id) = id else {
        return Ok(None);
    };

    Ok(Some(Address {
        id,
        city: row.try_get(column("city").as_str())?,
        province_code: row.try_get(column("province_code").as_str())?,
        neighborhood: row.try_get(column("neighborhood").as_str())?,
        street: row.try_get(column("street").as_str())?,
        details: row.try_get(column("details").as_str())?,
    }))
}

fn decode_orphan(row: &PgRow) -> Result<Orphan, RepositoryError> {
    let gender: String = row.try_get("gender")?;
    let gender = gender
        .parse::<Gender>()
        .map_err(|e| RepositoryError::decode(e.to_string()))?;
    let priority: String = row.try_get("priority")?;
    let priority = priority
        .parse::<Priority>()
        .map_err(|e| RepositoryError::decode(e.to_string()))?;

    let status: String = row.try_get("orphan_status")?;
    let orphan_status = OrphanStatus::from_name(&status)
        .ok_or_else(|| RepositoryError::decode(format!("unknown orphan status {:?}", status)))?;
    let status: String = row.try_get("orphan_sponsorship_status")?;
    let orphan_sponsorship_status = OrphanSponsorshipStatus::from_name(&status).ok_or_else(|| {
        RepositoryError::decode(format!("unknown sponsorship status {:?}", status))
    })?;

    let father_date_of_death: NaiveDate = row.try_get("father_date_of_death")?;
    let date_of_birth: NaiveDate = row.try_get("date_of_birth")?;

    Ok(Orphan {
        id: row.try_get("id")?,
        osra_num: Some(row.try_get("osra_num")?),
        sequential_id: Some(row.try_get("sequential_id")?),
        name: Some(row.try_get("name")?),
        father_name: Some(row.try_get("father_name")?),
        father_is_martyr: Some(row.try_get("father_is_martyr")?),
        father_date_of_death: Some(father_date_of_death.into()),
        mother_name: Some(row.try_get("mother_name")?),
        mother_alive: Some(row.try_get("mother_alive")?),
        date_of_birth: Some(date_of_birth.into()),
        gender: Some(gender.into()),
        contact_number: Some(row.try_get("contact_number")?),
        sponsored_by_another_org: Some(row.try_get("sponsored_by_another_org")?),
        minor_siblings_count: Some(row.try_get("minor_siblings_count")?),
        original_address: decode_address(row, "oa")?,
        current_address: decode_address(row, "ca")?,
        orphan_status: Some(orphan_status),
        orphan_sponsorship_status: Some(orphan_sponsorship_status),
        priority: Some(priority.into()),
        orphan_list_id: Some(row.try_get("orphan_list_id")?),
        created_at: Some(row.try_get("created_at")?),
        updated_at: Some(row.try_get("updated_at")?),
    })
}

#[async_trait]
impl OrphanRepository for PostgresOrphanRepository {
    #[instrument(skip_all, fields(orphan_id = %orphan.id))]
    async fn insert(&self, orphan: &Orphan) -> Result<(), RepositoryError> {
        let row = OrphanRow::from_orphan(orphan)?;
        let osra_num = required(orphan.osra_num.as_deref(), "osra_num")?;
        let sequential_id = required(orphan.sequential_id, "sequential_id")?;
        let created_at = required(orphan.created_at, "created_at")?;
        check_distinct_addresses(orphan)?;

        let mut tx = self.pool.begin().await?;

        for address in [&orphan.original_address, &orphan.current_address]
            .into_iter()
            .flatten()
        {
            insert_address(&mut tx, address).await?;
        }

        sqlx::query(
            r#"INSERT INTO orphans (
                   id, osra_num, sequential_id, name, father_name, father_is_martyr,
                   father_date_of_death, mother_name, mother_alive, date_of_birth, gender,
                   contact_number, sponsored_by_another_org, minor_siblings_count,
                   original_address_id, current_address_id,
                   orphan_status_id, orphan_sponsorship_status_id,
                   priority, orphan_list_id, created_at, updated_at)
               VALUES (
                   $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                   (SELECT id FROM orphan_statuses WHERE name = $17),
                   (SELECT id FROM orphan_sponsorship_statuses WHERE name = $18),
                   $19, $20, $21, $22)"#,
        )
        .bind(orphan.id)
        .bind(osra_num)
        .bind(sequential_id)
        .bind(row.name)
        .bind(row.father_name)
        .bind(row.father_is_martyr)
        .bind(row.father_date_of_death)
        .bind(row.mother_name)
        .bind(row.mother_alive)
        .bind(row.date_of_birth)
        .bind(row.gender.as_str())
        .bind(row.contact_number)
        .bind(row.sponsored_by_another_org)
        .bind(row.minor_siblings_count)
        .bind(orphan.original_address.as_ref().map(|address| address.id))
        .bind(orphan.current_address.as_ref().map(|address| address.id))
        .bind(row.orphan_status.name())
        .bind(row.orphan_sponsorship_status.name())
        .bind(row.priority.as_str())
        .bind(row.orphan_list_id)
        .bind(created_at)
        .bind(row.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, orphan))?;

        tx.commit().await?;
        debug!(osra_num = %osra_num, "Orphan inserted");
        Ok(())
    }

    #[instrument(skip_all, fields(orphan_id = %orphan.id))]
    async fn update(
        &self,
        orphan: &Orphan,
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let row = OrphanRow::from_orphan(orphan)?;
        check_distinct_addresses(orphan)?;

        let mut tx = self.pool.begin().await?;

        let stored = sqlx::query(
            r#"SELECT original_address_id, current_address_id, updated_at
               FROM orphans WHERE id = $1 FOR UPDATE"#,
        )
        .bind(orphan.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound(orphan.id))?;

        let stored_updated_at: DateTime<Utc> = stored.try_get("updated_at")?;
        if expected_updated_at != Some(stored_updated_at) {
            debug!(%stored_updated_at, "Stale write rejected");
            return Err(RepositoryError::Conflict(orphan.id));
        }

        let previous_addresses: [Option<Uuid>; 2] = [
            stored.try_get("original_address_id")?,
            stored.try_get("current_address_id")?,
        ];

        for address in [&orphan.original_address, &orphan.current_address]
            .into_iter()
            .flatten()
        {
            if previous_addresses.contains(&Some(address.id)) {
                update_address(&mut tx, address).await?;
            } else {
                insert_address(&mut tx, address).await?;
            }
        }

        let original_address_id = orphan.original_address.as_ref().map(|address| address.id);
        let current_address_id = orphan.current_address.as_ref().map(|address| address.id);

        sqlx::query(
            r#"UPDATE orphans SET
                   name = $2, father_name = $3, father_is_martyr = $4,
                   father_date_of_death = $5, mother_name = $6, mother_alive = $7,
                   date_of_birth = $8, gender = $9, contact_number = $10,
                   sponsored_by_another_org = $11, minor_siblings_count = $12,
                   original_address_id = $13, current_address_id = $14,
                   orphan_status_id = (SELECT id FROM orphan_statuses WHERE name = $15),
                   orphan_sponsorship_status_id =
                       (SELECT id FROM orphan_sponsorship_statuses WHERE name = $16),
                   priority = $17, orphan_list_id = $18, updated_at = $19
               WHERE id = $1"#,
        )
        .bind(orphan.id)
        .bind(row.name)
        .bind(row.father_name)
        .bind(row.father_is_martyr)
        .bind(row.father_date_of_death)
        .bind(row.mother_name)
        .bind(row.mother_alive)
        .bind(row.date_of_birth)
        .bind(row.gender.as_str())
        .bind(row.contact_number)
        .bind(row.sponsored_by_another_org)
        .bind(row.minor_siblings_count)
        .bind(original_address_id)
        .bind(current_address_id)
        .bind(row.orphan_status.name())
        .bind(row.orphan_sponsorship_status.name())
        .bind(row.priority.as_str())
        .bind(row.orphan_list_id)
        .bind(row.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, orphan))?;

        for previous in previous_addresses.into_iter().flatten() {
            if Some(previous) != original_address_id && Some(previous) != current_address_id {
                sqlx::query("DELETE FROM addresses WHERE id = $1")
                    .bind(previous)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Orphan>, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_ORPHANS);
        builder.push(" WHERE o.id = ").push_bind(id);

        let row = builder.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(decode_orphan).transpose()
    }

    async fn list(&self, filter: &OrphanFilter) -> Result<Vec<Orphan>, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_ORPHANS);
        builder.push(" WHERE TRUE");
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY o.sequential_id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(decode_orphan).collect()
    }

    async fn count(&self, filter: &OrphanFilter) -> Result<u64, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) ");
        builder.push(FROM_ORPHANS);
        builder.push(" WHERE TRUE");
        push_filter(&mut builder, filter);

        let row = builder.build().fetch_one(&self.pool).await?;
        let count: i64 = row.try_get(0)?;
        u64::try_from(count).map_err(|e| RepositoryError::decode(e.to_string()))
    }

    async fn contains(&self, id: Uuid, filter: &OrphanFilter) -> Result<bool, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT EXISTS (SELECT 1 ");
        builder.push(FROM_ORPHANS);
        builder.push(" WHERE o.id = ").push_bind(id);
        push_filter(&mut builder, filter);
        builder.push(")");

        let row = builder.build().fetch_one(&self.pool).await?;
        Ok(row.try_get::<bool, _>(0)?)
    }

    async fn sponsors(&self, orphan_id: Uuid) -> Result<Vec<Sponsor>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT sp.id, sp.name
               FROM sponsorships s
               JOIN sponsors sp ON sp.id = s.sponsor_id
               WHERE s.orphan_id = $1
               ORDER BY s.start_date, sp.name"#,
        )
        .bind(orphan_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<Sponsor, RepositoryError> {
                Ok(Sponsor {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }
}
