use async_trait::async_trait;
use osra_shared::{OrphanList, Partner};
use sqlx::Row;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::interfaces::OrphanListLookup;

/// PostgreSQL-backed orphan list lookup. The partner is joined in.
pub struct PostgresOrphanListLookup {
    pool: sqlx::PgPool,
}

impl PostgresOrphanListLookup {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Store an orphan list and its partner, overwriting existing rows.
    pub async fn insert(&self, list: &OrphanList) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(partner) = &list.partner {
            sqlx::query(
                "INSERT INTO partners (id, name, province_code) VALUES ($1, $2, $3) \
                 ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, province_code = EXCLUDED.province_code",
            )
            .bind(partner.id)
            .bind(&partner.name)
            .bind(&partner.province_code)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO orphan_lists (id, osra_num, partner_id) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET osra_num = EXCLUDED.osra_num, partner_id = EXCLUDED.partner_id",
        )
        .bind(list.id)
        .bind(&list.osra_num)
        .bind(list.partner.as_ref().map(|partner| partner.id))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl OrphanListLookup for PostgresOrphanListLookup {
    async fn find_orphan_list(&self, id: Uuid) -> Result<Option<OrphanList>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT l.id, l.osra_num,
                      p.id AS partner_id, p.name AS partner_name, p.province_code
               FROM orphan_lists l
               LEFT JOIN partners p ON p.id = l.partner_id
               WHERE l.id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let partner_id: Option<Uuid> = row.try_get("partner_id")?;
        let partner = match partner_id {
            Some(partner_id) => Some(Partner {
                id: partner_id,
                name: row.try_get("partner_name")?,
                province_code: row.try_get("province_code")?,
            }),
            None => None,
        };

        Ok(Some(OrphanList {
            id: row.try_get("id")?,
            osra_num: row.try_get("osra_num")?,
            partner,
        }))
    }
}
