//! PostgreSQL implementation of the status lookup.

use async_trait::async_trait;
use osra_shared::{StatusCategory, StatusRef};
use sqlx::Row;
use tracing::debug;

use crate::errors::RepositoryError;
use crate::interfaces::StatusLookup;

/// PostgreSQL-backed status lookup over `orphan_statuses` and
/// `orphan_sponsorship_statuses`.
pub struct PostgresStatusLookup {
    pool: sqlx::PgPool,
}

impl PostgresStatusLookup {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Insert every known status that is not in its table yet.
    ///
    /// Safe to run on every start.
    pub async fn seed_defaults(&self) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for category in [StatusCategory::Orphan, StatusCategory::Sponsorship] {
            for name in category.names() {
                sqlx::query(insert_sql(category))
                    .bind(name)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;
        debug!("Status lookup tables seeded");
        Ok(())
    }
}

fn select_sql(category: StatusCategory) -> &'static str {
    match category {
        StatusCategory::Orphan => "SELECT id, name FROM orphan_statuses WHERE name = $1",
        StatusCategory::Sponsorship => {
            "SELECT id, name FROM orphan_sponsorship_statuses WHERE name = $1"
        }
    }
}

fn insert_sql(category: StatusCategory) -> &'static str {
    match category {
        StatusCategory::Orphan => {
            "INSERT INTO orphan_statuses (name) VALUES ($1) ON CONFLICT (name) DO NOTHING"
        }
        StatusCategory::Sponsorship => {
            "INSERT INTO orphan_sponsorship_statuses (name) VALUES ($1) ON CONFLICT (name) DO NOTHING"
        }
    }
}

#[async_trait]
impl StatusLookup for PostgresStatusLookup {
    async fn find_by_name(
        &self,
        category: StatusCategory,
        name: &str,
    ) -> Result<Option<StatusRef>, RepositoryError> {
        let row = sqlx::query(select_sql(category))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<StatusRef, RepositoryError> {
            Ok(StatusRef {
                id: row.try_get("id")?,
                category,
                name: row.try_get("name")?,
            })
        })
        .transpose()
    }
}
