//! PostgreSQL implementation of the sequence generator.
//!
//! Stores one counter row per scope in the `sequences` table.

use async_trait::async_trait;
use sqlx::Row;

use crate::errors::SequenceError;
use crate::interfaces::SequenceGenerator;

/// PostgreSQL-backed sequence generator.
///
/// Each draw is a single upsert that increments and returns the counter. The row
/// lock taken by the upsert serialises concurrent draws on the same scope, across
/// connections and processes.
pub struct PostgresSequenceGenerator {
    /// PostgreSQL connection pool
    pool: sqlx::PgPool,
}

impl PostgresSequenceGenerator {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SequenceGenerator for PostgresSequenceGenerator {
    async fn next(&self, scope: &str) -> Result<i64, SequenceError> {
        let row = sqlx::query(
            "INSERT INTO sequences (scope, value) VALUES ($1, 1) \
             ON CONFLICT (scope) DO UPDATE SET value = sequences.value + 1 \
             RETURNING value",
        )
        .bind(scope)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get::<i64, _>("value")?)
    }
}
