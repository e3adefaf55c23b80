//! PostgreSQL implementations of the collaborator traits.
//!
//! All implementations share one connection pool. The schema lives in
//! `src/postgres/migrations` and is applied with [`run_migrations`].

mod orphan_list_lookup;
mod orphan_repository;
mod sequence_generator;
mod status_lookup;

pub use orphan_list_lookup::PostgresOrphanListLookup;
pub use orphan_repository::PostgresOrphanRepository;
pub use sequence_generator::PostgresSequenceGenerator;
pub use status_lookup::PostgresStatusLookup;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::errors::RepositoryError;

/// Open a connection pool.
///
/// # Arguments
///
/// * `database_url` - PostgreSQL connection string
/// * `max_connections` - Upper bound on pooled connections
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, RepositoryError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!("src/postgres/migrations").run(pool).await?;
    Ok(())
}
