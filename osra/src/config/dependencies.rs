//! Dependency initialization and wiring for the registry.

use std::sync::Arc;
use std::time::Duration;

use osra_repository::postgres::{connect, run_migrations};
use osra_repository::{
    OrphanService, PostgresOrphanListLookup, PostgresOrphanRepository,
    PostgresSequenceGenerator, PostgresStatusLookup,
};
use sqlx::PgPool;
use tokio::time::sleep;
use tracing::{info, warn};

use super::{ConnectionMode, Settings};
use crate::OsraError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub pool: PgPool,
    /// The orphan service wired to PostgreSQL.
    pub service: OrphanService,
}

impl Dependencies {
    /// Connect to PostgreSQL, apply migrations, seed the status tables and build
    /// the orphan service.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(OsraError)` - If initialization fails (connecting only fails in fail-fast mode)
    pub async fn new(settings: &Settings) -> Result<Self, OsraError> {
        info!(
            max_connections = settings.max_connections,
            connection_mode = ?settings.connection_mode,
            retry_interval_secs = settings.retry_interval.as_secs(),
            sequence_scope = %settings.service.sequence_scope,
            "Initializing dependencies"
        );

        let pool = Self::connect_to_postgres(
            &settings.database_url,
            settings.max_connections,
            settings.connection_mode,
            settings.retry_interval,
        )
        .await?;

        info!("PostgreSQL connection established");

        run_migrations(&pool)
            .await
            .map_err(|e| OsraError::config(format!("Failed to run migrations: {}", e)))?;

        let statuses = PostgresStatusLookup::new(pool.clone());
        statuses.seed_defaults().await?;

        info!("Schema ready");

        let service = OrphanService::with_config(
            Arc::new(PostgresOrphanRepository::new(pool.clone())),
            Arc::new(statuses),
            Arc::new(PostgresOrphanListLookup::new(pool.clone())),
            Arc::new(PostgresSequenceGenerator::new(pool.clone())),
            settings.service.clone(),
        );

        Ok(Self { pool, service })
    }

    /// Connect to PostgreSQL with retry logic based on connection mode.
    async fn connect_to_postgres(
        url: &str,
        max_connections: u32,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<PgPool, OsraError> {
        loop {
            match connect(url, max_connections).await {
                Ok(pool) => return Ok(pool),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(OsraError::config(format!(
                            "Failed to connect to PostgreSQL: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to PostgreSQL, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}
