//! Settings read from the environment.

use std::env;
use std::time::Duration;

use osra_repository::config::DEFAULT_SEQUENCE_SCOPE;
use osra_repository::OrphanServiceConfig;
use osra_shared::DEFAULT_OSRA_NUM_WIDTH;
use tracing::warn;

use crate::OsraError;

/// Default size of the database connection pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for PostgreSQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if not set or invalid.
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid DATABASE_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    pub service: OrphanServiceConfig,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: PostgreSQL connection string (required)
    /// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
    /// - `DATABASE_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `DATABASE_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `OSRA_SEQUENCE_SCOPE`: Sequence used for OSRA numbers (default: orphans)
    /// - `OSRA_NUM_WIDTH`: Digits of the sequence part of an OSRA number (default: 5)
    pub fn from_env() -> Result<Self, OsraError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OsraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| OsraError::config("DATABASE_URL is not set"))?;

        let max_connections =
            parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(OsraError::config(
                "DATABASE_MAX_CONNECTIONS must be at least 1",
            ));
        }

        let connection_mode = ConnectionMode::parse(lookup("DATABASE_CONNECTION_MODE"));
        let retry_interval = parse_or(
            &lookup,
            "DATABASE_RETRY_INTERVAL_SECS",
            DEFAULT_RETRY_INTERVAL_SECS,
        )?;

        let sequence_scope = lookup("OSRA_SEQUENCE_SCOPE")
            .filter(|scope| !scope.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SEQUENCE_SCOPE.to_string());
        let osra_num_width = parse_or(&lookup, "OSRA_NUM_WIDTH", DEFAULT_OSRA_NUM_WIDTH)?;

        Ok(Self {
            database_url,
            max_connections,
            connection_mode,
            retry_interval: Duration::from_secs(retry_interval),
            service: OrphanServiceConfig::default()
                .with_sequence_scope(sequence_scope)
                .with_osra_num_width(osra_num_width),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, OsraError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| OsraError::config(format!("{} must be a number, got {:?}", key, value))),
    }
}
