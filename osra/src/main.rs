//! OSRA Main Entry Point
//!
//! Connects to the registry database, prepares the schema and logs a summary of
//! the orphan collection.

use dotenv::dotenv;
use osra::{Dependencies, OsraError, RegistryReport, Settings};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("osra=info,osra_repository=info"));

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "osra",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), OsraError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    info!("Starting OSRA registry");

    let settings = Settings::from_env()?;

    let deps = match Dependencies::new(&settings).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match RegistryReport::collect(&deps.service).await {
        Ok(report) => {
            let summary = serde_json::to_string(&report)?;
            info!(
                total = report.total,
                active = report.active,
                unsponsored = report.unsponsored,
                high_priority = report.high_priority,
                eligible = report.eligible,
                report = %summary,
                "Registry report"
            );
        }
        Err(e) => {
            error!(error = %e, "Failed to build registry report");
            return Err(e);
        }
    }

    deps.pool.close().await;
    Ok(())
}
