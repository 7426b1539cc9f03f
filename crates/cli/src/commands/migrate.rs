//! Catalog database migrations.
//!
//! # Usage
//!
//! ```bash
//! STORE_BACKEND=postgres DATABASE_URL=postgres://... gante migrate
//! ```
//!
//! Migration files live in `crates/catalog/migrations/` and are embedded in
//! the binary. Servers never migrate on startup.

use thiserror::Error;

use gante_catalog::{StoreBackend, StoreConfigError};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Config(#[from] StoreConfigError),

    #[error("migrations only apply to the postgres backend (STORE_BACKEND is {0})")]
    NotPostgres(StoreBackend),

    #[error("this build has no postgres support; rebuild with --features postgres")]
    NotCompiled,

    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "postgres")]
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run pending catalog migrations against `DATABASE_URL`.
///
/// # Errors
///
/// Returns `MigrationError` if the backend is not postgres, the database is
/// unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let config = super::store_config()?;
    if config.backend != StoreBackend::Postgres {
        return Err(MigrationError::NotPostgres(config.backend));
    }
    apply(&config).await
}

#[cfg(feature = "postgres")]
async fn apply(config: &gante_catalog::StoreConfig) -> Result<(), MigrationError> {
    use gante_catalog::postgres::{MIGRATOR, create_pool};
    use tracing::info;

    let database_url = config
        .database_url
        .as_ref()
        .ok_or_else(|| StoreConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

    info!("Connecting to catalog database...");
    let pool = create_pool(database_url).await?;

    info!("Running catalog migrations...");
    MIGRATOR.run(&pool).await?;

    info!("Catalog migrations complete");
    Ok(())
}

#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
async fn apply(_config: &gante_catalog::StoreConfig) -> Result<(), MigrationError> {
    Err(MigrationError::NotCompiled)
}
