//! Embedded schema migrations applied at startup.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Failure while applying migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("failed to connect for migrations: {0}")]
    Connect(#[from] diesel::ConnectionError),
    #[error("failed to apply migrations: {message}")]
    Apply { message: String },
    #[error("migration task panicked: {message}")]
    Task { message: String },
}

fn apply_pending(database_url: &str) -> Result<usize, MigrationError> {
    let mut connection = PgConnection::establish(database_url)?;
    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Apply {
            message: err.to_string(),
        })?;
    Ok(applied.len())
}

/// Apply every pending migration on a blocking thread.
///
/// # Errors
///
/// Returns [`MigrationError`] when the database is unreachable or a migration
/// fails.
pub async fn run_migrations(database_url: &str) -> Result<(), MigrationError> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || apply_pending(&url))
        .await
        .map_err(|err| MigrationError::Task {
            message: err.to_string(),
        })??;
    info!(applied, "database migrations complete");
    Ok(())
}
