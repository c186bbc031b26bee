//! Database schema.

use initiative_core::error::DomainError;
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;

/// Embedded migrations from `migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Brings the database schema up to date.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if a migration fails.
pub async fn migrate(pool: &SqlitePool) -> Result<(), DomainError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| DomainError::Infrastructure(format!("migration failed: {e}")))
}
