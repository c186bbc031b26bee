//! SQLite implementation of the `EncounterRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use initiative_core::error::DomainError;
use initiative_core::repository::{EncounterRepository, SavedEncounterSummary, StoredEncounter};

/// SQLite-backed save repository.
#[derive(Debug, Clone)]
pub struct SqliteEncounterRepository {
    pool: SqlitePool,
}

impl SqliteEncounterRepository {
    /// Creates a new `SqliteEncounterRepository`.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn infrastructure(operation: &str, error: &sqlx::Error) -> DomainError {
    warn!(operation, error = %error, "save repository query failed");
    DomainError::Infrastructure(format!("{operation} failed: {error}"))
}

fn parse_uuid(value: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(value)
        .map_err(|e| DomainError::InvalidRecord(format!("bad encounter id {value:?}: {e}")))
}

fn summary_from_row(row: &SqliteRow) -> Result<SavedEncounterSummary, DomainError> {
    let encounter_id: String = row
        .try_get("encounter_id")
        .map_err(|e| infrastructure("read encounter_id", &e))?;
    Ok(SavedEncounterSummary {
        name: row
            .try_get("name")
            .map_err(|e| infrastructure("read name", &e))?,
        encounter_id: parse_uuid(&encounter_id)?,
        saved_at: row
            .try_get::<DateTime<Utc>, _>("saved_at")
            .map_err(|e| infrastructure("read saved_at", &e))?,
    })
}

#[async_trait]
impl EncounterRepository for SqliteEncounterRepository {
    async fn exists(&self, name: &str) -> Result<bool, DomainError> {
        let row = sqlx::query("SELECT 1 FROM saved_encounters WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| infrastructure("exists", &e))?;
        Ok(row.is_some())
    }

    async fn load(&self, name: &str) -> Result<Option<StoredEncounter>, DomainError> {
        let Some(row) = sqlx::query(
            "SELECT name, encounter_id, payload, saved_at FROM saved_encounters WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| infrastructure("load", &e))?
        else {
            return Ok(None);
        };

        let summary = summary_from_row(&row)?;
        let payload: String = row
            .try_get("payload")
            .map_err(|e| infrastructure("read payload", &e))?;
        let payload = serde_json::from_str(&payload)
            .map_err(|e| DomainError::InvalidRecord(format!("save {name:?} is not JSON: {e}")))?;

        Ok(Some(StoredEncounter {
            name: summary.name,
            encounter_id: summary.encounter_id,
            payload,
            saved_at: summary.saved_at,
        }))
    }

    async fn insert(&self, encounter: &StoredEncounter) -> Result<(), DomainError> {
        let result = sqlx::query(
            "INSERT INTO saved_encounters (name, encounter_id, payload, saved_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&encounter.name)
        .bind(encounter.encounter_id.to_string())
        .bind(encounter.payload.to_string())
        .bind(encounter.saved_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(name = %encounter.name, "encounter save written");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DomainError::SaveNameTaken(encounter.name.clone()))
            }
            Err(e) => Err(infrastructure("insert", &e)),
        }
    }

    async fn list(&self) -> Result<Vec<SavedEncounterSummary>, DomainError> {
        let rows = sqlx::query(
            "SELECT name, encounter_id, saved_at FROM saved_encounters \
             ORDER BY saved_at DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure("list", &e))?;

        rows.iter().map(summary_from_row).collect()
    }
}
