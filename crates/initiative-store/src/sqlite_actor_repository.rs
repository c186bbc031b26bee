//! SQLite implementation of the `ActorRepository` trait.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

use initiative_core::error::DomainError;
use initiative_core::library::{ActorCatalog, ActorCategory, LibraryActor};
use initiative_core::repository::ActorRepository;

/// SQLite-backed actor library.
#[derive(Debug, Clone)]
pub struct SqliteActorRepository {
    pool: SqlitePool,
}

impl SqliteActorRepository {
    /// Creates a new `SqliteActorRepository`.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn infrastructure(operation: &str, error: &sqlx::Error) -> DomainError {
    warn!(operation, error = %error, "actor repository query failed");
    DomainError::Infrastructure(format!("{operation} failed: {error}"))
}

fn actor_from_row(row: &SqliteRow) -> Result<LibraryActor, DomainError> {
    let id: String = row.try_get("id").map_err(|e| infrastructure("read id", &e))?;
    let category: String = row
        .try_get("category")
        .map_err(|e| infrastructure("read category", &e))?;
    let initiative_modifier: i64 = row
        .try_get("initiative_modifier")
        .map_err(|e| infrastructure("read initiative_modifier", &e))?;

    Ok(LibraryActor {
        id: Uuid::parse_str(&id)
            .map_err(|e| DomainError::InvalidRecord(format!("bad actor id {id:?}: {e}")))?,
        name: row
            .try_get("name")
            .map_err(|e| infrastructure("read name", &e))?,
        category: ActorCategory::parse(&category).ok_or_else(|| {
            DomainError::InvalidRecord(format!("unknown actor category {category:?}"))
        })?,
        initiative_modifier: i32::try_from(initiative_modifier).map_err(|_| {
            DomainError::InvalidRecord(format!("modifier {initiative_modifier} out of range"))
        })?,
    })
}

#[async_trait]
impl ActorRepository for SqliteActorRepository {
    async fn load_catalog(&self) -> Result<ActorCatalog, DomainError> {
        let rows = sqlx::query("SELECT id, name, category, initiative_modifier FROM actors")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| infrastructure("load_catalog", &e))?;

        rows.iter().map(actor_from_row).collect()
    }

    async fn find(&self, actor_id: Uuid) -> Result<Option<LibraryActor>, DomainError> {
        let row = sqlx::query(
            "SELECT id, name, category, initiative_modifier FROM actors WHERE id = ?",
        )
        .bind(actor_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| infrastructure("find", &e))?;

        row.as_ref().map(actor_from_row).transpose()
    }

    async fn upsert(&self, actor: &LibraryActor) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO actors (id, name, category, initiative_modifier) VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
                 name = excluded.name, \
                 category = excluded.category, \
                 initiative_modifier = excluded.initiative_modifier",
        )
        .bind(actor.id.to_string())
        .bind(&actor.name)
        .bind(actor.category.as_str())
        .bind(actor.initiative_modifier)
        .execute(&self.pool)
        .await
        .map_err(|e| infrastructure("upsert", &e))?;
        Ok(())
    }
}
