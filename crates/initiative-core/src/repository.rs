//! Repository abstractions for saved encounters and the actor library.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::library::{ActorCatalog, LibraryActor};

/// Stored representation of a saved encounter.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEncounter {
    /// Unique save name.
    pub name: String,
    /// Identifier of the encounter that was saved.
    pub encounter_id: Uuid,
    /// Serialized encounter record.
    pub payload: serde_json::Value,
    /// Timestamp of the save.
    pub saved_at: DateTime<Utc>,
}

/// Summary row used when listing saves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedEncounterSummary {
    /// Unique save name.
    pub name: String,
    /// Identifier of the encounter that was saved.
    pub encounter_id: Uuid,
    /// Timestamp of the save.
    pub saved_at: DateTime<Utc>,
}

/// Repository for point-in-time encounter saves.
#[async_trait]
pub trait EncounterRepository: Send + Sync {
    /// Returns `true` if a save with this name exists.
    async fn exists(&self, name: &str) -> Result<bool, DomainError>;

    /// Loads the save with the given name, if any.
    async fn load(&self, name: &str) -> Result<Option<StoredEncounter>, DomainError>;

    /// Inserts a new save. Never overwrites: an existing name yields
    /// `DomainError::SaveNameTaken`.
    async fn insert(&self, encounter: &StoredEncounter) -> Result<(), DomainError>;

    /// Lists all saves, newest first.
    async fn list(&self) -> Result<Vec<SavedEncounterSummary>, DomainError>;
}

/// Repository for the actor library.
#[async_trait]
pub trait ActorRepository: Send + Sync {
    /// Loads the whole library into an in-memory catalog.
    async fn load_catalog(&self) -> Result<ActorCatalog, DomainError>;

    /// Loads one actor.
    async fn find(&self, actor_id: Uuid) -> Result<Option<LibraryActor>, DomainError>;

    /// Inserts or replaces an actor.
    async fn upsert(&self, actor: &LibraryActor) -> Result<(), DomainError>;
}
