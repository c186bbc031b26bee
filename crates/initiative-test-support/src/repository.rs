//! In-memory and failing repository implementations for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use initiative_core::error::DomainError;
use initiative_core::library::{ActorCatalog, LibraryActor};
use initiative_core::repository::{
    ActorRepository, EncounterRepository, SavedEncounterSummary, StoredEncounter,
};
use uuid::Uuid;

/// Save repository backed by a map. Like the real store, it refuses to
/// overwrite an existing name.
#[derive(Debug, Default)]
pub struct InMemoryEncounterRepository {
    saves: Mutex<BTreeMap<String, StoredEncounter>>,
}

impl InMemoryEncounterRepository {
    /// Returns a snapshot of everything saved so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn saved(&self) -> Vec<StoredEncounter> {
        self.saves.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl EncounterRepository for InMemoryEncounterRepository {
    async fn exists(&self, name: &str) -> Result<bool, DomainError> {
        Ok(self.saves.lock().unwrap().contains_key(name))
    }

    async fn load(&self, name: &str) -> Result<Option<StoredEncounter>, DomainError> {
        Ok(self.saves.lock().unwrap().get(name).cloned())
    }

    async fn insert(&self, encounter: &StoredEncounter) -> Result<(), DomainError> {
        let mut saves = self.saves.lock().unwrap();
        if saves.contains_key(&encounter.name) {
            return Err(DomainError::SaveNameTaken(encounter.name.clone()));
        }
        saves.insert(encounter.name.clone(), encounter.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SavedEncounterSummary>, DomainError> {
        let mut summaries: Vec<SavedEncounterSummary> = self
            .saves
            .lock()
            .unwrap()
            .values()
            .map(|s| SavedEncounterSummary {
                name: s.name.clone(),
                encounter_id: s.encounter_id,
                saved_at: s.saved_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then(a.name.cmp(&b.name)));
        Ok(summaries)
    }
}

/// Actor library backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryActorRepository {
    actors: Mutex<BTreeMap<Uuid, LibraryActor>>,
}

impl InMemoryActorRepository {
    /// Creates a library holding `actors`.
    #[must_use]
    pub fn with_actors(actors: Vec<LibraryActor>) -> Self {
        Self {
            actors: Mutex::new(actors.into_iter().map(|a| (a.id, a)).collect()),
        }
    }
}

#[async_trait]
impl ActorRepository for InMemoryActorRepository {
    async fn load_catalog(&self) -> Result<ActorCatalog, DomainError> {
        Ok(self.actors.lock().unwrap().values().cloned().collect())
    }

    async fn find(&self, actor_id: Uuid) -> Result<Option<LibraryActor>, DomainError> {
        Ok(self.actors.lock().unwrap().get(&actor_id).cloned())
    }

    async fn upsert(&self, actor: &LibraryActor) -> Result<(), DomainError> {
        self.actors.lock().unwrap().insert(actor.id, actor.clone());
        Ok(())
    }
}

/// A save repository that always returns an infrastructure error.
#[derive(Debug)]
pub struct FailingEncounterRepository;

#[async_trait]
impl EncounterRepository for FailingEncounterRepository {
    async fn exists(&self, _name: &str) -> Result<bool, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load(&self, _name: &str) -> Result<Option<StoredEncounter>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn insert(&self, _encounter: &StoredEncounter) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn list(&self) -> Result<Vec<SavedEncounterSummary>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// An actor repository that always returns an infrastructure error.
#[derive(Debug)]
pub struct FailingActorRepository;

#[async_trait]
impl ActorRepository for FailingActorRepository {
    async fn load_catalog(&self) -> Result<ActorCatalog, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn find(&self, _actor_id: Uuid) -> Result<Option<LibraryActor>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn upsert(&self, _actor: &LibraryActor) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
