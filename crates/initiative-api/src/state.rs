//! Shared application state.

use std::sync::{Arc, Mutex, MutexGuard};

use initiative_combat::domain::aggregates::Encounter;
use initiative_core::clock::Clock;
use initiative_core::error::DomainError;
use initiative_core::repository::{ActorRepository, EncounterRepository};
use initiative_core::rng::DeterministicRng;
use uuid::Uuid;

/// Title of the encounter the server starts with.
pub const DEFAULT_TITLE: &str = "Encounter";

/// Application state shared across all request handlers.
///
/// The live encounter sits behind one mutex, so every engine operation runs
/// to completion before the next one starts. The lock is never held across
/// an await point.
#[derive(Clone)]
pub struct AppState {
    /// The single live encounter.
    pub encounter: Arc<Mutex<Encounter>>,
    /// Clock for event metadata and save names.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// RNG for initiative rolls.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// Saved encounters.
    pub encounter_repository: Arc<dyn EncounterRepository>,
    /// The actor library.
    pub actor_repository: Arc<dyn ActorRepository>,
}

impl AppState {
    /// Create new application state holding an empty encounter.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock + Send + Sync>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        encounter_repository: Arc<dyn EncounterRepository>,
        actor_repository: Arc<dyn ActorRepository>,
    ) -> Self {
        Self {
            encounter: Arc::new(Mutex::new(Encounter::new(Uuid::new_v4(), DEFAULT_TITLE))),
            clock,
            rng,
            encounter_repository,
            actor_repository,
        }
    }

    /// Locks the live encounter.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the mutex is poisoned.
    pub fn lock_encounter(&self) -> Result<MutexGuard<'_, Encounter>, DomainError> {
        self.encounter
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("encounter mutex poisoned: {e}")))
    }

    /// Swaps in a new live encounter.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the mutex is poisoned.
    pub fn replace_encounter(&self, encounter: Encounter) -> Result<(), DomainError> {
        *self.lock_encounter()? = encounter;
        Ok(())
    }
}
