//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// Every variant is a synchronous, local failure. None of them is retried
/// internally, and an operation that fails leaves the encounter unchanged.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Adding a participant would produce a display name that is already
    /// used in the encounter.
    #[error("duplicate participant name: {0}")]
    DuplicateName(String),

    /// An initiative value was rejected (non-finite, out of range, or a
    /// fractional value for a player).
    #[error("invalid initiative: {0}")]
    InvalidInitiative(String),

    /// A condition was applied without a resolvable duration.
    #[error("invalid condition duration: {0}")]
    InvalidConditionDuration(String),

    /// A turn operation was invoked while no participant holds or is about to
    /// take the turn.
    #[error("no active actor")]
    NoActiveActor,

    /// A turn or round operation was invoked while at least one participant
    /// still lacks initiative.
    #[error("combat has not started: every participant needs initiative")]
    CombatNotStarted,

    /// A saved encounter references a library actor that no longer exists.
    #[error("missing library actor: {0}")]
    MissingActor(Uuid),

    /// The referenced participant is not part of the encounter.
    #[error("participant not found: {0}")]
    ParticipantNotFound(Uuid),

    /// The referenced library actor is not registered.
    #[error("actor not found: {0}")]
    ActorNotFound(Uuid),

    /// No saved encounter exists under the given name.
    #[error("saved encounter not found: {0}")]
    EncounterNotFound(String),

    /// A save was requested under a name that is already taken.
    #[error("save name already taken: {0}")]
    SaveNameTaken(String),

    /// A persisted record is structurally inconsistent.
    #[error("invalid encounter record: {0}")]
    InvalidRecord(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
