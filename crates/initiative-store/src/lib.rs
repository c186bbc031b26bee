//! SQLite storage for the initiative tracker.
//!
//! Saves are opaque rows: one JSON payload per saved encounter, keyed by its
//! unique name. The actor library is one row per actor.

pub mod schema;
pub mod sqlite_actor_repository;
pub mod sqlite_encounter_repository;

pub use schema::migrate;
pub use sqlite_actor_repository::SqliteActorRepository;
pub use sqlite_encounter_repository::SqliteEncounterRepository;
