//! Shared test mocks and fixtures for the initiative tracker.

mod clock;
mod fixtures;
mod repository;
mod rng;

pub use clock::FixedClock;
pub use fixtures::library_actor;
pub use repository::{
    FailingActorRepository, FailingEncounterRepository, InMemoryActorRepository,
    InMemoryEncounterRepository,
};
pub use rng::{MockRng, SequenceRng};
