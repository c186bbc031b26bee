//! Fixture builders.

use initiative_core::library::{ActorCategory, LibraryActor};
use uuid::Uuid;

/// A library actor with a fresh id.
#[must_use]
pub fn library_actor(
    name: &str,
    category: ActorCategory,
    initiative_modifier: i32,
) -> LibraryActor {
    LibraryActor {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        category,
        initiative_modifier,
    }
}
