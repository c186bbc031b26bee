//! Actor library types.
//!
//! The library holds the reusable actor definitions that encounter
//! participants are instantiated from. The engine only ever reads it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a library actor.
///
/// Declaration order is the tie-break precedence used when two participants
/// share an initiative value and were never reordered by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorCategory {
    /// A player character.
    Player,
    /// A named non-player character.
    Npc,
    /// A monster.
    Monster,
    /// Anything else (summons, hazards, lair actions).
    Other,
}

impl ActorCategory {
    /// Returns `true` for the player category.
    #[must_use]
    pub fn is_player(self) -> bool {
        matches!(self, Self::Player)
    }

    /// Stable lowercase name, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Npc => "npc",
            Self::Monster => "monster",
            Self::Other => "other",
        }
    }

    /// Parses the serialized form back into a category.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "player" => Some(Self::Player),
            "npc" => Some(Self::Npc),
            "monster" => Some(Self::Monster),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// A reusable actor definition from the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryActor {
    /// Library identifier.
    pub id: Uuid,
    /// Base display name.
    pub name: String,
    /// Actor category.
    pub category: ActorCategory,
    /// Default initiative modifier.
    pub initiative_modifier: i32,
}

/// Read-only lookup over the actor library.
pub trait ActorLibrary {
    /// Returns the actor with the given id, if it exists.
    fn find_actor(&self, actor_id: Uuid) -> Option<LibraryActor>;
}

/// In-memory snapshot of the actor library.
#[derive(Debug, Clone, Default)]
pub struct ActorCatalog {
    actors: BTreeMap<Uuid, LibraryActor>,
}

impl ActorCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an actor.
    pub fn insert(&mut self, actor: LibraryActor) {
        self.actors.insert(actor.id, actor);
    }

    /// Number of actors in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Returns `true` if the catalog holds no actors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Iterates actors ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &LibraryActor> {
        self.actors.values()
    }
}

impl FromIterator<LibraryActor> for ActorCatalog {
    fn from_iter<I: IntoIterator<Item = LibraryActor>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for actor in iter {
            catalog.insert(actor);
        }
        catalog
    }
}

impl ActorLibrary for ActorCatalog {
    fn find_actor(&self, actor_id: Uuid) -> Option<LibraryActor> {
        self.actors.get(&actor_id).cloned()
    }
}
