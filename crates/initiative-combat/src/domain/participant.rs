//! Encounter participants.

use std::collections::BTreeMap;

use initiative_core::library::ActorCategory;
use uuid::Uuid;

use super::condition::{AppliedCondition, ConditionDuration, ConditionKind};
use super::initiative::Initiative;

/// One combatant instance inside an encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Stable instance identifier.
    pub id: Uuid,
    /// The library actor this participant was created from.
    pub actor_id: Uuid,
    /// Actor category.
    pub category: ActorCategory,
    /// Library name, without instance suffix.
    pub base_name: String,
    /// Instance number issued by the encounter's per-name counter.
    pub instance_number: u32,
    /// Name shown to the user; unique within the encounter.
    pub display_name: String,
    /// Current initiative, if rolled or entered.
    pub initiative: Option<Initiative>,
    /// Modifier used for rolls. Overrides the library value.
    pub initiative_modifier: i32,
    /// Whether the participant has finished its turn this round.
    pub has_acted: bool,
    /// Hand-assigned position among same-initiative participants.
    pub manual_order: i32,
    /// Active conditions.
    pub conditions: BTreeMap<ConditionKind, ConditionDuration>,
    /// Order in which the participant joined the encounter.
    pub insertion_order: u64,
}

impl Participant {
    /// Returns `true` if the participant has an initiative value.
    #[must_use]
    pub fn has_initiative(&self) -> bool {
        self.initiative.is_some()
    }

    /// Conditions as a list, ordered by kind.
    #[must_use]
    pub fn applied_conditions(&self) -> Vec<AppliedCondition> {
        self.conditions
            .iter()
            .map(|(kind, duration)| AppliedCondition {
                kind: *kind,
                duration: *duration,
            })
            .collect()
    }
}

/// Formats a participant name. `numbered` is set once a base name has been
/// added more than once in the encounter.
#[must_use]
pub fn display_name(base_name: &str, instance_number: u32, numbered: bool) -> String {
    if numbered {
        format!("{base_name} {instance_number}")
    } else {
        base_name.to_owned()
    }
}
