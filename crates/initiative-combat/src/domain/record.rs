//! Point-in-time snapshot of an encounter, used for save and load.
//!
//! Participant names and categories are not stored: they are resolved from
//! the actor library on load, so the library stays the single source of
//! truth for them. The initiative modifier is stored because it can be
//! overridden per encounter.

use std::collections::{BTreeMap, BTreeSet};

use initiative_core::error::DomainError;
use initiative_core::library::ActorLibrary;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregates::{Encounter, RoundSnapshot, TurnSnapshot};
use super::condition::AppliedCondition;
use super::initiative::Initiative;
use super::participant::{Participant, display_name};

/// Serialized form of an encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterRecord {
    pub encounter_id: Uuid,
    pub title: String,
    pub round: u32,
    pub active_participant_id: Option<Uuid>,
    pub instance_counters: BTreeMap<String, u32>,
    pub participants: Vec<ParticipantRecord>,
    #[serde(default)]
    pub deferred: Vec<Uuid>,
    #[serde(default)]
    pub turn_history: Vec<TurnSnapshot>,
    #[serde(default)]
    pub round_history: Vec<RoundSnapshot>,
}

/// Serialized form of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub participant_id: Uuid,
    pub actor_id: Uuid,
    pub base_name: String,
    pub instance_number: u32,
    pub initiative: Option<Initiative>,
    pub initiative_modifier: i32,
    pub has_acted: bool,
    pub manual_order: i32,
    #[serde(default)]
    pub conditions: Vec<AppliedCondition>,
    pub insertion_order: u64,
}

impl Encounter {
    /// Captures the full encounter state.
    #[must_use]
    pub fn to_record(&self) -> EncounterRecord {
        EncounterRecord {
            encounter_id: self.id,
            title: self.title.clone(),
            round: self.round,
            active_participant_id: self.active,
            instance_counters: self.instance_counters.clone(),
            participants: self
                .participants
                .iter()
                .map(|p| ParticipantRecord {
                    participant_id: p.id,
                    actor_id: p.actor_id,
                    base_name: p.base_name.clone(),
                    instance_number: p.instance_number,
                    initiative: p.initiative,
                    initiative_modifier: p.initiative_modifier,
                    has_acted: p.has_acted,
                    manual_order: p.manual_order,
                    conditions: p.applied_conditions(),
                    insertion_order: p.insertion_order,
                })
                .collect(),
            deferred: self.deferred.clone(),
            turn_history: self.turn_history.clone(),
            round_history: self.round_history.clone(),
        }
    }

    /// Rebuilds an encounter from a record, resolving every participant
    /// against the actor library. The load is all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MissingActor` if any participant's actor is not
    /// in the library, and `InvalidRecord`, `InvalidInitiative`,
    /// `InvalidConditionDuration` or `DuplicateName` if the record is
    /// inconsistent.
    pub fn from_record(
        record: EncounterRecord,
        library: &dyn ActorLibrary,
    ) -> Result<Self, DomainError> {
        let mut encounter = Self::new(record.encounter_id, record.title);
        let mut instance_counters = record.instance_counters;
        if let Some((name, _)) = instance_counters.iter().find(|(_, n)| **n == u32::MAX) {
            return Err(DomainError::InvalidRecord(format!(
                "instance counter for {name:?} is out of range"
            )));
        }
        let mut seen = BTreeSet::new();

        for stored in record.participants {
            if !seen.insert(stored.participant_id) {
                return Err(DomainError::InvalidRecord(format!(
                    "participant {} appears twice",
                    stored.participant_id
                )));
            }
            if stored.instance_number == u32::MAX || stored.insertion_order == u64::MAX {
                return Err(DomainError::InvalidRecord(format!(
                    "participant {} has an out-of-range instance or insertion order",
                    stored.participant_id
                )));
            }
            let actor = library
                .find_actor(stored.actor_id)
                .ok_or(DomainError::MissingActor(stored.actor_id))?;

            if let Some(initiative) = stored.initiative
                && actor.category.is_player()
                && !initiative.is_whole()
            {
                return Err(DomainError::InvalidInitiative(format!(
                    "player {} has fractional initiative {initiative}",
                    actor.name
                )));
            }

            let mut conditions = BTreeMap::new();
            for condition in stored.conditions {
                conditions.insert(condition.kind, condition.duration.validated()?);
            }

            let counter = instance_counters.entry(actor.name.clone()).or_insert(0);
            *counter = (*counter).max(stored.instance_number);

            encounter.participants.push(Participant {
                id: stored.participant_id,
                actor_id: actor.id,
                category: actor.category,
                base_name: actor.name.clone(),
                instance_number: stored.instance_number,
                display_name: display_name(&actor.name, stored.instance_number, false),
                initiative: stored.initiative,
                initiative_modifier: stored.initiative_modifier,
                has_acted: stored.has_acted,
                manual_order: stored.manual_order,
                conditions,
                insertion_order: stored.insertion_order,
            });
        }

        encounter.instance_counters = instance_counters;
        renumber_merged_names(&mut encounter)?;
        let base_names: BTreeSet<String> = encounter
            .participants
            .iter()
            .map(|p| p.base_name.clone())
            .collect();
        for base_name in &base_names {
            encounter.refresh_display_names(base_name);
        }
        let mut names = BTreeSet::new();
        for participant in &encounter.participants {
            if !names.insert(participant.display_name.as_str()) {
                return Err(DomainError::DuplicateName(participant.display_name.clone()));
            }
        }

        let known = |id: &Uuid| seen.contains(id);
        if let Some(active) = record.active_participant_id
            && !known(&active)
        {
            return Err(DomainError::InvalidRecord(format!(
                "active participant {active} is not in the encounter"
            )));
        }

        encounter.next_insertion_order = encounter
            .participants
            .iter()
            .map(|p| p.insertion_order.saturating_add(1))
            .max()
            .unwrap_or(0);
        encounter.active = record.active_participant_id;
        encounter.deferred = record.deferred.into_iter().filter(known).collect();
        encounter.turn_history = record
            .turn_history
            .into_iter()
            .filter(|turn| known(&turn.active_participant_id))
            .collect();
        encounter.round_history = record.round_history;
        encounter.round = if record.round == 0 && encounter.initiative_complete() {
            1
        } else {
            record.round
        };

        Ok(encounter)
    }
}

/// Library renames can fold two base names into one. Later joiners that
/// collide with an earlier instance number get fresh numbers past the counter.
fn renumber_merged_names(encounter: &mut Encounter) -> Result<(), DomainError> {
    let mut order: Vec<usize> = (0..encounter.participants.len()).collect();
    order.sort_by_key(|&index| encounter.participants[index].insertion_order);

    let mut used: BTreeSet<(String, u32)> = BTreeSet::new();
    for index in order {
        let participant = &encounter.participants[index];
        let key = (participant.base_name.clone(), participant.instance_number);
        if used.insert(key) {
            continue;
        }

        let base_name = participant.base_name.clone();
        let counter = encounter
            .instance_counters
            .entry(base_name.clone())
            .or_insert(0);
        *counter = counter.checked_add(1).ok_or_else(|| {
            DomainError::InvalidRecord(format!("instance counter for {base_name:?} overflowed"))
        })?;
        let instance_number = *counter;
        used.insert((base_name, instance_number));
        encounter.participants[index].instance_number = instance_number;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use initiative_core::aggregate::AggregateRoot;
    use initiative_core::library::{ActorCatalog, ActorCategory, LibraryActor};
    use initiative_test_support::{FixedClock, library_actor};

    use super::*;
    use crate::domain::condition::{ConditionDuration, ConditionKind};

    fn clock() -> FixedClock {
        FixedClock(chrono::Utc::now())
    }

    fn sample() -> (Encounter, ActorCatalog, LibraryActor) {
        let ada = library_actor("Ada", ActorCategory::Player, 3);
        let goblin = library_actor("Goblin", ActorCategory::Monster, 2);
        let catalog: ActorCatalog = [ada.clone(), goblin.clone()].into_iter().collect();

        let mut encounter = Encounter::new(Uuid::new_v4(), "Cave");
        let ada_id = Uuid::new_v4();
        encounter
            .add_participant(ada_id, &ada, Uuid::new_v4(), &clock())
            .unwrap();
        for _ in 0..2 {
            encounter
                .add_participant(Uuid::new_v4(), &goblin, Uuid::new_v4(), &clock())
                .unwrap();
        }
        for (index, participant) in encounter.participants().to_vec().iter().enumerate() {
            let value = 20.0 - f64::from(u32::try_from(index).unwrap());
            encounter
                .set_initiative(participant.id, value, Uuid::new_v4(), &clock())
                .unwrap();
        }
        encounter
            .apply_condition(
                ada_id,
                ConditionKind::Prone,
                ConditionDuration::Turns(2),
                Uuid::new_v4(),
                &clock(),
            )
            .unwrap();
        encounter.advance_turn(Uuid::new_v4(), &clock()).unwrap();
        encounter.advance_turn(Uuid::new_v4(), &clock()).unwrap();
        encounter.take_uncommitted_events();

        (encounter, catalog, goblin)
    }

    #[test]
    fn test_record_round_trips_through_json() {
        let (encounter, catalog, _) = sample();
        let json = serde_json::to_value(encounter.to_record()).unwrap();

        let record: EncounterRecord = serde_json::from_value(json).unwrap();
        let loaded = Encounter::from_record(record, &catalog).unwrap();

        assert_eq!(loaded.to_record(), encounter.to_record());
        assert_eq!(loaded.participants(), encounter.participants());
        assert_eq!(loaded.version(), 0);
    }

    #[test]
    fn test_load_fails_when_an_actor_is_missing() {
        let (encounter, _, goblin) = sample();
        let only_goblin: ActorCatalog = [goblin].into_iter().collect();

        let result = Encounter::from_record(encounter.to_record(), &only_goblin);

        assert!(matches!(result, Err(DomainError::MissingActor(_))));
    }

    #[test]
    fn test_load_takes_names_from_the_library() {
        let (encounter, catalog, goblin) = sample();
        let mut renamed = catalog.clone();
        renamed.insert(LibraryActor {
            name: "Hobgoblin".to_owned(),
            ..goblin
        });

        let loaded = Encounter::from_record(encounter.to_record(), &renamed).unwrap();

        let names: Vec<&str> = loaded
            .participants()
            .iter()
            .map(|p| p.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Ada", "Hobgoblin 1", "Hobgoblin 2"]);
        assert_eq!(loaded.instance_counter("Hobgoblin"), 2);
    }

    #[test]
    fn test_load_keeps_stored_modifier() {
        let (mut encounter, catalog, _) = sample();
        let goblin_id = encounter.participants()[1].id;
        encounter
            .set_initiative_modifier(goblin_id, -4, Uuid::new_v4(), &clock())
            .unwrap();

        let loaded = Encounter::from_record(encounter.to_record(), &catalog).unwrap();

        assert_eq!(
            loaded.participant(goblin_id).unwrap().initiative_modifier,
            -4
        );
    }

    #[test]
    fn test_load_rejects_fractional_player_initiative() {
        let (encounter, catalog, _) = sample();
        let mut record = encounter.to_record();
        record.participants[0].initiative = Some(Initiative::from_ten_thousandths(125_000));

        let result = Encounter::from_record(record, &catalog);

        assert!(matches!(result, Err(DomainError::InvalidInitiative(_))));
    }

    #[test]
    fn test_load_rejects_unknown_active_participant() {
        let (encounter, catalog, _) = sample();
        let mut record = encounter.to_record();
        record.active_participant_id = Some(Uuid::new_v4());

        let result = Encounter::from_record(record, &catalog);

        assert!(matches!(result, Err(DomainError::InvalidRecord(_))));
    }

    #[test]
    fn test_load_rejects_zero_turn_condition() {
        let (encounter, catalog, _) = sample();
        let mut record = encounter.to_record();
        record.participants[0].conditions[0].duration = ConditionDuration::Turns(0);

        let result = Encounter::from_record(record, &catalog);

        assert!(matches!(result, Err(DomainError::InvalidConditionDuration(_))));
    }

    #[test]
    fn test_load_renumbers_instances_merged_by_a_rename() {
        let orc = library_actor("Orc", ActorCategory::Monster, 0);
        let goblin = library_actor("Goblin", ActorCategory::Monster, 2);
        let mut encounter = Encounter::new(Uuid::new_v4(), "Camp");
        let orc_id = Uuid::new_v4();
        encounter
            .add_participant(orc_id, &orc, Uuid::new_v4(), &clock())
            .unwrap();
        let first_goblin = Uuid::new_v4();
        let second_goblin = Uuid::new_v4();
        for id in [first_goblin, second_goblin] {
            encounter
                .add_participant(id, &goblin, Uuid::new_v4(), &clock())
                .unwrap();
        }
        let renamed: ActorCatalog = [
            orc,
            LibraryActor {
                name: "Orc".to_owned(),
                ..goblin
            },
        ]
        .into_iter()
        .collect();

        let loaded = Encounter::from_record(encounter.to_record(), &renamed).unwrap();

        let name_of = |id| loaded.participant(id).unwrap().display_name.clone();
        assert_eq!(name_of(orc_id), "Orc 1");
        assert_eq!(name_of(first_goblin), "Orc 3");
        assert_eq!(name_of(second_goblin), "Orc 2");
        assert_eq!(loaded.instance_counter("Orc"), 3);
    }

    #[test]
    fn test_load_rejects_out_of_range_counters() {
        let (encounter, catalog, _) = sample();
        let mut record = encounter.to_record();
        record.participants[1].insertion_order = u64::MAX;

        let result = Encounter::from_record(record, &catalog);

        assert!(matches!(result, Err(DomainError::InvalidRecord(_))));

        let mut record = encounter.to_record();
        record.participants[1].instance_number = u32::MAX;

        let result = Encounter::from_record(record, &catalog);

        assert!(matches!(result, Err(DomainError::InvalidRecord(_))));

        let mut record = encounter.to_record();
        record
            .instance_counters
            .insert("Goblin".to_owned(), u32::MAX);

        let result = Encounter::from_record(record, &catalog);

        assert!(matches!(result, Err(DomainError::InvalidRecord(_))));
    }

    #[test]
    fn test_counter_is_raised_to_highest_instance() {
        let (encounter, catalog, _) = sample();
        let mut record = encounter.to_record();
        record.instance_counters.clear();

        let loaded = Encounter::from_record(record, &catalog).unwrap();

        assert_eq!(loaded.instance_counter("Goblin"), 2);
    }

    #[test]
    fn test_round_zero_with_complete_initiative_starts_at_one() {
        let (encounter, catalog, _) = sample();
        let mut record = encounter.to_record();
        record.round = 0;

        let loaded = Encounter::from_record(record, &catalog).unwrap();

        assert_eq!(loaded.round(), 1);
    }

    #[test]
    fn test_missing_history_fields_default_to_empty() {
        let (encounter, catalog, _) = sample();
        let mut json = serde_json::to_value(encounter.to_record()).unwrap();
        let object = json.as_object_mut().unwrap();
        object.remove("deferred");
        object.remove("turn_history");
        object.remove("round_history");

        let record: EncounterRecord = serde_json::from_value(json).unwrap();
        let loaded = Encounter::from_record(record, &catalog).unwrap();

        assert!(!loaded.can_retreat_turn());
        assert!(!loaded.can_retreat_round());
    }
}
