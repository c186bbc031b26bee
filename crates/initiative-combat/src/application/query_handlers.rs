//! Query handlers for the turn order engine.
//!
//! Views are rebuilt from the live encounter on every call and carry the
//! derived flags a UI needs (tie markers, move and turn-control
//! availability), so no client has to re-implement the ordering rules.

use chrono::{DateTime, Utc};
use initiative_core::aggregate::AggregateRoot;
use initiative_core::error::DomainError;
use initiative_core::library::ActorCategory;
use initiative_core::repository::EncounterRepository;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{CombatPhase, Encounter, MoveDirection};
use crate::domain::condition::ConditionKind;
use crate::domain::participant::Participant;

/// Read-only view of one condition.
#[derive(Debug, Serialize)]
pub struct ConditionView {
    pub condition: ConditionKind,
    /// Human-readable label.
    pub label: &'static str,
    /// Whether the condition never expires.
    pub permanent: bool,
    /// Round advances until expiry.
    pub remaining_turns: Option<u32>,
}

/// Read-only view of one participant, in turn order.
#[derive(Debug, Serialize)]
pub struct ParticipantView {
    pub participant_id: Uuid,
    pub actor_id: Uuid,
    pub display_name: String,
    pub category: ActorCategory,
    /// Initiative formatted for display.
    pub initiative: Option<String>,
    pub initiative_value: Option<f64>,
    pub initiative_modifier: i32,
    pub is_active: bool,
    pub missing_initiative: bool,
    /// Whether the participant has acted this round.
    pub completed: bool,
    pub is_tied: bool,
    pub is_deferred: bool,
    pub can_move_left: bool,
    pub can_move_right: bool,
    pub conditions: Vec<ConditionView>,
}

/// Read-only view of the live encounter.
#[derive(Debug, Serialize)]
pub struct EncounterView {
    pub encounter_id: Uuid,
    pub title: String,
    pub round: u32,
    pub phase: CombatPhase,
    pub active_participant_id: Option<Uuid>,
    /// Participants in turn order.
    pub participants: Vec<ParticipantView>,
    pub can_advance_turn: bool,
    pub can_end_turn: bool,
    pub can_skip_turn: bool,
    pub can_retreat_turn: bool,
    pub can_advance_round: bool,
    pub can_retreat_round: bool,
    /// Current version (event count).
    pub version: i64,
}

/// Summary of a saved encounter.
#[derive(Debug, Serialize)]
pub struct SavedEncounterView {
    pub name: String,
    pub encounter_id: Uuid,
    pub saved_at: DateTime<Utc>,
}

fn participant_view(encounter: &Encounter, participant: &Participant) -> ParticipantView {
    let id = participant.id;
    ParticipantView {
        participant_id: id,
        actor_id: participant.actor_id,
        display_name: participant.display_name.clone(),
        category: participant.category,
        initiative: participant.initiative.map(|i| i.to_string()),
        initiative_value: participant.initiative.map(|i| i.as_f64()),
        initiative_modifier: participant.initiative_modifier,
        is_active: encounter.active_participant_id() == Some(id),
        missing_initiative: !participant.has_initiative(),
        completed: participant.has_acted,
        is_tied: encounter.is_tied(id),
        is_deferred: encounter.is_deferred(id),
        can_move_left: encounter.can_move(id, MoveDirection::Left),
        can_move_right: encounter.can_move(id, MoveDirection::Right),
        conditions: participant
            .conditions
            .iter()
            .map(|(kind, duration)| ConditionView {
                condition: *kind,
                label: kind.label(),
                permanent: duration.is_permanent(),
                remaining_turns: duration.remaining_turns(),
            })
            .collect(),
    }
}

/// Builds the view of the live encounter.
#[must_use]
pub fn get_encounter_view(encounter: &Encounter) -> EncounterView {
    EncounterView {
        encounter_id: encounter.id,
        title: encounter.title().to_owned(),
        round: encounter.round(),
        phase: encounter.phase(),
        active_participant_id: encounter.active_participant_id(),
        participants: encounter
            .turn_order()
            .into_iter()
            .map(|p| participant_view(encounter, p))
            .collect(),
        can_advance_turn: encounter.can_advance_turn(),
        can_end_turn: encounter.can_end_turn(),
        can_skip_turn: encounter.can_skip_turn(),
        can_retreat_turn: encounter.can_retreat_turn(),
        can_advance_round: encounter.can_advance_round(),
        can_retreat_round: encounter.can_retreat_round(),
        version: encounter.version(),
    }
}

/// Lists saved encounters, newest first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the repository fails.
pub async fn list_saved_encounters(
    repo: &dyn EncounterRepository,
) -> Result<Vec<SavedEncounterView>, DomainError> {
    let saves = repo.list().await?;
    Ok(saves
        .into_iter()
        .map(|s| SavedEncounterView {
            name: s.name,
            encounter_id: s.encounter_id,
            saved_at: s.saved_at,
        })
        .collect())
}
