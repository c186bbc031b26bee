//! Command handlers for the turn order engine.
//!
//! The live encounter is owned by the caller. Synchronous handlers run one
//! domain operation against it and return the events it produced; the async
//! handlers move whole encounters in and out of the save repository.

use std::sync::Mutex;

use initiative_core::aggregate::AggregateRoot;
use initiative_core::clock::Clock;
use initiative_core::command::Command;
use initiative_core::error::DomainError;
use initiative_core::repository::{ActorRepository, EncounterRepository, StoredEncounter};
use initiative_core::rng::DeterministicRng;
use tracing::{debug, info};

use crate::domain::aggregates::Encounter;
use crate::domain::commands::{
    AddParticipant, ApplyCondition, ControlTurn, LoadEncounter, MoveParticipant, RemoveCondition,
    RemoveParticipant, RollInitiative, SaveEncounter, SetInitiative, SetInitiativeModifier,
    StartEncounter, TurnAction,
};
use crate::domain::condition::ConditionDuration;
use crate::domain::events::EncounterEvent;
use crate::domain::record::EncounterRecord;

const UNTITLED: &str = "Encounter";

/// Takes the events `command` produced off the encounter.
fn drain(command: &impl Command, encounter: &mut Encounter) -> Vec<EncounterEvent> {
    let events = encounter.take_uncommitted_events();
    debug!(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        participant_id = ?command.participant_id(),
        events = events.len(),
        "command handled"
    );
    events
}

/// Handles the `StartEncounter` command: builds a fresh, empty encounter
/// that replaces the live one.
#[must_use]
pub fn handle_start_encounter(command: &StartEncounter) -> Encounter {
    debug!(encounter_id = %command.encounter_id, "starting encounter");
    Encounter::new(command.encounter_id, command.title.trim())
}

/// Handles the `AddParticipant` command.
///
/// # Errors
///
/// Returns `DomainError::DuplicateName` if the resulting names collide.
pub fn handle_add_participant(
    command: &AddParticipant,
    encounter: &mut Encounter,
    clock: &dyn Clock,
) -> Result<Vec<EncounterEvent>, DomainError> {
    encounter.add_participant(
        command.participant_id,
        &command.actor,
        command.correlation_id,
        clock,
    )?;
    Ok(drain(command, encounter))
}

/// Handles the `RemoveParticipant` command.
///
/// # Errors
///
/// Returns `DomainError::ParticipantNotFound` for unknown ids.
pub fn handle_remove_participant(
    command: &RemoveParticipant,
    encounter: &mut Encounter,
    clock: &dyn Clock,
) -> Result<Vec<EncounterEvent>, DomainError> {
    encounter.remove_participant(command.participant_id, command.correlation_id, clock)?;
    Ok(drain(command, encounter))
}

/// Handles the `RollInitiative` command.
///
/// The `Mutex` is locked only around the synchronous domain method call.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the RNG mutex is poisoned.
pub fn handle_roll_initiative(
    command: &RollInitiative,
    encounter: &mut Encounter,
    clock: &dyn Clock,
    rng: &Mutex<dyn DeterministicRng + Send>,
) -> Result<Vec<EncounterEvent>, DomainError> {
    {
        let mut rng_guard = rng
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?;
        encounter.roll_initiative(command.mode, command.correlation_id, clock, &mut *rng_guard);
    }
    Ok(drain(command, encounter))
}

/// Handles the `SetInitiative` command.
///
/// # Errors
///
/// Returns `DomainError::ParticipantNotFound` or
/// `DomainError::InvalidInitiative`.
pub fn handle_set_initiative(
    command: &SetInitiative,
    encounter: &mut Encounter,
    clock: &dyn Clock,
) -> Result<Vec<EncounterEvent>, DomainError> {
    encounter.set_initiative(
        command.participant_id,
        command.value,
        command.correlation_id,
        clock,
    )?;
    Ok(drain(command, encounter))
}

/// Handles the `SetInitiativeModifier` command.
///
/// # Errors
///
/// Returns `DomainError::ParticipantNotFound` for unknown ids.
pub fn handle_set_initiative_modifier(
    command: &SetInitiativeModifier,
    encounter: &mut Encounter,
    clock: &dyn Clock,
) -> Result<Vec<EncounterEvent>, DomainError> {
    encounter.set_initiative_modifier(
        command.participant_id,
        command.initiative_modifier,
        command.correlation_id,
        clock,
    )?;
    Ok(drain(command, encounter))
}

/// Handles the `MoveParticipant` command. Moves outside a tie produce no
/// events.
///
/// # Errors
///
/// Returns `DomainError::ParticipantNotFound` for unknown ids.
pub fn handle_move_participant(
    command: &MoveParticipant,
    encounter: &mut Encounter,
    clock: &dyn Clock,
) -> Result<Vec<EncounterEvent>, DomainError> {
    encounter.move_participant(
        command.participant_id,
        command.direction,
        command.correlation_id,
        clock,
    )?;
    Ok(drain(command, encounter))
}

/// Handles the `ApplyCondition` command.
///
/// # Errors
///
/// Returns `DomainError::InvalidConditionDuration` unless exactly one of
/// `permanent` or a positive `remaining_turns` is given, and
/// `DomainError::ParticipantNotFound` for unknown ids.
pub fn handle_apply_condition(
    command: &ApplyCondition,
    encounter: &mut Encounter,
    clock: &dyn Clock,
) -> Result<Vec<EncounterEvent>, DomainError> {
    let duration = ConditionDuration::from_parts(command.permanent, command.remaining_turns)?;
    encounter.apply_condition(
        command.participant_id,
        command.condition,
        duration,
        command.correlation_id,
        clock,
    )?;
    Ok(drain(command, encounter))
}

/// Handles the `RemoveCondition` command.
///
/// # Errors
///
/// Returns `DomainError::ParticipantNotFound` for unknown ids.
pub fn handle_remove_condition(
    command: &RemoveCondition,
    encounter: &mut Encounter,
    clock: &dyn Clock,
) -> Result<Vec<EncounterEvent>, DomainError> {
    encounter.remove_condition(
        command.participant_id,
        command.condition,
        command.correlation_id,
        clock,
    )?;
    Ok(drain(command, encounter))
}

/// Handles the `ControlTurn` command.
///
/// # Errors
///
/// Returns `DomainError::NoActiveActor` or `DomainError::CombatNotStarted`
/// when the action is not available in the current phase.
pub fn handle_control_turn(
    command: &ControlTurn,
    encounter: &mut Encounter,
    clock: &dyn Clock,
) -> Result<Vec<EncounterEvent>, DomainError> {
    let correlation_id = command.correlation_id;
    match command.action {
        TurnAction::Advance => encounter.advance_turn(correlation_id, clock)?,
        TurnAction::End => encounter.end_turn(correlation_id, clock)?,
        TurnAction::Skip => encounter.skip_turn(correlation_id, clock)?,
        TurnAction::Retreat => encounter.retreat_turn(correlation_id, clock)?,
        TurnAction::AdvanceRound => encounter.advance_round(correlation_id, clock)?,
        TurnAction::RetreatRound => encounter.retreat_round(correlation_id, clock)?,
    }
    Ok(drain(command, encounter))
}

/// Handles the `SaveEncounter` command: writes `record` under a new name and
/// returns that name. Saves are never overwritten.
///
/// Without an explicit name, the name is built from the title and the
/// current minute, with ` (2)`, ` (3)`, ... appended until it is unused.
///
/// # Errors
///
/// Returns `DomainError::SaveNameTaken` if an explicit name is already used,
/// `DomainError::Infrastructure` if the repository fails.
pub async fn handle_save_encounter(
    command: &SaveEncounter,
    record: EncounterRecord,
    clock: &dyn Clock,
    repo: &dyn EncounterRepository,
) -> Result<String, DomainError> {
    let requested = command
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let name = match requested {
        Some(name) => name.to_owned(),
        None => generate_save_name(&record.title, clock, repo).await?,
    };

    let payload = serde_json::to_value(&record)
        .map_err(|e| DomainError::Infrastructure(format!("record serialization failed: {e}")))?;
    let stored = StoredEncounter {
        name: name.clone(),
        encounter_id: record.encounter_id,
        payload,
        saved_at: clock.now(),
    };
    repo.insert(&stored).await?;

    info!(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        %name,
        "encounter saved"
    );
    Ok(name)
}

async fn generate_save_name(
    title: &str,
    clock: &dyn Clock,
    repo: &dyn EncounterRepository,
) -> Result<String, DomainError> {
    let title = if title.trim().is_empty() {
        UNTITLED
    } else {
        title.trim()
    };
    let base = format!("{title} {}", clock.save_stamp());
    if !repo.exists(&base).await? {
        return Ok(base);
    }

    let mut suffix = 2_u32;
    loop {
        let candidate = format!("{base} ({suffix})");
        if !repo.exists(&candidate).await? {
            return Ok(candidate);
        }
        suffix += 1;
    }
}

/// Handles the `LoadEncounter` command: reads the save and rebuilds the
/// encounter against the current actor library. The caller swaps it in only
/// on success, so a failed load leaves the live encounter untouched.
///
/// # Errors
///
/// Returns `DomainError::EncounterNotFound` for unknown names,
/// `DomainError::InvalidRecord` for unreadable payloads and
/// `DomainError::MissingActor` if an actor was deleted from the library.
pub async fn handle_load_encounter(
    command: &LoadEncounter,
    actors: &dyn ActorRepository,
    repo: &dyn EncounterRepository,
) -> Result<Encounter, DomainError> {
    let stored = repo
        .load(&command.name)
        .await?
        .ok_or_else(|| DomainError::EncounterNotFound(command.name.clone()))?;
    let record: EncounterRecord = serde_json::from_value(stored.payload)
        .map_err(|e| DomainError::InvalidRecord(format!("unreadable save: {e}")))?;
    let catalog = actors.load_catalog().await?;

    let encounter = Encounter::from_record(record, &catalog)?;
    info!(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id,
        encounter_id = %encounter.id,
        "encounter loaded"
    );
    Ok(encounter)
}
