//! Routes for the live encounter.
//!
//! Every mutating route runs one engine operation under the encounter lock
//! and answers with the produced event ids plus the refreshed view, so the
//! UI never has to issue a follow-up read.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use initiative_combat::application::command_handlers;
use initiative_combat::application::query_handlers::{self, EncounterView, SavedEncounterView};
use initiative_combat::domain::aggregates::{Encounter, MoveDirection, RollMode};
use initiative_combat::domain::commands;
use initiative_combat::domain::commands::TurnAction;
use initiative_combat::domain::condition::ConditionKind;
use initiative_combat::domain::events::EncounterEvent;
use initiative_core::error::DomainError;
use initiative_core::event::{DomainEvent, EventEnvelope};

use crate::error::ApiError;
use crate::state::{AppState, DEFAULT_TITLE};

/// Request body for POST /start.
#[derive(Debug, Default, Deserialize)]
pub struct StartEncounterRequest {
    /// Title of the new encounter.
    #[serde(default)]
    pub title: Option<String>,
}

/// Request body for POST /participants.
#[derive(Debug, Deserialize)]
pub struct AddParticipantRequest {
    /// The library actor to add.
    pub actor_id: Uuid,
}

/// Request body for POST /initiative/roll.
#[derive(Debug, Deserialize)]
pub struct RollInitiativeRequest {
    /// Who to roll for. Defaults to everyone.
    #[serde(default)]
    pub mode: Option<RollMode>,
}

/// Request body for PUT /participants/{id}/initiative.
#[derive(Debug, Deserialize)]
pub struct SetInitiativeRequest {
    /// The initiative as entered.
    pub value: f64,
}

/// Request body for PUT /participants/{id}/modifier.
#[derive(Debug, Deserialize)]
pub struct SetModifierRequest {
    /// The new initiative modifier.
    pub initiative_modifier: i32,
}

/// Request body for POST /participants/{id}/move.
#[derive(Debug, Deserialize)]
pub struct MoveParticipantRequest {
    /// Which way to move.
    pub direction: MoveDirection,
}

/// Request body for POST /participants/{id}/conditions.
#[derive(Debug, Deserialize)]
pub struct ApplyConditionRequest {
    /// Which condition.
    pub condition: ConditionKind,
    /// Whether the condition never expires.
    #[serde(default)]
    pub permanent: bool,
    /// Round advances until expiry, when not permanent.
    #[serde(default)]
    pub remaining_turns: Option<u32>,
}

/// Request body for POST /turn.
#[derive(Debug, Deserialize)]
pub struct ControlTurnRequest {
    /// What to do.
    pub action: TurnAction,
}

/// Request body for POST /save.
#[derive(Debug, Default, Deserialize)]
pub struct SaveEncounterRequest {
    /// Save name. Generated when absent.
    #[serde(default)]
    pub name: Option<String>,
}

/// Request body for POST /load.
#[derive(Debug, Deserialize)]
pub struct LoadEncounterRequest {
    /// Save name.
    pub name: String,
}

/// Response body returned after an engine command is handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// IDs of the domain events produced.
    pub event_ids: Vec<Uuid>,
    /// The events themselves, as change notifications.
    pub events: Vec<EventEnvelope>,
    /// The encounter after the command.
    pub encounter: EncounterView,
}

/// Response body for POST /save.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    /// The name the encounter was saved under.
    pub name: String,
}

/// Runs `operation` against the live encounter while holding its lock.
fn execute<F>(state: &AppState, operation: F) -> Result<Json<CommandResponse>, ApiError>
where
    F: FnOnce(&mut Encounter) -> Result<Vec<EncounterEvent>, DomainError>,
{
    let mut encounter = state.lock_encounter()?;
    let events = operation(&mut encounter)?;

    Ok(Json(CommandResponse {
        event_ids: events.iter().map(|e| e.metadata.event_id).collect(),
        events: events.iter().map(DomainEvent::envelope).collect(),
        encounter: query_handlers::get_encounter_view(&encounter),
    }))
}

/// GET /
async fn get_encounter(State(state): State<AppState>) -> Result<Json<EncounterView>, ApiError> {
    let encounter = state.lock_encounter()?;
    Ok(Json(query_handlers::get_encounter_view(&encounter)))
}

/// POST /start
#[instrument(skip(state, request))]
async fn start_encounter(
    State(state): State<AppState>,
    Json(request): Json<StartEncounterRequest>,
) -> Result<Json<EncounterView>, ApiError> {
    let command = commands::StartEncounter {
        correlation_id: Uuid::new_v4(),
        encounter_id: Uuid::new_v4(),
        title: request.title.unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
    };

    info!(correlation_id = %command.correlation_id, "handling start_encounter command");

    let encounter = command_handlers::handle_start_encounter(&command);
    let view = query_handlers::get_encounter_view(&encounter);
    state.replace_encounter(encounter)?;

    Ok(Json(view))
}

/// POST /participants
#[instrument(skip(state, request), fields(actor_id = %request.actor_id))]
async fn add_participant(
    State(state): State<AppState>,
    Json(request): Json<AddParticipantRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let actor = state
        .actor_repository
        .find(request.actor_id)
        .await?
        .ok_or(DomainError::ActorNotFound(request.actor_id))?;
    let command = commands::AddParticipant {
        correlation_id: Uuid::new_v4(),
        participant_id: Uuid::new_v4(),
        actor,
    };

    info!(correlation_id = %command.correlation_id, "handling add_participant command");

    execute(&state, |encounter| {
        command_handlers::handle_add_participant(&command, encounter, state.clock.as_ref())
    })
}

/// DELETE /participants/{id}
#[instrument(skip(state))]
async fn remove_participant(
    State(state): State<AppState>,
    Path(participant_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RemoveParticipant {
        correlation_id: Uuid::new_v4(),
        participant_id,
    };

    info!(correlation_id = %command.correlation_id, "handling remove_participant command");

    execute(&state, |encounter| {
        command_handlers::handle_remove_participant(&command, encounter, state.clock.as_ref())
    })
}

/// POST /initiative/roll
#[instrument(skip(state, request))]
async fn roll_initiative(
    State(state): State<AppState>,
    Json(request): Json<RollInitiativeRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RollInitiative {
        correlation_id: Uuid::new_v4(),
        mode: request.mode.unwrap_or(RollMode::All),
    };

    info!(
        correlation_id = %command.correlation_id,
        mode = ?command.mode,
        "handling roll_initiative command"
    );

    execute(&state, |encounter| {
        command_handlers::handle_roll_initiative(
            &command,
            encounter,
            state.clock.as_ref(),
            &state.rng,
        )
    })
}

/// PUT /participants/{id}/initiative
#[instrument(skip(state, request))]
async fn set_initiative(
    State(state): State<AppState>,
    Path(participant_id): Path<Uuid>,
    Json(request): Json<SetInitiativeRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::SetInitiative {
        correlation_id: Uuid::new_v4(),
        participant_id,
        value: request.value,
    };

    info!(correlation_id = %command.correlation_id, "handling set_initiative command");

    execute(&state, |encounter| {
        command_handlers::handle_set_initiative(&command, encounter, state.clock.as_ref())
    })
}

/// PUT /participants/{id}/modifier
#[instrument(skip(state, request))]
async fn set_initiative_modifier(
    State(state): State<AppState>,
    Path(participant_id): Path<Uuid>,
    Json(request): Json<SetModifierRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::SetInitiativeModifier {
        correlation_id: Uuid::new_v4(),
        participant_id,
        initiative_modifier: request.initiative_modifier,
    };

    info!(
        correlation_id = %command.correlation_id,
        "handling set_initiative_modifier command"
    );

    execute(&state, |encounter| {
        command_handlers::handle_set_initiative_modifier(&command, encounter, state.clock.as_ref())
    })
}

/// POST /participants/{id}/move
#[instrument(skip(state, request))]
async fn move_participant(
    State(state): State<AppState>,
    Path(participant_id): Path<Uuid>,
    Json(request): Json<MoveParticipantRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::MoveParticipant {
        correlation_id: Uuid::new_v4(),
        participant_id,
        direction: request.direction,
    };

    info!(correlation_id = %command.correlation_id, "handling move_participant command");

    execute(&state, |encounter| {
        command_handlers::handle_move_participant(&command, encounter, state.clock.as_ref())
    })
}

/// POST /participants/{id}/conditions
#[instrument(skip(state, request))]
async fn apply_condition(
    State(state): State<AppState>,
    Path(participant_id): Path<Uuid>,
    Json(request): Json<ApplyConditionRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ApplyCondition {
        correlation_id: Uuid::new_v4(),
        participant_id,
        condition: request.condition,
        permanent: request.permanent,
        remaining_turns: request.remaining_turns,
    };

    info!(correlation_id = %command.correlation_id, "handling apply_condition command");

    execute(&state, |encounter| {
        command_handlers::handle_apply_condition(&command, encounter, state.clock.as_ref())
    })
}

/// DELETE /participants/{id}/conditions/{condition}
#[instrument(skip(state))]
async fn remove_condition(
    State(state): State<AppState>,
    Path((participant_id, condition)): Path<(Uuid, ConditionKind)>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RemoveCondition {
        correlation_id: Uuid::new_v4(),
        participant_id,
        condition,
    };

    info!(correlation_id = %command.correlation_id, "handling remove_condition command");

    execute(&state, |encounter| {
        command_handlers::handle_remove_condition(&command, encounter, state.clock.as_ref())
    })
}

/// POST /turn
#[instrument(skip(state, request), fields(action = ?request.action))]
async fn control_turn(
    State(state): State<AppState>,
    Json(request): Json<ControlTurnRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ControlTurn {
        correlation_id: Uuid::new_v4(),
        action: request.action,
    };

    info!(correlation_id = %command.correlation_id, "handling control_turn command");

    execute(&state, |encounter| {
        command_handlers::handle_control_turn(&command, encounter, state.clock.as_ref())
    })
}

/// POST /save
#[instrument(skip(state, request))]
async fn save_encounter(
    State(state): State<AppState>,
    Json(request): Json<SaveEncounterRequest>,
) -> Result<Json<SaveResponse>, ApiError> {
    let command = commands::SaveEncounter {
        correlation_id: Uuid::new_v4(),
        name: request.name,
    };

    info!(correlation_id = %command.correlation_id, "handling save_encounter command");

    // Snapshot first so the lock is released before touching storage.
    let record = state.lock_encounter()?.to_record();
    let name = command_handlers::handle_save_encounter(
        &command,
        record,
        state.clock.as_ref(),
        &*state.encounter_repository,
    )
    .await?;

    Ok(Json(SaveResponse { name }))
}

/// POST /load
#[instrument(skip(state, request), fields(name = %request.name))]
async fn load_encounter(
    State(state): State<AppState>,
    Json(request): Json<LoadEncounterRequest>,
) -> Result<Json<EncounterView>, ApiError> {
    let command = commands::LoadEncounter {
        correlation_id: Uuid::new_v4(),
        name: request.name,
    };

    info!(correlation_id = %command.correlation_id, "handling load_encounter command");

    let encounter = command_handlers::handle_load_encounter(
        &command,
        &*state.actor_repository,
        &*state.encounter_repository,
    )
    .await?;
    let view = query_handlers::get_encounter_view(&encounter);
    state.replace_encounter(encounter)?;

    Ok(Json(view))
}

/// GET /saves
async fn list_saves(
    State(state): State<AppState>,
) -> Result<Json<Vec<SavedEncounterView>>, ApiError> {
    let saves = query_handlers::list_saved_encounters(&*state.encounter_repository).await?;
    Ok(Json(saves))
}

/// Returns the router for the live encounter.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_encounter))
        .route("/start", post(start_encounter))
        .route("/participants", post(add_participant))
        .route("/participants/{id}", delete(remove_participant))
        .route("/participants/{id}/initiative", put(set_initiative))
        .route("/participants/{id}/modifier", put(set_initiative_modifier))
        .route("/participants/{id}/move", post(move_participant))
        .route("/participants/{id}/conditions", post(apply_condition))
        .route(
            "/participants/{id}/conditions/{condition}",
            delete(remove_condition),
        )
        .route("/initiative/roll", post(roll_initiative))
        .route("/turn", post(control_turn))
        .route("/save", post(save_encounter))
        .route("/load", post(load_encounter))
        .route("/saves", get(list_saves))
}
