//! Routes for the actor library.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use initiative_core::error::DomainError;
use initiative_core::library::{ActorCategory, LibraryActor};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct UpsertActorRequest {
    /// Existing actor to update. A new id is issued when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Base display name.
    pub name: String,
    /// Actor category.
    pub category: ActorCategory,
    /// Default initiative modifier.
    #[serde(default)]
    pub initiative_modifier: i32,
}

/// POST /
#[instrument(skip(state, request))]
async fn upsert_actor(
    State(state): State<AppState>,
    Json(request): Json<UpsertActorRequest>,
) -> Result<Json<LibraryActor>, ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(DomainError::InvalidRecord("actor name must not be empty".into()).into());
    }
    let actor = LibraryActor {
        id: request.id.unwrap_or_else(Uuid::new_v4),
        name: name.to_owned(),
        category: request.category,
        initiative_modifier: request.initiative_modifier,
    };

    state.actor_repository.upsert(&actor).await?;
    info!(actor_id = %actor.id, category = actor.category.as_str(), "actor saved");

    Ok(Json(actor))
}

/// GET /
async fn list_actors(State(state): State<AppState>) -> Result<Json<Vec<LibraryActor>>, ApiError> {
    let catalog = state.actor_repository.load_catalog().await?;
    let mut actors: Vec<LibraryActor> = catalog.iter().cloned().collect();
    actors.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then(a.id.cmp(&b.id))
    });
    Ok(Json(actors))
}

/// GET /{id}
async fn get_actor(
    State(state): State<AppState>,
    Path(actor_id): Path<Uuid>,
) -> Result<Json<LibraryActor>, ApiError> {
    let actor = state
        .actor_repository
        .find(actor_id)
        .await?
        .ok_or(DomainError::ActorNotFound(actor_id))?;
    Ok(Json(actor))
}

/// Returns the router for the actor library.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_actors).post(upsert_actor))
        .route("/{id}", get(get_actor))
}
