//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use initiative_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration or other storage setup failure.
    #[error("storage error: {0}")]
    Storage(#[from] DomainError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            DomainError::ParticipantNotFound(_) => {
                (StatusCode::NOT_FOUND, "participant_not_found")
            }
            DomainError::ActorNotFound(_) => (StatusCode::NOT_FOUND, "actor_not_found"),
            DomainError::EncounterNotFound(_) => (StatusCode::NOT_FOUND, "encounter_not_found"),
            DomainError::DuplicateName(_) => (StatusCode::CONFLICT, "duplicate_name"),
            DomainError::SaveNameTaken(_) => (StatusCode::CONFLICT, "save_name_taken"),
            DomainError::NoActiveActor => (StatusCode::CONFLICT, "no_active_actor"),
            DomainError::CombatNotStarted => (StatusCode::CONFLICT, "combat_not_started"),
            DomainError::InvalidInitiative(_) => (StatusCode::BAD_REQUEST, "invalid_initiative"),
            DomainError::InvalidConditionDuration(_) => {
                (StatusCode::BAD_REQUEST, "invalid_condition_duration")
            }
            DomainError::InvalidRecord(_) => (StatusCode::BAD_REQUEST, "invalid_record"),
            DomainError::MissingActor(_) => (StatusCode::UNPROCESSABLE_ENTITY, "missing_actor"),
            DomainError::Infrastructure(_) => {
                error!(error = %self.0, "request failed on infrastructure");
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn status_of(err: DomainError) -> StatusCode {
        let response = ApiError(err).into_response();
        response.status()
    }

    #[test]
    fn test_not_found_variants_map_to_404() {
        assert_eq!(
            status_of(DomainError::ParticipantNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::ActorNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::EncounterNotFound("Session 4".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_name_collisions_map_to_409() {
        assert_eq!(
            status_of(DomainError::DuplicateName("Goblin 2".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::SaveNameTaken("Session 4".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_phase_errors_map_to_409() {
        assert_eq!(status_of(DomainError::NoActiveActor), StatusCode::CONFLICT);
        assert_eq!(
            status_of(DomainError::CombatNotStarted),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(DomainError::InvalidInitiative("12.5".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::InvalidConditionDuration("0 turns".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_missing_actor_maps_to_422() {
        assert_eq!(
            status_of(DomainError::MissingActor(Uuid::new_v4())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_infrastructure_maps_to_500() {
        assert_eq!(
            status_of(DomainError::Infrastructure("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
