//! Local HTTP API for the initiative tracker.
//!
//! The UI shell drives the engine through these routes. One live encounter
//! is held in memory; saves and the actor library live in SQLite.

use axum::Router;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use state::AppState;

/// Builds the full application router (without middleware layers).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/encounter", routes::encounter::router())
        .nest("/api/v1/actors", routes::actors::router())
        .with_state(state)
}
