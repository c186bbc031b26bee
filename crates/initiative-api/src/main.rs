//! Initiative tracker API server entry point.

use std::sync::{Arc, Mutex};

use initiative_api::config::ServerConfig;
use initiative_api::error::AppError;
use initiative_api::state::AppState;
use initiative_core::clock::SystemClock;
use initiative_core::rng::{DeterministicRng, StdRngSource};
use initiative_store::{SqliteActorRepository, SqliteEncounterRepository};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting initiative tracker API server");

    let config = ServerConfig::from_env()?;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    initiative_store::migrate(&pool).await?;

    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = match config.rng_seed {
        Some(seed) => {
            tracing::info!(seed, "initiative rolls are seeded");
            Arc::new(Mutex::new(StdRngSource::seeded(seed)))
        }
        None => Arc::new(Mutex::new(StdRngSource::from_entropy())),
    };

    let app_state = AppState::new(
        Arc::new(SystemClock),
        rng,
        Arc::new(SqliteEncounterRepository::new(pool.clone())),
        Arc::new(SqliteActorRepository::new(pool)),
    );

    // The UI shell is served from another local origin.
    let app = initiative_api::build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.socket_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
