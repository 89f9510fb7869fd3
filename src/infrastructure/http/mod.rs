//! HTTP REST API routes

mod character_routes;
mod run_routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::infrastructure::state::{AppState, STATIC_URL_PREFIX};

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Character routes
        .route(
            "/api/v1/characters",
            post(character_routes::generate_character),
        )
        .route("/api/characters", get(character_routes::list_characters))
        .route("/api/characters", post(character_routes::create_character))
        .route(
            "/api/characters/{id}",
            get(character_routes::get_character).delete(character_routes::delete_character),
        )
        // Run routes
        .route("/api/runs", post(run_routes::start_run))
        .route("/api/runs/{run_id}", get(run_routes::get_run))
        .route(
            "/api/runs/{run_id}/floors/{floor}",
            get(run_routes::get_floor),
        )
        .route(
            "/api/runs/{run_id}/complete",
            post(run_routes::complete_run),
        )
}

/// Full application router: health check, API, static content and layers
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/health", get(health_check))
        .merge(create_routes())
        .nest_service(STATIC_URL_PREFIX, static_files)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
