//! AI-Rogue Engine - Backend API for generated characters and roguelike runs
//!
//! The Engine is the backend server that:
//! - Generates characters with a text model and turns portraits into sprites
//! - Keeps the character pool enemies are drawn from
//! - Runs roguelike sessions whose floor affinities are computed in the background

mod application;
mod domain;
mod infrastructure;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http;
use crate::infrastructure::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airogue_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting AI-Rogue Engine");

    let config = AppConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Ollama: {} ({})", config.ollama_base_url, config.ollama_model);
    tracing::info!("  ComfyUI: {}", config.comfyui_base_url);
    tracing::info!("  Static content: {}", config.static_dir.display());
    tracing::info!("  Character pool: {}", config.character_file.display());

    let port = config.server_port;
    let state = Arc::new(AppState::new(config).await?);
    tracing::info!("Application state initialized");

    let app = http::build_router(Arc::clone(&state));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            let runs = state.runs.read().await;
            if runs.is_empty() {
                tracing::info!("Shutdown signal received");
            } else {
                tracing::info!(
                    active_runs = runs.len(),
                    "Shutdown signal received, dropping active runs"
                );
            }
        }
    }

    Ok(())
}
