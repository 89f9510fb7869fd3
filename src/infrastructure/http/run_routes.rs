//! Run API routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::dto::{
    CompleteRunRequestDto, CompleteRunResponseDto, FloorResponseDto, RunStatusResponseDto,
    StartRunRequestDto, StartRunResponseDto,
};
use crate::application::services::RunError;
use crate::domain::value_objects::RunId;
use crate::infrastructure::state::AppState;

fn error_response(e: RunError) -> (StatusCode, String) {
    let status = match e {
        RunError::InsufficientPool { .. } => StatusCode::CONFLICT,
        RunError::NotFound(_) => StatusCode::NOT_FOUND,
        RunError::InvalidFloor(_) => StatusCode::BAD_REQUEST,
        RunError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

fn parse_run_id(run_id: &str) -> Result<RunId, (StatusCode, String)> {
    Uuid::parse_str(run_id)
        .map(RunId::from_uuid)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid run ID".to_string()))
}

/// Start a run against nine enemies drawn from the pool
pub async fn start_run(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRunRequestDto>,
) -> Result<Json<StartRunResponseDto>, (StatusCode, String)> {
    let started = state
        .run_service
        .start_run(req.player_characters)
        .await
        .map_err(error_response)?;

    Ok(Json(started))
}

/// Get run progress
pub async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<Json<RunStatusResponseDto>, (StatusCode, String)> {
    let run_id = parse_run_id(&run_id)?;

    let status = state
        .run_service
        .run_status(run_id)
        .await
        .map_err(error_response)?;

    Ok(Json(status))
}

/// Poll one floor of a run
pub async fn get_floor(
    State(state): State<Arc<AppState>>,
    Path((run_id, floor)): Path<(String, usize)>,
) -> Result<Json<FloorResponseDto>, (StatusCode, String)> {
    let run_id = parse_run_id(&run_id)?;

    let floor = state
        .run_service
        .get_floor(run_id, floor)
        .await
        .map_err(error_response)?;

    Ok(Json(floor))
}

/// Finish a run and save the winners into the pool
pub async fn complete_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
    Json(req): Json<CompleteRunRequestDto>,
) -> Result<Json<CompleteRunResponseDto>, (StatusCode, String)> {
    let run_id = parse_run_id(&run_id)?;

    let saved = state
        .run_service
        .complete_run(run_id, req.winning_characters)
        .await
        .map_err(error_response)?;

    Ok(Json(CompleteRunResponseDto { run_id, saved }))
}
