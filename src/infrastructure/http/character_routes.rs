//! Character API routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::dto::{CreateCharacterRequestDto, MessageResponseDto};
use crate::application::services::CharacterServiceError;
use crate::domain::entities::CharacterRecord;
use crate::domain::value_objects::CharacterId;
use crate::infrastructure::state::AppState;

fn parse_character_id(id: &str) -> Result<CharacterId, (StatusCode, String)> {
    Uuid::parse_str(id)
        .map(CharacterId::from_uuid)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid character ID".to_string()))
}

fn error_response(e: CharacterServiceError) -> (StatusCode, String) {
    let status = match e {
        CharacterServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        CharacterServiceError::Generation(_) | CharacterServiceError::Pool(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

/// Generate a character without saving it
pub async fn generate_character(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCharacterRequestDto>,
) -> Result<Json<CharacterRecord>, (StatusCode, String)> {
    let character = state
        .character_service
        .create_character(&req.user_prompt)
        .await
        .map_err(error_response)?;

    Ok(Json(character))
}

/// List the character pool
pub async fn list_characters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CharacterRecord>>, (StatusCode, String)> {
    let characters = state
        .character_service
        .list_characters()
        .await
        .map_err(error_response)?;

    Ok(Json(characters))
}

/// Generate a character and add it to the pool
pub async fn create_character(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCharacterRequestDto>,
) -> Result<Json<CharacterRecord>, (StatusCode, String)> {
    let character = state
        .character_service
        .create_and_save(&req.user_prompt)
        .await
        .map_err(error_response)?;

    Ok(Json(character))
}

/// Get a single character from the pool
pub async fn get_character(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CharacterRecord>, (StatusCode, String)> {
    let character = state
        .character_service
        .get_character(parse_character_id(&id)?)
        .await
        .map_err(error_response)?;

    Ok(Json(character))
}

/// Delete a character from the pool
pub async fn delete_character(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponseDto>, (StatusCode, String)> {
    state
        .character_service
        .delete_character(parse_character_id(&id)?)
        .await
        .map_err(error_response)?;

    Ok(Json(MessageResponseDto {
        message: "Character deleted".to_string(),
    }))
}
