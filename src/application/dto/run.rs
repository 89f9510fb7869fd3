//! Run DTOs - HTTP request and response bodies for roguelike runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{CharacterRecord, RunSession, RunStatus, FLOORS_PER_RUN};
use crate::domain::value_objects::{AffinityTable, RunId};

#[derive(Debug, Deserialize)]
pub struct StartRunRequestDto {
    pub player_characters: Vec<CharacterRecord>,
}

#[derive(Debug, Serialize)]
pub struct StartRunResponseDto {
    pub run_id: RunId,
    pub enemies: Vec<CharacterRecord>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRunRequestDto {
    pub winning_characters: Vec<CharacterRecord>,
}

#[derive(Debug, Serialize)]
pub struct CompleteRunResponseDto {
    pub run_id: RunId,
    /// Winners as stored in the pool, under fresh identifiers
    pub saved: Vec<CharacterRecord>,
}

/// Poll result for one floor
#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FloorResponseDto {
    Calculating,
    Completed {
        enemy: CharacterRecord,
        affinity_table: AffinityTable,
    },
}

#[derive(Debug, Serialize)]
pub struct RunStatusResponseDto {
    pub run_id: RunId,
    pub status: RunStatus,
    pub floors_ready: usize,
    pub total_floors: usize,
    pub enemies: Vec<CharacterRecord>,
    pub started_at: DateTime<Utc>,
}

impl From<&RunSession> for RunStatusResponseDto {
    fn from(session: &RunSession) -> Self {
        Self {
            run_id: session.id,
            status: session.status(),
            floors_ready: session.floors_ready(),
            total_floors: FLOORS_PER_RUN,
            enemies: session.enemies().to_vec(),
            started_at: session.created_at,
        }
    }
}
