//! Run entity - one playthrough across nine enemy floors

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::CharacterRecord;
use crate::domain::value_objects::{AffinityTable, RunId};

/// Number of floors (and enemies) in every run
pub const FLOORS_PER_RUN: usize = 9;

/// Observable lifecycle of a run held in memory
///
/// A finalized run is removed from the registry, so it has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Fewer than nine floor tables are available
    Enriching,
    /// All nine floor tables are available
    Ready,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FloorAppendError {
    #[error("Floor {attempted} is out of order, expected floor {expected}")]
    OutOfOrder { expected: usize, attempted: usize },
    #[error("All floors are already computed")]
    Full,
}

/// State of one active run
#[derive(Debug, Clone)]
pub struct RunSession {
    pub id: RunId,
    enemies: Vec<CharacterRecord>,
    players: Vec<CharacterRecord>,
    /// Index `i` holds the table for floor `i + 1`
    floors: Vec<AffinityTable>,
    pub created_at: DateTime<Utc>,
}

impl RunSession {
    /// Create a run with no floor tables yet.
    ///
    /// `enemies` must hold exactly [`FLOORS_PER_RUN`] records; floor `n` fights
    /// `enemies[n - 1]`.
    pub fn new(id: RunId, enemies: Vec<CharacterRecord>, players: Vec<CharacterRecord>) -> Self {
        debug_assert_eq!(enemies.len(), FLOORS_PER_RUN);
        Self {
            id,
            enemies,
            players,
            floors: Vec::with_capacity(FLOORS_PER_RUN),
            created_at: Utc::now(),
        }
    }

    pub fn enemies(&self) -> &[CharacterRecord] {
        &self.enemies
    }

    pub fn players(&self) -> &[CharacterRecord] {
        &self.players
    }

    /// Enemy fought on a 1-based floor
    pub fn enemy(&self, floor: usize) -> Option<&CharacterRecord> {
        floor.checked_sub(1).and_then(|i| self.enemies.get(i))
    }

    /// Affinity table for a 1-based floor, if already computed
    pub fn floor_table(&self, floor: usize) -> Option<&AffinityTable> {
        floor.checked_sub(1).and_then(|i| self.floors.get(i))
    }

    /// Number of computed floors; floors `1..=k` are present
    pub fn floors_ready(&self) -> usize {
        self.floors.len()
    }

    /// The next floor the enrichment task has to compute
    pub fn next_floor(&self) -> Option<usize> {
        (self.floors.len() < FLOORS_PER_RUN).then(|| self.floors.len() + 1)
    }

    /// Append the table for `floor`, which must be exactly the next floor
    pub fn push_floor(
        &mut self,
        floor: usize,
        table: AffinityTable,
    ) -> Result<(), FloorAppendError> {
        let expected = self.next_floor().ok_or(FloorAppendError::Full)?;
        if floor != expected {
            return Err(FloorAppendError::OutOfOrder {
                expected,
                attempted: floor,
            });
        }
        self.floors.push(table);
        Ok(())
    }

    pub fn status(&self) -> RunStatus {
        if self.floors.len() == FLOORS_PER_RUN {
            RunStatus::Ready
        } else {
            RunStatus::Enriching
        }
    }
}
