//! Affinity resolver port - type-vs-type multipliers for one floor

use async_trait::async_trait;

use crate::domain::value_objects::AffinityTriples;

#[derive(Debug, thiserror::Error)]
pub enum AffinityError {
    #[error("Affinity request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid affinity response: {0}")]
    InvalidResponse(String),
}

/// Type tags involved in one floor's encounter
///
/// Player attacks resolve `player_skill_types` against
/// `enemy_character_types`; enemy attacks resolve `enemy_skill_types` against
/// `player_character_types`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffinityQuery {
    pub player_skill_types: Vec<String>,
    pub enemy_character_types: Vec<String>,
    pub enemy_skill_types: Vec<String>,
    pub player_character_types: Vec<String>,
}

/// Port for resolving affinity multipliers
#[async_trait]
pub trait AffinityResolverPort: Send + Sync {
    async fn resolve(&self, query: &AffinityQuery) -> Result<AffinityTriples, AffinityError>;
}
