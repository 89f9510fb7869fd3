//! Character pool port - long-lived store of characters eligible as enemies

use async_trait::async_trait;

use crate::domain::entities::CharacterRecord;
use crate::domain::value_objects::CharacterId;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("Pool I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Pool serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Repository port for the character pool
#[async_trait]
pub trait CharacterPoolPort: Send + Sync {
    /// All characters in the pool
    async fn list(&self) -> Result<Vec<CharacterRecord>, PoolError>;

    /// Look up a single character
    async fn get(&self, id: CharacterId) -> Result<Option<CharacterRecord>, PoolError>;

    /// Append records, minting a fresh identifier for each.
    ///
    /// Returns the records as stored. The write has completed when this returns.
    async fn append(
        &self,
        records: Vec<CharacterRecord>,
    ) -> Result<Vec<CharacterRecord>, PoolError>;

    /// Remove a character, returning it if it existed
    async fn delete(&self, id: CharacterId) -> Result<Option<CharacterRecord>, PoolError>;
}
