//! JSON-file character pool
//!
//! The whole pool lives in one JSON array that is rewritten on every change.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::application::ports::outbound::{CharacterPoolPort, PoolError};
use crate::domain::entities::CharacterRecord;
use crate::domain::value_objects::CharacterId;

pub struct JsonCharacterPool {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl JsonCharacterPool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pool contents for reads. A file that does not parse reads as empty.
    async fn load(&self) -> Result<Vec<CharacterRecord>, PoolError> {
        match self.load_for_update().await {
            Err(PoolError::Serialization(e)) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Character pool file is corrupt, treating as empty"
                );
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Pool contents before a rewrite.
    ///
    /// A missing or blank file is an empty pool. A file that does not parse
    /// is an error so that it is never overwritten.
    async fn load_for_update(&self) -> Result<Vec<CharacterRecord>, PoolError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_str(&raw)?)
    }

    async fn save(&self, records: &[CharacterRecord]) -> Result<(), PoolError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), count = records.len(), "Saved character pool");
        Ok(())
    }
}

#[async_trait]
impl CharacterPoolPort for JsonCharacterPool {
    async fn list(&self) -> Result<Vec<CharacterRecord>, PoolError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn get(&self, id: CharacterId) -> Result<Option<CharacterRecord>, PoolError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|r| r.id == id))
    }

    async fn append(
        &self,
        records: Vec<CharacterRecord>,
    ) -> Result<Vec<CharacterRecord>, PoolError> {
        let _guard = self.lock.lock().await;
        let stored: Vec<CharacterRecord> = records
            .into_iter()
            .map(CharacterRecord::with_new_id)
            .collect();
        if stored.is_empty() {
            return Ok(stored);
        }

        let mut pool = self.load_for_update().await?;
        pool.extend(stored.iter().cloned());
        self.save(&pool).await?;
        Ok(stored)
    }

    async fn delete(&self, id: CharacterId) -> Result<Option<CharacterRecord>, PoolError> {
        let _guard = self.lock.lock().await;
        let mut pool = self.load_for_update().await?;
        let Some(index) = pool.iter().position(|r| r.id == id) else {
            return Ok(None);
        };

        let removed = pool.remove(index);
        self.save(&pool).await?;
        Ok(Some(removed))
    }
}
