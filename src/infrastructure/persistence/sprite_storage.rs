//! Local filesystem sprite store

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::ports::outbound::{SpriteStoreError, SpriteStorePort};

/// Writes sprites into a directory that is served under `url_prefix`
pub struct LocalSpriteStore {
    dir: PathBuf,
    url_prefix: String,
}

impl LocalSpriteStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Map a web path back to a file inside the sprite directory
    fn resolve(&self, web_path: &str) -> Result<PathBuf, SpriteStoreError> {
        let file_name = web_path
            .strip_prefix(&self.url_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && !name.contains(".."))
            .ok_or_else(|| SpriteStoreError::ForeignPath(web_path.to_string()))?;
        Ok(self.dir.join(file_name))
    }
}

#[async_trait]
impl SpriteStorePort for LocalSpriteStore {
    async fn save_png(&self, png: Vec<u8>) -> Result<String, SpriteStoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = format!("image_{}.png", Uuid::new_v4());
        tokio::fs::write(self.dir.join(&file_name), png).await?;

        Ok(format!("{}/{}", self.url_prefix, file_name))
    }

    async fn delete(&self, web_path: &str) -> Result<(), SpriteStoreError> {
        let path = self.resolve(web_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
