//! Sprite store port - where processed sprites are written

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum SpriteStoreError {
    #[error("Sprite I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Sprite path is outside the content directory: {0}")]
    ForeignPath(String),
}

#[async_trait]
pub trait SpriteStorePort: Send + Sync {
    /// Store PNG bytes under a fresh unique filename, returning its web path
    async fn save_png(&self, png: Vec<u8>) -> Result<String, SpriteStoreError>;

    /// Remove a previously stored sprite by web path
    async fn delete(&self, web_path: &str) -> Result<(), SpriteStoreError>;
}
