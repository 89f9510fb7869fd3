//! Image generation port - Interface for text-to-image backends

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ImageGenError {
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("Generation timed out after {0} polls")]
    TimedOut(u32),
}

/// Parameters for a single image
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl ImageRequest {
    /// Square request sized for a character portrait
    pub fn character_portrait(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: None,
            width: 1024,
            height: 1024,
        }
    }
}

/// Port for image generation
#[async_trait]
pub trait ImageGenPort: Send + Sync {
    /// Generate an image, returning its encoded bytes.
    ///
    /// `Ok(None)` means the backend finished without producing an image.
    async fn generate(&self, request: ImageRequest) -> Result<Option<Vec<u8>>, ImageGenError>;
}
