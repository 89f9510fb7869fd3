//! Character Service - generates characters and manages the character pool
//!
//! Generation asks the text model for a character, validates it into a
//! [`CharacterRecord`], then renders a portrait and turns it into a pixel-art
//! sprite. Portrait failures never fail the character: the record is returned
//! without a sprite.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::dto::GeneratedCharacterDto;
use crate::application::ports::outbound::{
    CharacterPoolPort, ImageGenPort, ImageRequest, LlmPort, LlmRequest, PoolError,
    SpriteStorePort,
};
use crate::application::services::llm::prompt_builder::{
    build_character_prompt, build_portrait_prompt, extract_json_object,
    DEFAULT_CHARACTER_INSTRUCTIONS,
};
use crate::application::services::sprite_service::SpriteProcessor;
use crate::domain::entities::CharacterRecord;
use crate::domain::value_objects::CharacterId;

#[derive(Debug, thiserror::Error)]
pub enum CharacterServiceError {
    #[error("Character generation failed: {0}")]
    Generation(String),
    #[error("Character not found: {0}")]
    NotFound(CharacterId),
    #[error(transparent)]
    Pool(#[from] PoolError),
}

pub struct CharacterService<L, I, S, P>
where
    L: LlmPort,
    I: ImageGenPort,
    S: SpriteStorePort,
    P: CharacterPoolPort,
{
    llm: Arc<L>,
    image_gen: Arc<I>,
    sprites: Arc<S>,
    pool: Arc<P>,
    instructions: String,
    processor: SpriteProcessor,
}

impl<L, I, S, P> CharacterService<L, I, S, P>
where
    L: LlmPort + 'static,
    I: ImageGenPort + 'static,
    S: SpriteStorePort + 'static,
    P: CharacterPoolPort + 'static,
{
    pub fn new(llm: Arc<L>, image_gen: Arc<I>, sprites: Arc<S>, pool: Arc<P>) -> Self {
        Self {
            llm,
            image_gen,
            sprites,
            pool,
            instructions: DEFAULT_CHARACTER_INSTRUCTIONS.to_string(),
            processor: SpriteProcessor::default(),
        }
    }

    /// Replace the character-generation instructions
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Generate a character from a free-text description.
    ///
    /// The record is not added to the pool.
    #[instrument(skip(self, user_description))]
    pub async fn create_character(
        &self,
        user_description: &str,
    ) -> Result<CharacterRecord, CharacterServiceError> {
        let prompt = build_character_prompt(&self.instructions, user_description);
        let response = self
            .llm
            .generate(LlmRequest::prompt(prompt).with_temperature(0.9))
            .await
            .map_err(|e| CharacterServiceError::Generation(e.to_string()))?;

        debug!(
            model = %response.model,
            tokens_used = response.tokens_used,
            "Character model responded"
        );

        let record = parse_generated_character(&response.content)?;

        info!(
            character_id = %record.id,
            name = %record.name,
            character_type = %record.character_type,
            stat_total = record.stats.total(),
            effects = ?record.skills.iter().map(|s| s.visual_effect.kind()).collect::<Vec<_>>(),
            "Generated character"
        );

        match self.render_sprite(&record).await {
            Ok(Some(path)) => Ok(record.with_sprite(path)),
            Ok(None) => {
                warn!(character_id = %record.id, "Image backend returned no image");
                Ok(record)
            }
            Err(e) => {
                warn!(character_id = %record.id, error = %e, "Sprite generation failed");
                Ok(record)
            }
        }
    }

    /// Generate a character and add it to the pool
    pub async fn create_and_save(
        &self,
        user_description: &str,
    ) -> Result<CharacterRecord, CharacterServiceError> {
        let record = self.create_character(user_description).await?;
        let mut stored = self.pool.append(vec![record]).await?;
        stored
            .pop()
            .ok_or_else(|| CharacterServiceError::Generation("Pool stored nothing".to_string()))
    }

    pub async fn list_characters(&self) -> Result<Vec<CharacterRecord>, CharacterServiceError> {
        Ok(self.pool.list().await?)
    }

    pub async fn get_character(
        &self,
        id: CharacterId,
    ) -> Result<CharacterRecord, CharacterServiceError> {
        self.pool
            .get(id)
            .await?
            .ok_or(CharacterServiceError::NotFound(id))
    }

    /// Remove a character from the pool along with its sprite
    #[instrument(skip(self))]
    pub async fn delete_character(&self, id: CharacterId) -> Result<(), CharacterServiceError> {
        let removed = self
            .pool
            .delete(id)
            .await?
            .ok_or(CharacterServiceError::NotFound(id))?;

        if let Some(path) = removed.sprite_path.as_deref() {
            if let Err(e) = self.sprites.delete(path).await {
                warn!(character_id = %id, path, error = %e, "Failed to remove sprite");
            }
        }

        info!(character_id = %id, "Deleted character");
        Ok(())
    }

    async fn render_sprite(&self, record: &CharacterRecord) -> anyhow::Result<Option<String>> {
        let prompt = build_portrait_prompt(&record.name, &record.description);
        let Some(image) = self
            .image_gen
            .generate(ImageRequest::character_portrait(prompt))
            .await?
        else {
            return Ok(None);
        };

        let processor = self.processor;
        let png = tokio::task::spawn_blocking(move || processor.process_to_png(&image)).await??;

        let path = self.sprites.save_png(png).await?;
        debug!(character_id = %record.id, path = %path, "Stored sprite");
        Ok(Some(path))
    }
}

fn parse_generated_character(content: &str) -> Result<CharacterRecord, CharacterServiceError> {
    let json = extract_json_object(content).ok_or_else(|| {
        CharacterServiceError::Generation("Model response contained no JSON object".to_string())
    })?;

    let dto: GeneratedCharacterDto = serde_json::from_str(json).map_err(|e| {
        CharacterServiceError::Generation(format!("Malformed character JSON: {}", e))
    })?;

    dto.into_record().map_err(CharacterServiceError::Generation)
}
