//! Shared application state

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::RwLock;

use crate::application::services::{
    CharacterService, LlmAffinityResolver, RunRegistry, RunService, SharedRunRegistry,
};
use crate::infrastructure::comfyui::ComfyUIClient;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::ollama::OllamaClient;
use crate::infrastructure::persistence::{JsonCharacterPool, LocalSpriteStore};

pub type AppCharacterService =
    CharacterService<OllamaClient, ComfyUIClient, LocalSpriteStore, JsonCharacterPool>;
pub type AppRunService = RunService<JsonCharacterPool, LlmAffinityResolver<OllamaClient>>;

/// URL prefix the content root is served under
pub const STATIC_URL_PREFIX: &str = "/static";

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub character_service: AppCharacterService,
    pub run_service: AppRunService,
    /// Active runs, dropped on shutdown
    pub runs: SharedRunRegistry,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let llm_client = Arc::new(OllamaClient::new(&config.ollama_base_url, &config.ollama_model));
        let comfyui_client = Arc::new(ComfyUIClient::new(&config.comfyui_base_url));

        let pool = Arc::new(JsonCharacterPool::new(config.character_file.clone()));
        let sprites = Arc::new(LocalSpriteStore::new(
            config.sprite_dir(),
            &format!("{}/images", STATIC_URL_PREFIX),
        ));

        let mut character_service = CharacterService::new(
            Arc::clone(&llm_client),
            comfyui_client,
            sprites,
            Arc::clone(&pool),
        );
        if let Some(path) = &config.character_prompt_path {
            let instructions = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read character prompt {}", path.display()))?;
            character_service = character_service.with_instructions(instructions);
        }

        let runs: SharedRunRegistry = Arc::new(RwLock::new(RunRegistry::new()));
        let resolver = Arc::new(LlmAffinityResolver::new(llm_client));
        let run_service = RunService::new(pool, resolver, Arc::clone(&runs));

        Ok(Self {
            config,
            character_service,
            run_service,
            runs,
        })
    }
}
