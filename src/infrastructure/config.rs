//! Application configuration

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Ollama API base URL (OpenAI-compatible)
    pub ollama_base_url: String,
    /// Model used for character and affinity generation
    pub ollama_model: String,

    /// ComfyUI server URL
    pub comfyui_base_url: String,

    /// Content root served under `/static`; sprites go to `images/` inside it
    pub static_dir: PathBuf,
    /// JSON file holding the character pool
    pub character_file: PathBuf,
    /// Optional file replacing the built-in character-generation instructions
    pub character_prompt_path: Option<PathBuf>,

    /// HTTP server port
    pub server_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let static_dir =
            PathBuf::from(env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()));
        let character_file = env::var("CHARACTER_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| static_dir.join("characters.json"));

        Ok(Self {
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434/v1".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "qwen3:30b".to_string()),

            comfyui_base_url: env::var("COMFYUI_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8188".to_string()),

            static_dir,
            character_file,
            character_prompt_path: env::var("CHARACTER_PROMPT_PATH").ok().map(PathBuf::from),

            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
        })
    }

    /// Directory processed sprites are written to
    pub fn sprite_dir(&self) -> PathBuf {
        self.static_dir.join("images")
    }
}
