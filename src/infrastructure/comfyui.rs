//! ComfyUI image generation client
//!
//! Queues a text-to-image workflow, polls its history until it completes and
//! downloads the first output image.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::debug;

use crate::application::ports::outbound::{ImageGenError, ImageGenPort, ImageRequest};

const MAX_ATTEMPTS: u32 = 120;
const POLL_INTERVAL: Duration = Duration::from_secs(1);

const DEFAULT_NEGATIVE_PROMPT: &str =
    "bad quality, blurry, ugly, cropped, multiple characters, text";

/// Client for ComfyUI API
#[derive(Clone)]
pub struct ComfyUIClient {
    client: Client,
    base_url: String,
    checkpoint: String,
}

impl ComfyUIClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            checkpoint: "v1-5-pruned-emaonly.ckpt".to_string(),
        }
    }

    /// Queue a workflow for execution
    async fn queue_prompt(
        &self,
        workflow: serde_json::Value,
    ) -> Result<QueueResponse, ImageGenError> {
        let request = QueuePromptRequest {
            prompt: workflow,
            client_id: uuid::Uuid::new_v4().to_string(),
        };

        let response = self
            .client
            .post(format!("{}/prompt", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ImageGenError::GenerationFailed(error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))
    }

    async fn get_history(&self, prompt_id: &str) -> Result<HistoryResponse, ImageGenError> {
        let response = self
            .client
            .get(format!("{}/history/{}", self.base_url, prompt_id))
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ImageGenError::GenerationFailed(error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))
    }

    async fn get_image(&self, image: &ImageOutput) -> Result<Vec<u8>, ImageGenError> {
        let response = self
            .client
            .get(format!("{}/view", self.base_url))
            .query(&[
                ("filename", image.filename.as_str()),
                ("subfolder", image.subfolder.as_str()),
                ("type", image.r#type.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ImageGenError::GenerationFailed(error_text));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))
    }

    /// Poll until the prompt completes, returning its first image if any
    async fn wait_for_completion(
        &self,
        prompt_id: &str,
    ) -> Result<Option<ImageOutput>, ImageGenError> {
        for _ in 0..MAX_ATTEMPTS {
            let history = self.get_history(prompt_id).await?;

            if let Some(prompt_history) = history.prompts.get(prompt_id) {
                if prompt_history.status.completed {
                    return Ok(prompt_history.first_image().cloned());
                }
            }

            sleep(POLL_INTERVAL).await;
        }

        Err(ImageGenError::TimedOut(MAX_ATTEMPTS))
    }

    fn build_workflow(&self, request: &ImageRequest) -> serde_json::Value {
        serde_json::json!({
            "3": {
                "inputs": {
                    "seed": rand::random::<u32>(),
                    "steps": 20,
                    "cfg": 8.0,
                    "sampler_name": "euler",
                    "scheduler": "normal",
                    "denoise": 1.0,
                    "model": ["4", 0],
                    "positive": ["6", 0],
                    "negative": ["7", 0],
                    "latent_image": ["5", 0]
                },
                "class_type": "KSampler"
            },
            "4": {
                "inputs": {
                    "ckpt_name": self.checkpoint
                },
                "class_type": "CheckpointLoaderSimple"
            },
            "5": {
                "inputs": {
                    "width": request.width,
                    "height": request.height,
                    "batch_size": 1
                },
                "class_type": "EmptyLatentImage"
            },
            "6": {
                "inputs": {
                    "text": request.prompt,
                    "clip": ["4", 1]
                },
                "class_type": "CLIPTextEncode"
            },
            "7": {
                "inputs": {
                    "text": request.negative_prompt.as_deref().unwrap_or(DEFAULT_NEGATIVE_PROMPT),
                    "clip": ["4", 1]
                },
                "class_type": "CLIPTextEncode"
            },
            "8": {
                "inputs": {
                    "samples": ["3", 0],
                    "vae": ["4", 2]
                },
                "class_type": "VAEDecode"
            },
            "9": {
                "inputs": {
                    "filename_prefix": "airogue",
                    "images": ["8", 0]
                },
                "class_type": "SaveImage"
            }
        })
    }
}

#[async_trait]
impl ImageGenPort for ComfyUIClient {
    async fn generate(&self, request: ImageRequest) -> Result<Option<Vec<u8>>, ImageGenError> {
        let workflow = self.build_workflow(&request);
        let queued = self.queue_prompt(workflow).await?;
        debug!(prompt_id = %queued.prompt_id, "Queued portrait workflow");

        match self.wait_for_completion(&queued.prompt_id).await? {
            Some(image) => self.get_image(&image).await.map(Some),
            None => Ok(None),
        }
    }
}

// =============================================================================
// ComfyUI API types
// =============================================================================

#[derive(Debug, Serialize)]
struct QueuePromptRequest {
    prompt: serde_json::Value,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    prompt_id: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(flatten)]
    prompts: HashMap<String, PromptHistory>,
}

#[derive(Debug, Deserialize)]
struct PromptHistory {
    #[serde(default)]
    outputs: HashMap<String, NodeOutput>,
    status: PromptStatus,
}

impl PromptHistory {
    fn first_image(&self) -> Option<&ImageOutput> {
        self.outputs
            .values()
            .filter_map(|output| output.images.as_ref())
            .find_map(|images| images.first())
    }
}

#[derive(Debug, Deserialize)]
struct NodeOutput {
    #[serde(default)]
    images: Option<Vec<ImageOutput>>,
}

#[derive(Debug, Deserialize)]
struct PromptStatus {
    #[serde(default)]
    completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ImageOutput {
    filename: String,
    #[serde(default)]
    subfolder: String,
    r#type: String,
}
