//! Affinity resolution through the text model

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::outbound::{
    AffinityError, AffinityQuery, AffinityResolverPort, LlmPort, LlmRequest,
};
use crate::application::services::llm::prompt_builder::{
    build_affinity_prompt, extract_json_object, AFFINITY_SYSTEM_PROMPT,
};
use crate::domain::value_objects::AffinityTriples;

/// Resolves affinity multipliers by asking the text model
pub struct LlmAffinityResolver<L: LlmPort> {
    llm: Arc<L>,
}

impl<L: LlmPort> LlmAffinityResolver<L> {
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl<L: LlmPort> AffinityResolverPort for LlmAffinityResolver<L> {
    async fn resolve(&self, query: &AffinityQuery) -> Result<AffinityTriples, AffinityError> {
        let request = LlmRequest::prompt(build_affinity_prompt(query))
            .with_system_prompt(AFFINITY_SYSTEM_PROMPT)
            .with_temperature(0.2);
        let response = self
            .llm
            .generate(request)
            .await
            .map_err(|e| AffinityError::RequestFailed(e.to_string()))?;

        let json = extract_json_object(&response.content).ok_or_else(|| {
            AffinityError::InvalidResponse("Response contained no JSON object".to_string())
        })?;
        let triples: AffinityTriples = serde_json::from_str(json)
            .map_err(|e| AffinityError::InvalidResponse(e.to_string()))?;

        debug!(
            player_vs_enemy = triples.player_vs_enemy.len(),
            enemy_vs_player = triples.enemy_vs_player.len(),
            tokens_used = response.tokens_used,
            "Resolved affinity triples"
        );
        Ok(triples)
    }
}
