//! Outbound ports - Interfaces that the application requires from external systems

mod affinity_port;
mod character_pool_port;
mod image_gen_port;
mod llm_port;
mod sprite_store_port;

pub use affinity_port::{AffinityError, AffinityQuery, AffinityResolverPort};
pub use character_pool_port::{CharacterPoolPort, PoolError};
pub use image_gen_port::{ImageGenError, ImageGenPort, ImageRequest};
pub use llm_port::{ChatMessage, LlmError, LlmPort, LlmRequest, LlmResponse};
pub use sprite_store_port::{SpriteStoreError, SpriteStorePort};
