//! Application services - Use case implementations
//!
//! Services depend only on outbound ports, so the infrastructure layer decides
//! which model backends and stores are plugged in.

pub mod affinity_service;
pub mod character_service;
pub mod llm;
pub mod run_service;
pub mod sprite_service;

pub use affinity_service::LlmAffinityResolver;
pub use character_service::{CharacterService, CharacterServiceError};
pub use run_service::{RunError, RunRegistry, RunService, SharedRunRegistry};
