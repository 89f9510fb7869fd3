//! File-backed persistence adapters

mod character_pool_repository;
mod sprite_storage;

pub use character_pool_repository::JsonCharacterPool;
pub use sprite_storage::LocalSpriteStore;
