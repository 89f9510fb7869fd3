//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: JSON character pool and sprite files
//! - HTTP: REST API routes and static content
//! - Ollama: text model used for characters and affinities
//! - ComfyUI: portrait generation
//! - Config and shared application state

pub mod comfyui;
pub mod config;
pub mod http;
pub mod ollama;
pub mod persistence;
pub mod state;
