//! Data Transfer Objects - For API boundaries
//!
//! DTOs live in the application layer so infrastructure (HTTP) and the model
//! adapters can serialize/deserialize wire shapes without bending the domain
//! model around them.

pub mod character;
pub mod run;

pub use character::*;
pub use run::*;
