//! Domain layer - Core game model with no I/O
//!
//! This layer contains:
//! - Entities: CharacterRecord, RunSession
//! - Value Objects: identifiers, skill effects, affinity tables

pub mod entities;
pub mod value_objects;
