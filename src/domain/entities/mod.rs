//! Domain entities - Core business objects with identity

pub(crate) mod character;
mod run;

pub use character::{CharacterRecord, Skill, StatBlock, SKILLS_PER_CHARACTER};
pub use run::{FloorAppendError, RunSession, RunStatus, FLOORS_PER_RUN};
