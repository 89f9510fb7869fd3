//! Value objects - Immutable objects defined by their attributes

pub(crate) mod affinity;
mod ids;
pub(crate) mod skill_effect;

pub use affinity::{AffinityTable, AffinityTriples};
pub use ids::*;
pub use skill_effect::{EffectFields, SkillEffect};
