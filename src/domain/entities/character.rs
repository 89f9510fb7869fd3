//! Character entity - generated fighters with stats, a type and four skills

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CharacterId, SkillEffect};

/// Number of skills every character carries
pub const SKILLS_PER_CHARACTER: usize = 4;

/// A generated character
///
/// Records are immutable once assembled. The only change a record ever sees is
/// a fresh identifier when it is written into the long-lived character pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: CharacterId,
    #[serde(rename = "character_name")]
    pub name: String,
    pub description: String,
    pub stats: StatBlock,
    pub character_type: String,
    pub skills: [Skill; SKILLS_PER_CHARACTER],
    /// Web path of the processed sprite, if one was generated
    #[serde(rename = "image_url", default)]
    pub sprite_path: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl CharacterRecord {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        stats: StatBlock,
        character_type: impl Into<String>,
        skills: [Skill; SKILLS_PER_CHARACTER],
    ) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            description: description.into(),
            stats,
            character_type: character_type.into(),
            skills,
            sprite_path: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_sprite(mut self, sprite_path: impl Into<String>) -> Self {
        self.sprite_path = Some(sprite_path.into());
        self
    }

    /// The same record under a newly minted identifier
    pub fn with_new_id(mut self) -> Self {
        self.id = CharacterId::new();
        self
    }

    /// Skill-type tags of this character's skills, in skill order
    pub fn skill_types(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(|s| s.skill_type.as_str())
    }
}

/// Six-stat block; no sum invariant is enforced here
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub hp: u32,
    pub atk: u32,
    #[serde(rename = "def")]
    pub defense: u32,
    pub sp_atk: u32,
    pub sp_def: u32,
    pub speed: u32,
}

impl StatBlock {
    /// Sum of all six stats, widened so any combination fits
    pub fn total(&self) -> u64 {
        [
            self.hp,
            self.atk,
            self.defense,
            self.sp_atk,
            self.sp_def,
            self.speed,
        ]
        .into_iter()
        .map(u64::from)
        .sum()
    }
}

/// A character skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(rename = "skill_name")]
    pub name: String,
    pub description: String,
    #[serde(rename = "base_power")]
    pub power: i32,
    pub damage_type: String,
    /// Elemental type tag used for affinity lookups
    pub skill_type: String,
    #[serde(flatten)]
    pub visual_effect: SkillEffect,
}
