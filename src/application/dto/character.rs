//! Character DTOs - model output and HTTP request bodies

use serde::{Deserialize, Serialize};

use crate::domain::entities::{CharacterRecord, Skill, StatBlock, SKILLS_PER_CHARACTER};
use crate::domain::value_objects::{EffectFields, SkillEffect};

/// Request body for character generation
#[derive(Debug, Deserialize)]
pub struct CreateCharacterRequestDto {
    pub user_prompt: String,
}

/// Plain acknowledgement body
#[derive(Debug, Serialize)]
pub struct MessageResponseDto {
    pub message: String,
}

/// Character JSON as produced by the text model.
///
/// Effects arrive as a `visual_effect_type` discriminator plus three nullable
/// payload objects; [`GeneratedCharacterDto::into_record`] collapses them into
/// a single [`SkillEffect`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratedCharacterDto {
    pub character_name: String,
    pub description: String,
    pub stats: StatBlock,
    pub character_type: String,
    pub skills: Vec<GeneratedSkillDto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratedSkillDto {
    pub skill_name: String,
    pub description: String,
    pub base_power: i32,
    pub damage_type: String,
    pub skill_type: String,
    #[serde(flatten)]
    pub effect: EffectFields,
}

impl GeneratedCharacterDto {
    /// Validate the generated fields and build a record with a fresh identifier
    pub fn into_record(self) -> Result<CharacterRecord, String> {
        if self.character_name.trim().is_empty() {
            return Err("Character name is empty".to_string());
        }
        if self.character_type.trim().is_empty() {
            return Err("Character type is empty".to_string());
        }

        let skill_count = self.skills.len();
        let skills = self
            .skills
            .into_iter()
            .map(GeneratedSkillDto::into_skill)
            .collect::<Result<Vec<_>, _>>()?;
        let skills: [Skill; SKILLS_PER_CHARACTER] = skills.try_into().map_err(|_| {
            format!(
                "Expected {} skills, got {}",
                SKILLS_PER_CHARACTER, skill_count
            )
        })?;

        Ok(CharacterRecord::new(
            self.character_name.trim(),
            self.description.trim(),
            self.stats,
            self.character_type.trim(),
            skills,
        ))
    }
}

impl GeneratedSkillDto {
    fn into_skill(self) -> Result<Skill, String> {
        let visual_effect = SkillEffect::try_from(self.effect)
            .map_err(|e| format!("Skill {:?}: {}", self.skill_name, e))?;

        Ok(Skill {
            name: self.skill_name,
            description: self.description,
            power: self.base_power,
            damage_type: self.damage_type,
            skill_type: self.skill_type,
            visual_effect,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::skill_effect::ProjectileShape;
    use serde_json::json;

    fn skill_json(effect_type: &str) -> serde_json::Value {
        json!({
            "skill_name": format!("{} Skill", effect_type),
            "description": "Hits hard",
            "base_power": 60,
            "damage_type": "Special",
            "skill_type": "Fire",
            "visual_effect_type": effect_type,
            "shake_effect": {"particle_color": "#FF0000"},
            "projectile_effect": {"shape": "star", "count": 3, "color": "00ff00"},
            "laser_effect": {"origin": "Caster", "thickness": 99, "color": "#0000FF"}
        })
    }

    fn character_json(skills: Vec<serde_json::Value>) -> serde_json::Value {
        json!({
            "character_name": "Ember",
            "description": "A tiny fire spirit",
            "stats": {"hp": 80, "atk": 60, "def": 50, "sp_atk": 120, "sp_def": 70, "speed": 120},
            "character_type": "Fire",
            "skills": skills
        })
    }

    #[test]
    fn test_into_record_builds_tagged_effects() {
        let dto: GeneratedCharacterDto = serde_json::from_value(character_json(vec![
            skill_json("Shake"),
            skill_json("Projectile"),
            skill_json("laser"),
            skill_json("Shake"),
        ]))
        .unwrap();

        let record = dto.into_record().unwrap();

        assert_eq!(record.name, "Ember");
        assert_eq!(record.stats.defense, 50);
        assert!(record.sprite_path.is_none());
        assert!(matches!(record.skills[0].visual_effect, SkillEffect::Shake { .. }));
        match &record.skills[1].visual_effect {
            SkillEffect::Projectile { shape, count, color } => {
                assert_eq!(*shape, ProjectileShape::Star);
                assert_eq!(*count, 3);
                assert_eq!(color.as_str(), "#00FF00");
            }
            other => panic!("Expected projectile, got {:?}", other),
        }
        match &record.skills[2].visual_effect {
            SkillEffect::Laser { thickness, .. } => assert_eq!(*thickness, 10),
            other => panic!("Expected laser, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_skill_count_is_rejected() {
        let dto: GeneratedCharacterDto =
            serde_json::from_value(character_json(vec![skill_json("Shake"); 3])).unwrap();

        let err = dto.into_record().unwrap_err();
        assert!(err.contains("Expected 4 skills, got 3"));
    }

    #[test]
    fn test_missing_payload_is_rejected() {
        let mut skill = skill_json("Laser");
        skill["laser_effect"] = serde_json::Value::Null;
        let skills = vec![
            skill,
            skill_json("Shake"),
            skill_json("Shake"),
            skill_json("Shake"),
        ];
        let dto: GeneratedCharacterDto = serde_json::from_value(character_json(skills)).unwrap();

        assert!(dto.into_record().unwrap_err().contains("laser_effect"));
    }

    #[test]
    fn test_bad_color_is_rejected() {
        let mut skill = skill_json("Shake");
        skill["shake_effect"]["particle_color"] = json!("crimson");
        let dto: GeneratedCharacterDto =
            serde_json::from_value(character_json(vec![skill; 4])).unwrap();

        assert!(dto.into_record().is_err());
    }

    #[test]
    fn test_negative_stat_fails_to_parse() {
        let mut value = character_json(vec![skill_json("Shake"); 4]);
        value["stats"]["hp"] = json!(-5);

        assert!(serde_json::from_value::<GeneratedCharacterDto>(value).is_err());
    }
}
