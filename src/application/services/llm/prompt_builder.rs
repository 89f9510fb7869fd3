//! Prompt building functions for LLM and image requests

use crate::application::ports::outbound::AffinityQuery;

/// Default instructions for character generation.
///
/// Can be replaced at startup with the file named by `CHARACTER_PROMPT_PATH`.
pub const DEFAULT_CHARACTER_INSTRUCTIONS: &str = r##"You are the character designer for a pixel-art roguelike battler.
Turn the player's description into ONE character and answer with a single JSON object, no prose and no markdown.

Schema:
{
  "character_name": string,
  "description": string (one or two sentences about looks and personality),
  "stats": { "hp": int, "atk": int, "def": int, "sp_atk": int, "sp_def": int, "speed": int },
  "character_type": string (a single elemental type such as "Fire", "Water", "Grass", "Electric", "Shadow"),
  "skills": [ exactly 4 objects:
    {
      "skill_name": string,
      "description": string,
      "base_power": int (0-150),
      "damage_type": "Physical" | "Special" | "Status",
      "skill_type": string (an elemental type),
      "visual_effect_type": "Shake" | "Projectile" | "Laser",
      "shake_effect": { "particle_color": "#RRGGBB" } or null,
      "projectile_effect": { "shape": "Circle" | "Square" | "Triangle" | "Star", "count": int (1-10), "color": "#RRGGBB" } or null,
      "laser_effect": { "origin": "Caster" | "Above" | "Below", "thickness": int (1-10), "color": "#RRGGBB" } or null
    }
  ]
}

Rules:
- Stats are non-negative integers and should total about 500.
- Fill only the effect object that matches visual_effect_type; the other two are null."##;

/// Full character-generation prompt: instructions followed by the user's text
pub fn build_character_prompt(instructions: &str, user_description: &str) -> String {
    format!("{}\n\n### [User Input]\n{}", instructions.trim_end(), user_description.trim())
}

/// Text-to-image prompt for a character portrait
pub fn build_portrait_prompt(name: &str, description: &str) -> String {
    format!(
        "A full body character portrait of a {}, {}, fantasy art style, detailed, vibrant colors, white background, 1:1 aspect ratio",
        name, description
    )
}

/// System prompt for affinity resolution
pub const AFFINITY_SYSTEM_PROMPT: &str = "You balance type matchups for a roguelike battler. \
For every attacker type and defender type pair you are given, give the damage multiplier of the \
attack (0.5 = not very effective, 1.0 = neutral, 2.0 = super effective). Invent sensible matchups \
for unusual types.";

/// Prompt asking for the affinity multipliers of one floor
pub fn build_affinity_prompt(query: &AffinityQuery) -> String {
    let mut prompt = String::new();

    prompt.push_str("PLAYER ATTACKS\n");
    prompt.push_str(&format!(
        "Attacker types: {}\n",
        join_tags(&query.player_skill_types)
    ));
    prompt.push_str(&format!(
        "Defender types: {}\n\n",
        join_tags(&query.enemy_character_types)
    ));

    prompt.push_str("ENEMY ATTACKS\n");
    prompt.push_str(&format!(
        "Attacker types: {}\n",
        join_tags(&query.enemy_skill_types)
    ));
    prompt.push_str(&format!(
        "Defender types: {}\n\n",
        join_tags(&query.player_character_types)
    ));

    prompt.push_str(
        "Answer with a single JSON object and nothing else:\n\
         {\"player_vs_enemy\": [{\"attacker\": string, \"defender\": string, \"multiplier\": number}], \
         \"enemy_vs_player\": [{\"attacker\": string, \"defender\": string, \"multiplier\": number}]}",
    );

    prompt
}

fn join_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        "(none)".to_string()
    } else {
        tags.join(", ")
    }
}

/// Pull the JSON object out of a model reply.
///
/// Strips markdown code fences and any text around the outermost braces.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if start >= end {
        return None;
    }
    Some(&response[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_character_prompt() {
        let prompt = build_character_prompt("INSTRUCTIONS\n", "  a grumpy fire wizard ");

        assert!(prompt.starts_with("INSTRUCTIONS\n\n### [User Input]\n"));
        assert!(prompt.ends_with("a grumpy fire wizard"));
    }

    #[test]
    fn test_default_instructions_carry_full_schema() {
        let prompt = build_character_prompt(DEFAULT_CHARACTER_INSTRUCTIONS, "a storm hawk");

        assert!(prompt.contains(r##""shake_effect": { "particle_color": "#RRGGBB" } or null"##));
        assert!(prompt.contains(r#""laser_effect": { "origin""#));
        assert!(prompt.contains("the other two are null.\n\n### [User Input]\na storm hawk"));
    }

    #[test]
    fn test_build_portrait_prompt() {
        let prompt = build_portrait_prompt("Ember", "a small fire sprite");

        assert!(
            prompt.starts_with("A full body character portrait of a Ember, a small fire sprite")
        );
        assert!(prompt.contains("white background"));
    }

    #[test]
    fn test_build_affinity_prompt_lists_both_directions() {
        let query = AffinityQuery {
            player_skill_types: vec!["Fire".to_string(), "Water".to_string()],
            enemy_character_types: vec!["Grass".to_string()],
            enemy_skill_types: vec!["Poison".to_string()],
            player_character_types: vec![],
        };

        let prompt = build_affinity_prompt(&query);

        assert!(prompt.contains("Attacker types: Fire, Water"));
        assert!(prompt.contains("Defender types: Grass"));
        assert!(prompt.contains("Attacker types: Poison"));
        assert!(prompt.contains("Defender types: (none)"));
        assert!(prompt.contains("player_vs_enemy"));
    }

    #[test]
    fn test_extract_json_object_strips_fences() {
        let response = "```json\n{\"a\": {\"b\": 1}}\n```";
        assert_eq!(extract_json_object(response), Some("{\"a\": {\"b\": 1}}"));

        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }
}
