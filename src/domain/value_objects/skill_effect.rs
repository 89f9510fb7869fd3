//! Skill visual effects - exactly one effect payload per skill

use serde::{Deserialize, Serialize};

pub const MIN_PROJECTILE_COUNT: u8 = 1;
pub const MAX_PROJECTILE_COUNT: u8 = 10;
pub const MIN_LASER_THICKNESS: u8 = 1;
pub const MAX_LASER_THICKNESS: u8 = 10;

/// Visual effect played when a skill is used
///
/// On the wire a skill carries `visual_effect_type` plus three nullable
/// payload objects (see [`EffectFields`]); only the selected one is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EffectFields", into = "EffectFields")]
pub enum SkillEffect {
    /// Screen shake with a particle burst
    Shake { particle_color: HexColor },
    /// Projectiles fired from the caster at the target
    Projectile {
        shape: ProjectileShape,
        count: u8,
        color: HexColor,
    },
    /// A beam between origin and target
    Laser {
        origin: LaserOrigin,
        thickness: u8,
        color: HexColor,
    },
}

impl SkillEffect {
    /// Projectile effect with `count` clamped into the supported range
    pub fn projectile(shape: ProjectileShape, count: i64, color: HexColor) -> Self {
        Self::Projectile {
            shape,
            count: clamp_u8(count, MIN_PROJECTILE_COUNT, MAX_PROJECTILE_COUNT),
            color,
        }
    }

    /// Laser effect with `thickness` clamped into the supported range
    pub fn laser(origin: LaserOrigin, thickness: i64, color: HexColor) -> Self {
        Self::Laser {
            origin,
            thickness: clamp_u8(thickness, MIN_LASER_THICKNESS, MAX_LASER_THICKNESS),
            color,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Shake { .. } => "Shake",
            Self::Projectile { .. } => "Projectile",
            Self::Laser { .. } => "Laser",
        }
    }
}

fn clamp_u8(value: i64, min: u8, max: u8) -> u8 {
    value.clamp(min as i64, max as i64) as u8
}

/// Flat effect fields shared by generated characters and the pool file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectFields {
    pub visual_effect_type: String,
    #[serde(default)]
    pub shake_effect: Option<ShakePayload>,
    #[serde(default)]
    pub projectile_effect: Option<ProjectilePayload>,
    #[serde(default)]
    pub laser_effect: Option<LaserPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShakePayload {
    pub particle_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectilePayload {
    pub shape: String,
    pub count: i64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaserPayload {
    pub origin: String,
    pub thickness: i64,
    pub color: String,
}

impl TryFrom<EffectFields> for SkillEffect {
    type Error = String;

    /// Case-insensitive on the effect type, shape and origin; clamps counts.
    /// Payloads other than the selected one are ignored.
    fn try_from(fields: EffectFields) -> Result<Self, Self::Error> {
        let kind = fields.visual_effect_type.trim().to_ascii_lowercase();
        match kind.as_str() {
            "shake" => {
                let effect = fields.shake_effect.ok_or_else(|| missing_payload("shake_effect"))?;
                Ok(Self::Shake {
                    particle_color: HexColor::parse(&effect.particle_color)?,
                })
            }
            "projectile" => {
                let effect = fields
                    .projectile_effect
                    .ok_or_else(|| missing_payload("projectile_effect"))?;
                let shape = ProjectileShape::parse(&effect.shape)
                    .ok_or_else(|| format!("Unknown projectile shape: {:?}", effect.shape))?;
                Ok(Self::projectile(shape, effect.count, HexColor::parse(&effect.color)?))
            }
            "laser" => {
                let effect = fields.laser_effect.ok_or_else(|| missing_payload("laser_effect"))?;
                let origin = LaserOrigin::parse(&effect.origin)
                    .ok_or_else(|| format!("Unknown laser origin: {:?}", effect.origin))?;
                Ok(Self::laser(origin, effect.thickness, HexColor::parse(&effect.color)?))
            }
            _ => Err(format!(
                "Unknown visual effect type: {:?}",
                fields.visual_effect_type
            )),
        }
    }
}

impl From<SkillEffect> for EffectFields {
    fn from(effect: SkillEffect) -> Self {
        let mut fields = EffectFields {
            visual_effect_type: effect.kind().to_string(),
            ..Default::default()
        };
        match effect {
            SkillEffect::Shake { particle_color } => {
                fields.shake_effect = Some(ShakePayload {
                    particle_color: particle_color.into(),
                });
            }
            SkillEffect::Projectile {
                shape,
                count,
                color,
            } => {
                fields.projectile_effect = Some(ProjectilePayload {
                    shape: shape.as_str().to_string(),
                    count: i64::from(count),
                    color: color.into(),
                });
            }
            SkillEffect::Laser {
                origin,
                thickness,
                color,
            } => {
                fields.laser_effect = Some(LaserPayload {
                    origin: origin.as_str().to_string(),
                    thickness: i64::from(thickness),
                    color: color.into(),
                });
            }
        }
        fields
    }
}

fn missing_payload(field: &str) -> String {
    format!("Selected effect has no {} payload", field)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileShape {
    Circle,
    Square,
    Triangle,
    Star,
}

impl ProjectileShape {
    /// Case-insensitive parse of a generated shape name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "circle" | "orb" | "ball" => Some(Self::Circle),
            "square" | "cube" => Some(Self::Square),
            "triangle" | "arrow" | "shard" => Some(Self::Triangle),
            "star" => Some(Self::Star),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Circle => "Circle",
            Self::Square => "Square",
            Self::Triangle => "Triangle",
            Self::Star => "Star",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaserOrigin {
    Caster,
    Above,
    Below,
}

impl LaserOrigin {
    /// Case-insensitive parse of a generated origin name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "caster" | "self" | "user" | "hand" | "eyes" => Some(Self::Caster),
            "above" | "sky" | "top" => Some(Self::Above),
            "below" | "ground" | "bottom" => Some(Self::Below),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Caster => "Caster",
            Self::Above => "Above",
            Self::Below => "Below",
        }
    }
}

/// A `#RRGGBB` color
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse `#RRGGBB` or `RRGGBB`, normalizing to upper-case with a leading `#`
    pub fn parse(s: &str) -> Result<Self, String> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("Invalid hex color: {:?}", s));
        }
        Ok(Self(format!("#{}", digits.to_ascii_uppercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
