//! Character stats per main skill

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ports::CharacterCatalog;

/// Defence skills a player can pick as main skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Defence {
    Desensitisation,
    /// Fastest movement, also the fallback character
    Deflection,
    Introjection,
    Projection,
    Retroflection,
    Egotism,
    Confluence,
}

impl Defence {
    pub fn from_skill(skill: i32) -> Option<Self> {
        match skill {
            1 => Some(Defence::Desensitisation),
            2 => Some(Defence::Deflection),
            3 => Some(Defence::Introjection),
            4 => Some(Defence::Projection),
            5 => Some(Defence::Retroflection),
            6 => Some(Defence::Egotism),
            7 => Some(Defence::Confluence),
            _ => None,
        }
    }
}

/// Stats that matter to the battle core
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterStats {
    /// Movement speed in arena units per second
    pub speed: f32,
    /// Contribution to the sling shot attack force
    pub attack: f32,
}

impl CharacterStats {
    pub fn for_defence(defence: Defence) -> Self {
        match defence {
            Defence::Desensitisation => Self {
                speed: 3.0,
                attack: 6.0,
            },
            Defence::Deflection => Self {
                speed: 6.0,
                attack: 4.0,
            },
            Defence::Introjection => Self {
                speed: 4.0,
                attack: 5.0,
            },
            Defence::Projection => Self {
                speed: 4.5,
                attack: 7.0,
            },
            Defence::Retroflection => Self {
                speed: 3.5,
                attack: 8.0,
            },
            Defence::Egotism => Self {
                speed: 5.0,
                attack: 3.0,
            },
            Defence::Confluence => Self {
                speed: 4.0,
                attack: 6.5,
            },
        }
    }
}

/// Fixed stat table for the seven defence characters
#[derive(Debug, Clone, Copy, Default)]
pub struct DefenceCatalog;

impl CharacterCatalog for DefenceCatalog {
    fn stats(&self, skill: i32) -> CharacterStats {
        let defence = Defence::from_skill(skill).unwrap_or_else(|| {
            warn!(skill, "Unknown main skill, using deflection");
            Defence::Deflection
        });
        CharacterStats::for_defence(defence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_skill_falls_back_to_deflection() {
        let catalog = DefenceCatalog;
        assert_eq!(
            catalog.stats(-1),
            CharacterStats::for_defence(Defence::Deflection)
        );
        assert_eq!(catalog.stats(42), catalog.stats(2));
    }

    #[test]
    fn known_skills_map_to_their_defence() {
        let catalog = DefenceCatalog;
        assert_eq!(catalog.stats(5).attack, 8.0);
        assert_eq!(Defence::from_skill(7), Some(Defence::Confluence));
        assert_eq!(Defence::from_skill(0), None);
    }
}
