use serde::{Deserialize, Serialize};

use emberfall_data::ClassId;

use crate::components::{BasicStats, DerivedStats, SkillList, WorldPosition};
use crate::ids::CharacterId;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CharacterInfo {
    pub name: String,
    pub race: String,
    pub class: ClassId,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Level(pub i32);

#[derive(Copy, Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExperiencePoints(pub i64);

#[derive(Copy, Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct StatusPoints(pub i32);

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct HealthPoints(pub i32);

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ManaPoints(pub i32);

/// The full persistent character. Invariants:
/// `0 <= health <= derived.max_health`, `0 <= mana <= derived.max_mana`,
/// `is_dead` exactly when health is zero, derived stats recomputable
/// from class data + base stats + equipment.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Character {
    pub id: CharacterId,
    pub account: String,
    pub info: CharacterInfo,
    pub level: Level,
    pub experience: ExperiencePoints,
    pub status_points: StatusPoints,
    pub basic_stats: BasicStats,
    pub derived_stats: DerivedStats,
    pub health: HealthPoints,
    pub mana: ManaPoints,
    pub position: WorldPosition,
    pub is_dead: bool,
    pub skills: SkillList,
}

impl Character {
    /// Clamp health into range and keep the dead flag consistent.
    pub fn set_health(&mut self, health: i32) {
        self.health = HealthPoints(health.clamp(0, self.derived_stats.max_health));
        self.is_dead = self.health.0 == 0;
    }

    pub fn set_mana(&mut self, mana: i32) {
        self.mana = ManaPoints(mana.clamp(0, self.derived_stats.max_mana));
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character() -> Character {
        Character {
            id: CharacterId(1),
            account: "alice".into(),
            info: CharacterInfo {
                name: "Aria".into(),
                race: "human".into(),
                class: ClassId::new(1),
            },
            level: Level(1),
            experience: ExperiencePoints(0),
            status_points: StatusPoints(0),
            basic_stats: BasicStats::default(),
            derived_stats: DerivedStats {
                max_health: 100,
                max_mana: 50,
                ..Default::default()
            },
            health: HealthPoints(100),
            mana: ManaPoints(50),
            position: WorldPosition::default(),
            is_dead: false,
            skills: SkillList::default(),
        }
    }

    #[test]
    fn set_health_clamps_and_tracks_death() {
        let mut character = character();
        character.set_health(150);
        assert_eq!(character.health.0, 100);
        assert!(!character.is_dead);

        character.set_health(-10);
        assert_eq!(character.health.0, 0);
        assert!(character.is_dead);

        character.set_health(1);
        assert!(!character.is_dead);
    }

    #[test]
    fn set_mana_clamps() {
        let mut character = character();
        character.set_mana(9999);
        assert_eq!(character.mana.0, 50);
        character.set_mana(-3);
        assert_eq!(character.mana.0, 0);
    }
}
