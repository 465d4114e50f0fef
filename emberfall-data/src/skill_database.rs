use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ClassId, SkillId};

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    Active,
    Passive,
    Buff,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    Physical,
    Magical,
    True,
    None,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SkillTargetType {
    Enemy,
    #[serde(rename = "self")]
    SelfTarget,
    Ally,
    Area,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Strength,
    Intellect,
    Dexterity,
    Vitality,
    AttackPower,
    MagicPower,
    Defense,
    AttackSpeed,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkillEffectKind {
    StatBuff,
    DamageOverTime,
    HealOverTime,
    Stun,
}

/// Per-level scaling row. Level N uses row N-1.
#[derive(Copy, Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SkillLevelData {
    pub base_damage: i32,
    pub base_healing: i32,
    pub damage_multiplier: f32,
    pub crit_chance_bonus: f32,
    pub status_point_cost: i32,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct SkillEffectData {
    pub kind: SkillEffectKind,
    #[serde(default)]
    pub target_stat: Option<StatKind>,
    pub value: i32,
    /// Seconds the effect stays active on its target.
    pub duration: f32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SkillData {
    pub id: SkillId,
    pub name: String,
    pub skill_type: SkillType,
    pub damage_type: DamageType,
    pub target_type: SkillTargetType,
    #[serde(default)]
    pub required_level: i32,
    #[serde(default)]
    pub required_class: Option<ClassId>,
    pub max_level: u32,
    #[serde(default)]
    pub mana_cost: i32,
    #[serde(default)]
    pub health_cost: i32,
    /// Seconds between uses.
    #[serde(default)]
    pub cooldown: f32,
    /// Seconds between use and resolution; 0 resolves immediately.
    #[serde(default)]
    pub cast_time: f32,
    #[serde(default)]
    pub range: f32,
    #[serde(default)]
    pub area_radius: f32,
    pub levels: Vec<SkillLevelData>,
    #[serde(default)]
    pub effects: Vec<SkillEffectData>,
}

impl SkillData {
    pub fn level_data(&self, level: u32) -> Option<&SkillLevelData> {
        if level == 0 {
            return None;
        }
        self.levels.get(level as usize - 1)
    }
}

pub struct SkillDatabase {
    skills: HashMap<SkillId, SkillData>,
}

impl SkillDatabase {
    pub fn new(skills: Vec<SkillData>) -> Self {
        Self {
            skills: skills.into_iter().map(|skill| (skill.id, skill)).collect(),
        }
    }

    pub fn get_skill(&self, id: SkillId) -> Option<&SkillData> {
        self.skills.get(&id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillData> {
        self.skills.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_skill() -> SkillData {
        serde_json::from_str(
            r#"{"id": 3, "name": "Power Strike", "skill_type": "active",
                "damage_type": "physical", "target_type": "enemy",
                "required_level": 1, "max_level": 3, "mana_cost": 10,
                "cooldown": 4.0, "range": 2.5,
                "levels": [{"base_damage": 10, "damage_multiplier": 1.2, "status_point_cost": 1},
                           {"base_damage": 18, "damage_multiplier": 1.35, "status_point_cost": 2},
                           {"base_damage": 30, "damage_multiplier": 1.5, "status_point_cost": 3}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn level_data_is_one_indexed() {
        let skill = test_skill();
        assert!(skill.level_data(0).is_none());
        assert_eq!(skill.level_data(1).unwrap().base_damage, 10);
        assert_eq!(skill.level_data(3).unwrap().base_damage, 30);
        assert!(skill.level_data(4).is_none());
    }

    #[test]
    fn target_type_self_uses_wire_name() {
        assert_eq!(
            serde_json::from_str::<SkillTargetType>("\"self\"").unwrap(),
            SkillTargetType::SelfTarget
        );
        assert_eq!(
            serde_json::to_string(&SkillTargetType::SelfTarget).unwrap(),
            "\"self\""
        );
    }
}
