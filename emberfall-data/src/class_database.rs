use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ClassId;

/// Base stat values and per-level growth share a shape.
#[derive(Copy, Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StatGrowth {
    pub strength: i32,
    pub intellect: i32,
    pub dexterity: i32,
    pub vitality: i32,
}

/// Coefficients for deriving combat values from base stats. Kept as
/// catalog data so balance passes never touch the stat code.
#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct ClassFormulas {
    pub base_health: i32,
    pub health_per_vitality: i32,
    pub health_per_level: i32,
    pub base_mana: i32,
    pub mana_per_intellect: i32,
    pub mana_per_level: i32,
    pub attack_per_strength: f32,
    pub attack_per_dexterity: f32,
    pub magic_per_intellect: f32,
    pub defense_per_vitality: f32,
    pub defense_per_level: f32,
    pub base_attack_speed: f32,
    pub attack_speed_per_dexterity: f32,
    /// Basic-attack reach in world units.
    #[serde(default = "default_attack_range")]
    pub attack_range: f32,
}

fn default_attack_range() -> f32 {
    2.0
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClassData {
    pub id: ClassId,
    pub name: String,
    pub base_stats: StatGrowth,
    pub growth_per_level: StatGrowth,
    pub status_points_per_level: i32,
    pub formulas: ClassFormulas,
    /// `(item, quantity)` granted to newly created characters.
    #[serde(default)]
    pub starter_items: Vec<(crate::ItemId, u32)>,
}

impl ClassData {
    /// Base stats at a level before any spent status points or
    /// equipment bonuses.
    pub fn stats_at_level(&self, level: i32) -> StatGrowth {
        let levels = (level - 1).max(0);
        StatGrowth {
            strength: self.base_stats.strength + self.growth_per_level.strength * levels,
            intellect: self.base_stats.intellect + self.growth_per_level.intellect * levels,
            dexterity: self.base_stats.dexterity + self.growth_per_level.dexterity * levels,
            vitality: self.base_stats.vitality + self.growth_per_level.vitality * levels,
        }
    }

    pub fn max_health(&self, level: i32, vitality: i32) -> i32 {
        self.formulas.base_health
            + self.formulas.health_per_vitality * vitality
            + self.formulas.health_per_level * (level - 1).max(0)
    }

    pub fn max_mana(&self, level: i32, intellect: i32) -> i32 {
        self.formulas.base_mana
            + self.formulas.mana_per_intellect * intellect
            + self.formulas.mana_per_level * (level - 1).max(0)
    }

    pub fn attack_power(&self, strength: i32, dexterity: i32) -> i32 {
        (self.formulas.attack_per_strength * strength as f32
            + self.formulas.attack_per_dexterity * dexterity as f32) as i32
    }

    pub fn magic_power(&self, intellect: i32) -> i32 {
        (self.formulas.magic_per_intellect * intellect as f32) as i32
    }

    pub fn defense(&self, level: i32, vitality: i32) -> i32 {
        (self.formulas.defense_per_vitality * vitality as f32
            + self.formulas.defense_per_level * (level - 1).max(0) as f32) as i32
    }

    pub fn attack_speed(&self, dexterity: i32) -> f32 {
        self.formulas.base_attack_speed
            + self.formulas.attack_speed_per_dexterity * dexterity as f32
    }
}

pub struct ClassDatabase {
    classes: HashMap<ClassId, ClassData>,
    by_name: HashMap<String, ClassId>,
}

impl ClassDatabase {
    pub fn new(classes: Vec<ClassData>) -> Self {
        let by_name = classes
            .iter()
            .map(|class| (class.name.clone(), class.id))
            .collect();
        Self {
            classes: classes.into_iter().map(|class| (class.id, class)).collect(),
            by_name,
        }
    }

    pub fn get_class(&self, id: ClassId) -> Option<&ClassData> {
        self.classes.get(&id)
    }

    pub fn find_class(&self, name: &str) -> Option<&ClassData> {
        self.by_name.get(name).and_then(|id| self.classes.get(id))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warrior() -> ClassData {
        ClassData {
            id: ClassId::new(1),
            name: "Warrior".into(),
            base_stats: StatGrowth {
                strength: 8,
                intellect: 3,
                dexterity: 5,
                vitality: 7,
            },
            growth_per_level: StatGrowth {
                strength: 2,
                intellect: 1,
                dexterity: 1,
                vitality: 2,
            },
            status_points_per_level: 5,
            formulas: ClassFormulas {
                base_health: 80,
                health_per_vitality: 10,
                health_per_level: 15,
                base_mana: 20,
                mana_per_intellect: 8,
                mana_per_level: 5,
                attack_per_strength: 2.0,
                attack_per_dexterity: 0.5,
                magic_per_intellect: 2.0,
                defense_per_vitality: 1.5,
                defense_per_level: 1.0,
                base_attack_speed: 1.0,
                attack_speed_per_dexterity: 0.005,
                attack_range: 2.0,
            },
            starter_items: Vec::new(),
        }
    }

    #[test]
    fn stats_at_level_one_equal_base() {
        let class = warrior();
        let stats = class.stats_at_level(1);
        assert_eq!(stats.strength, 8);
        assert_eq!(stats.vitality, 7);
    }

    #[test]
    fn growth_applies_per_level_past_one() {
        let class = warrior();
        let stats = class.stats_at_level(5);
        assert_eq!(stats.strength, 8 + 2 * 4);
        assert_eq!(stats.intellect, 3 + 4);
    }

    #[test]
    fn derived_values_follow_formulas() {
        let class = warrior();
        assert_eq!(class.max_health(1, 7), 80 + 70);
        assert_eq!(class.max_health(2, 9), 80 + 90 + 15);
        assert_eq!(class.attack_power(10, 6), 23);
        assert_eq!(class.defense(1, 7), 10);
        assert!((class.attack_speed(5) - 1.025).abs() < f32::EPSILON);
    }
}
