use serde::{Deserialize, Serialize};

use emberfall_data::{StatBonuses, StatKind};

#[derive(Copy, Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct BasicStats {
    pub strength: i32,
    pub intellect: i32,
    pub dexterity: i32,
    pub vitality: i32,
}

impl BasicStats {
    pub fn add_stat(&mut self, stat: StatKind) -> bool {
        match stat {
            StatKind::Strength => self.strength += 1,
            StatKind::Intellect => self.intellect += 1,
            StatKind::Dexterity => self.dexterity += 1,
            StatKind::Vitality => self.vitality += 1,
            _ => return false,
        }
        true
    }

    pub fn with_bonuses(&self, bonuses: &StatBonuses) -> BasicStats {
        BasicStats {
            strength: self.strength + bonuses.strength,
            intellect: self.intellect + bonuses.intellect,
            dexterity: self.dexterity + bonuses.dexterity,
            vitality: self.vitality + bonuses.vitality,
        }
    }
}

/// Values derived from base stats, class formulas and equipment.
/// Never written directly by gameplay code; stat recomputation is the
/// only writer.
#[derive(Copy, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DerivedStats {
    pub attack_power: i32,
    pub magic_power: i32,
    pub defense: i32,
    /// Attacks per second.
    pub attack_speed: f32,
    pub max_health: i32,
    pub max_mana: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_stat_rejects_derived_kinds() {
        let mut stats = BasicStats::default();
        assert!(stats.add_stat(StatKind::Strength));
        assert_eq!(stats.strength, 1);
        assert!(!stats.add_stat(StatKind::AttackPower));
    }

    #[test]
    fn bonuses_apply_to_base_stats() {
        let stats = BasicStats {
            strength: 10,
            intellect: 5,
            dexterity: 6,
            vitality: 8,
        };
        let bonuses = StatBonuses {
            strength: 3,
            vitality: 2,
            ..Default::default()
        };
        let combined = stats.with_bonuses(&bonuses);
        assert_eq!(combined.strength, 13);
        assert_eq!(combined.vitality, 10);
        assert_eq!(combined.intellect, 5);
    }
}
