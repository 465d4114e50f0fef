use serde::{Deserialize, Serialize};

use emberfall_data::SkillId;

/// Slot 0 means the skill is learned but not placed on the bar.
pub const UNSLOTTED: u8 = 0;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct LearnedSkill {
    pub skill: SkillId,
    pub level: u32,
    pub slot: u8,
    /// Unix millis of the last successful use.
    pub last_used_ms: i64,
}

/// Invariants: at most one entry per skill id, at most one entry per
/// non-zero slot.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SkillList {
    skills: Vec<LearnedSkill>,
}

impl SkillList {
    pub fn find(&self, skill: SkillId) -> Option<&LearnedSkill> {
        self.skills.iter().find(|learned| learned.skill == skill)
    }

    pub fn find_mut(&mut self, skill: SkillId) -> Option<&mut LearnedSkill> {
        self.skills
            .iter_mut()
            .find(|learned| learned.skill == skill)
    }

    pub fn contains(&self, skill: SkillId) -> bool {
        self.find(skill).is_some()
    }

    /// Learn a new skill at level 1. If `slot` is occupied the
    /// occupant moves to slot 0. Fails when already learned.
    pub fn try_learn(&mut self, skill: SkillId, slot: u8) -> Result<(), ()> {
        if self.contains(skill) {
            return Err(());
        }

        if slot != UNSLOTTED {
            if let Some(occupant) = self
                .skills
                .iter_mut()
                .find(|learned| learned.slot == slot)
            {
                occupant.slot = UNSLOTTED;
            }
        }

        self.skills.push(LearnedSkill {
            skill,
            level: 1,
            slot,
            last_used_ms: 0,
        });
        Ok(())
    }

    pub fn remove(&mut self, skill: SkillId) -> Option<LearnedSkill> {
        let index = self
            .skills
            .iter()
            .position(|learned| learned.skill == skill)?;
        Some(self.skills.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LearnedSkill> {
        self.skills.iter()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
