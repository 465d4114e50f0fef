use serde::{Deserialize, Serialize};

use emberfall_data::{SkillEffectKind, SkillId, StatKind};

use crate::ids::{MonsterInstanceId, PlayerId};

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EffectSource {
    Player(PlayerId),
    Monster(MonsterInstanceId),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ActiveEffect {
    pub id: u64,
    pub skill: SkillId,
    pub kind: SkillEffectKind,
    pub target_stat: Option<StatKind>,
    pub value: i32,
    pub applied_at_ms: i64,
    pub duration_ms: i64,
    pub source: EffectSource,
}

impl ActiveEffect {
    pub fn expires_at_ms(&self) -> i64 {
        self.applied_at_ms + self.duration_ms
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ActiveEffects {
    effects: Vec<ActiveEffect>,
}

impl ActiveEffects {
    pub fn apply(&mut self, effect: ActiveEffect) {
        // A newer application of the same skill effect replaces the
        // old one rather than stacking.
        self.effects
            .retain(|existing| !(existing.skill == effect.skill && existing.kind == effect.kind));
        self.effects.push(effect);
    }

    /// Drop expired effects, returning them so callers can undo stat
    /// buffs and announce expiry.
    pub fn expire(&mut self, now_ms: i64) -> Vec<ActiveEffect> {
        let mut expired = Vec::new();
        self.effects.retain(|effect| {
            if effect.is_expired(now_ms) {
                expired.push(effect.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.effects.iter()
    }

    pub fn clear(&mut self) -> Vec<ActiveEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Summed value of active stat buffs on one stat.
    pub fn stat_buff_total(&self, stat: StatKind) -> i32 {
        self.effects
            .iter()
            .filter(|effect| {
                effect.kind == SkillEffectKind::StatBuff && effect.target_stat == Some(stat)
            })
            .map(|effect| effect.value)
            .sum()
    }

    pub fn is_stunned(&self) -> bool {
        self.effects
            .iter()
            .any(|effect| effect.kind == SkillEffectKind::Stun)
    }
}
