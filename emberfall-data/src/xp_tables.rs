use serde::{Deserialize, Serialize};

/// Experience progression and kill-reward scaling. The reward scaling
/// is authoritative data keyed by the player-minus-monster level
/// difference; differences outside the table clamp to its edges.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(from = "RawXpTables")]
pub struct XpTables {
    /// `level_xp[n]` is the experience required to advance from level
    /// n+1 to n+2. Characters at the table's end can no longer level.
    level_xp: Vec<i64>,
    /// Sorted `(level_difference, multiplier)` rows.
    reward_multipliers: Vec<(i32, f32)>,
}

/// Catalog files may list multiplier rows in any order; construction
/// through `new` sorts them.
#[derive(Deserialize)]
struct RawXpTables {
    level_xp: Vec<i64>,
    reward_multipliers: Vec<(i32, f32)>,
}

impl From<RawXpTables> for XpTables {
    fn from(raw: RawXpTables) -> Self {
        XpTables::new(raw.level_xp, raw.reward_multipliers)
    }
}

impl XpTables {
    pub fn new(level_xp: Vec<i64>, reward_multipliers: Vec<(i32, f32)>) -> Self {
        let mut reward_multipliers = reward_multipliers;
        reward_multipliers.sort_by_key(|(difference, _)| *difference);
        Self {
            level_xp,
            reward_multipliers,
        }
    }

    pub fn max_level(&self) -> i32 {
        self.level_xp.len() as i32 + 1
    }

    /// Experience needed to advance beyond `level`, or None at cap.
    pub fn xp_to_next_level(&self, level: i32) -> Option<i64> {
        if level < 1 {
            return None;
        }
        self.level_xp.get(level as usize - 1).copied()
    }

    pub fn reward_multiplier(&self, player_level: i32, monster_level: i32) -> f32 {
        let difference = player_level - monster_level;
        let mut multiplier = match self.reward_multipliers.first() {
            Some((_, first)) => *first,
            None => 1.0,
        };
        for (row_difference, row_multiplier) in &self.reward_multipliers {
            if difference >= *row_difference {
                multiplier = *row_multiplier;
            } else {
                break;
            }
        }
        multiplier
    }

    pub fn scaled_reward(&self, player_level: i32, monster_level: i32, base_reward: i32) -> i64 {
        let scaled =
            (base_reward as f32 * self.reward_multiplier(player_level, monster_level)).round();
        (scaled as i64).max(0)
    }
}
