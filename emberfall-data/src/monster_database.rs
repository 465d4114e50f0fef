use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{LootTableId, MonsterId};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MonsterData {
    pub id: MonsterId,
    pub name: String,
    pub level: i32,
    pub max_health: i32,
    pub attack_power: i32,
    pub defense: i32,
    pub experience_reward: i32,
    /// Attacks per second.
    pub attack_speed: f32,
    /// Units per second while chasing.
    pub move_speed: f32,
    pub attack_range: f32,
    pub aggro_range: f32,
    pub spawn_center: Vec3,
    pub spawn_radius: f32,
    /// Seconds from death until the instance respawns.
    pub respawn_time: f32,
    #[serde(default)]
    pub loot_table: Option<LootTableId>,
    /// Instances created at world init when no persisted rows exist.
    #[serde(default = "default_spawn_count")]
    pub spawn_count: u32,
}

fn default_spawn_count() -> u32 {
    1
}

pub struct MonsterDatabase {
    monsters: HashMap<MonsterId, MonsterData>,
}

impl MonsterDatabase {
    pub fn new(monsters: Vec<MonsterData>) -> Self {
        Self {
            monsters: monsters
                .into_iter()
                .map(|monster| (monster.id, monster))
                .collect(),
        }
    }

    pub fn get_monster(&self, id: MonsterId) -> Option<&MonsterData> {
        self.monsters.get(&id)
    }

    pub fn len(&self) -> usize {
        self.monsters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monsters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonsterData> {
        self.monsters.values()
    }
}
