use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use emberfall_data::{ContentCatalog, MonsterData, MonsterId};
use emberfall_game_common::components::{ActiveEffects, WorldPosition};
use emberfall_game_common::ids::{MonsterInstanceId, PlayerId};

/// The persisted slice of a monster instance.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MonsterRecord {
    pub id: MonsterInstanceId,
    pub template: MonsterId,
    pub position: WorldPosition,
    pub health: i32,
    pub is_alive: bool,
    pub last_respawn_ms: i64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AiState {
    Idle,
    Aggro,
    Dead,
}

pub struct Monster {
    pub id: MonsterInstanceId,
    pub template: MonsterId,
    pub position: WorldPosition,
    pub health: i32,
    pub is_alive: bool,
    pub last_respawn_ms: i64,
    pub last_attack_ms: i64,
    pub target: Option<PlayerId>,
    pub effects: ActiveEffects,
    /// Last time periodic effects (DoT) ticked on this monster.
    pub last_effect_tick_ms: i64,
}

impl Monster {
    pub fn from_record(record: MonsterRecord) -> Self {
        Self {
            id: record.id,
            template: record.template,
            position: record.position,
            health: record.health,
            is_alive: record.is_alive,
            last_respawn_ms: record.last_respawn_ms,
            last_attack_ms: 0,
            target: None,
            effects: ActiveEffects::default(),
            last_effect_tick_ms: 0,
        }
    }

    pub fn to_record(&self) -> MonsterRecord {
        MonsterRecord {
            id: self.id,
            template: self.template,
            position: self.position,
            health: self.health,
            is_alive: self.is_alive,
            last_respawn_ms: self.last_respawn_ms,
        }
    }

    pub fn ai_state(&self) -> AiState {
        if !self.is_alive {
            AiState::Dead
        } else if self.target.is_some() {
            AiState::Aggro
        } else {
            AiState::Idle
        }
    }

    /// Pick a respawn point within `spawn_radius` of the spawn
    /// centre, clamped onto the terrain.
    pub fn respawn_position(
        data: &MonsterData,
        catalog: &ContentCatalog,
        rng: &mut impl Rng,
    ) -> WorldPosition {
        let angle = rng.gen::<f32>() * std::f32::consts::TAU;
        let distance = rng.gen::<f32>() * data.spawn_radius;
        let position = glam::Vec3::new(
            data.spawn_center.x + angle.cos() * distance,
            data.spawn_center.y + angle.sin() * distance,
            data.spawn_center.z,
        );
        catalog.terrain.clamp(position).into()
    }
}

#[derive(Default)]
pub struct MonsterRegistry {
    monsters: BTreeMap<MonsterInstanceId, Monster>,
}

impl MonsterRegistry {
    /// Build the registry from persisted rows, or seed fresh instances
    /// from the catalog spawn tables when the store holds none.
    pub fn from_records_or_catalog(
        records: Vec<MonsterRecord>,
        catalog: &ContentCatalog,
        rng: &mut impl Rng,
    ) -> Self {
        let mut registry = Self::default();

        if records.is_empty() {
            let mut next_id = 1u32;
            let mut templates: Vec<&MonsterData> = catalog.monsters.iter().collect();
            templates.sort_by_key(|data| data.id);
            for data in templates {
                for _ in 0..data.spawn_count {
                    let position = Monster::respawn_position(data, catalog, rng);
                    registry.insert(Monster::from_record(MonsterRecord {
                        id: MonsterInstanceId(next_id),
                        template: data.id,
                        position,
                        health: data.max_health,
                        is_alive: true,
                        last_respawn_ms: 0,
                    }));
                    next_id += 1;
                }
            }
            log::info!("Seeded {} monster instances from catalog", registry.len());
        } else {
            for record in records {
                registry.insert(Monster::from_record(record));
            }
            log::info!("Restored {} monster instances from storage", registry.len());
        }

        registry
    }

    pub fn insert(&mut self, monster: Monster) {
        self.monsters.insert(monster.id, monster);
    }

    pub fn get(&self, id: MonsterInstanceId) -> Option<&Monster> {
        self.monsters.get(&id)
    }

    pub fn get_mut(&mut self, id: MonsterInstanceId) -> Option<&mut Monster> {
        self.monsters.get_mut(&id)
    }

    pub fn ids(&self) -> Vec<MonsterInstanceId> {
        self.monsters.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Monster> {
        self.monsters.values_mut()
    }

    pub fn len(&self) -> usize {
        self.monsters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monsters.is_empty()
    }
}
