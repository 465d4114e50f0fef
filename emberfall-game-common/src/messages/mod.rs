mod client;
mod server;

pub use client::ClientMessage;
pub use server::{LoginData, ServerMessage};

use serde::{Deserialize, Serialize};

use emberfall_data::{
    ClassId, DamageType, ItemId, MonsterId, SkillId, SkillTargetType, SkillType,
};

use crate::components::{Equipment, WorldPosition};
use crate::data::Damage;
use crate::ids::{CharacterId, ItemInstanceId, MonsterInstanceId, PlayerId};

/// Typed failure codes for `useSkill`, stable on the wire.
#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillFailReason {
    PlayerDead,
    SkillNotLearned,
    SkillNotFound,
    Cooldown,
    InvalidLevel,
    NoMana,
    NoHealth,
    OutOfRange,
    ExecutionError,
}

/// Typed failure codes for `useItem`.
#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemUseFailReason {
    HpFull,
    MpFull,
    OnCooldown,
    NotFound,
    NotConsumable,
    PlayerDead,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSummary {
    pub id: CharacterId,
    pub name: String,
    pub race: String,
    pub class: ClassId,
    pub class_name: String,
    pub level: i32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub strength: i32,
    pub intellect: i32,
    pub dexterity: i32,
    pub vitality: i32,
    pub attack_power: i32,
    pub magic_power: i32,
    pub defense: i32,
    pub attack_speed: f32,
    pub max_health: i32,
    pub max_mana: i32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSnapshot {
    pub id: CharacterId,
    pub name: String,
    pub race: String,
    pub class: ClassId,
    pub class_name: String,
    pub level: i32,
    pub experience: i64,
    pub status_points: i32,
    pub stats: StatsSnapshot,
    pub position: WorldPosition,
    pub health: i32,
    pub mana: i32,
    pub is_dead: bool,
}

/// Per-player entry of the periodic `worldState` broadcast.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub player_id: PlayerId,
    pub name: String,
    pub class: ClassId,
    pub level: i32,
    pub position: WorldPosition,
    pub health: i32,
    pub max_health: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub is_dead: bool,
    pub is_moving: bool,
    pub in_combat: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterSnapshot {
    pub id: MonsterInstanceId,
    pub template: MonsterId,
    pub name: String,
    pub level: i32,
    pub position: WorldPosition,
    pub health: i32,
    pub max_health: i32,
    pub is_alive: bool,
    pub target: Option<PlayerId>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInstanceView {
    pub instance_id: ItemInstanceId,
    pub item: ItemId,
    pub name: String,
    pub quantity: u32,
    pub slot: u32,
    pub is_equipped: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    pub max_slots: u32,
    pub gold: i64,
    pub equipment: Equipment,
    pub items: Vec<ItemInstanceView>,
}

/// Skill template as shown to clients, with the caller's learned
/// level folded in where relevant.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillTemplateView {
    pub id: SkillId,
    pub name: String,
    pub skill_type: SkillType,
    pub damage_type: DamageType,
    pub target_type: SkillTargetType,
    pub required_level: i32,
    pub max_level: u32,
    pub mana_cost: i32,
    pub health_cost: i32,
    pub cooldown: f32,
    pub cast_time: f32,
    pub range: f32,
    pub area_radius: f32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnedSkillView {
    pub skill_id: SkillId,
    pub level: u32,
    pub slot_number: u8,
    pub template: SkillTemplateView,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillTargetResult {
    pub monster_id: MonsterInstanceId,
    pub damage: Damage,
    pub remaining_health: i32,
    pub killed: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillUseResult {
    pub player_id: PlayerId,
    pub skill_id: SkillId,
    pub targets: Vec<SkillTargetResult>,
    pub healing: i32,
    pub health: i32,
    pub mana: i32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LootedItem {
    pub item: ItemId,
    pub name: String,
    pub quantity: u32,
}
