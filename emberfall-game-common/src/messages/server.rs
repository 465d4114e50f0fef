use serde::{Deserialize, Serialize};

use emberfall_data::{EquipmentSlot, SkillId, StatKind};

use crate::components::WorldPosition;
use crate::data::Damage;
use crate::ids::{AccountId, ItemInstanceId, MonsterInstanceId, PlayerId};
use crate::messages::{
    CharacterSnapshot, CharacterSummary, InventorySnapshot, ItemUseFailReason, LearnedSkillView,
    LootedItem, MonsterSnapshot, PlayerSnapshot, SkillFailReason, SkillTemplateView,
    SkillUseResult, StatsSnapshot,
};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub account_id: AccountId,
    pub characters: Vec<CharacterSummary>,
}

/// Everything the server sends, both direct replies and broadcasts.
/// One JSON object per line with a `type` tag, mirroring the inbound
/// framing.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Pong { time: i64 },
    #[serde(rename_all = "camelCase")]
    Error { message: String },
    #[serde(rename_all = "camelCase")]
    LoginResponse {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<LoginData>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    RegisterResponse {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    CharacterListResponse { characters: Vec<CharacterSummary> },
    #[serde(rename_all = "camelCase")]
    CreateCharacterResponse {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        character: Option<CharacterSummary>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    DeleteCharacterResponse {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SelectCharacterResponse {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        character: Option<CharacterSnapshot>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_id: Option<PlayerId>,
        #[serde(default)]
        all_players: Vec<PlayerSnapshot>,
        #[serde(default)]
        all_monsters: Vec<MonsterSnapshot>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inventory: Option<InventorySnapshot>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    MoveAccepted { target_position: WorldPosition },
    #[serde(rename_all = "camelCase")]
    AttackStarted {
        player_id: PlayerId,
        monster_id: MonsterInstanceId,
    },
    #[serde(rename_all = "camelCase")]
    WorldState {
        time: i64,
        players: Vec<PlayerSnapshot>,
        monsters: Vec<MonsterSnapshot>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerJoined { player: PlayerSnapshot },
    #[serde(rename_all = "camelCase")]
    PlayerDisconnected { player_id: PlayerId },
    /// A player's strike landing on a monster.
    #[serde(rename_all = "camelCase")]
    PlayerAttack {
        player_id: PlayerId,
        monster_id: MonsterInstanceId,
        damage: Damage,
        remaining_health: i32,
        killed: bool,
    },
    /// A monster's strike landing on a player.
    #[serde(rename_all = "camelCase")]
    CombatResult {
        monster_id: MonsterInstanceId,
        player_id: PlayerId,
        damage: Damage,
        remaining_health: i32,
        killed: bool,
    },
    #[serde(rename_all = "camelCase")]
    LevelUp {
        player_id: PlayerId,
        level: i32,
        status_points: i32,
        new_stats: StatsSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    PlayerDeath {
        player_id: PlayerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        killer_monster_id: Option<MonsterInstanceId>,
    },
    #[serde(rename_all = "camelCase")]
    RespawnResponse {
        success: bool,
        position: WorldPosition,
        health: i32,
        mana: i32,
    },
    #[serde(rename_all = "camelCase")]
    PlayerRespawn {
        player_id: PlayerId,
        position: WorldPosition,
    },
    #[serde(rename_all = "camelCase")]
    PlayerStatsUpdate {
        player_id: PlayerId,
        health: i32,
        max_health: i32,
        mana: i32,
        max_mana: i32,
    },
    #[serde(rename_all = "camelCase")]
    LootReceived {
        player_id: PlayerId,
        monster_id: MonsterInstanceId,
        gold: i64,
        items: Vec<LootedItem>,
        #[serde(default)]
        discarded: Vec<LootedItem>,
    },
    #[serde(rename_all = "camelCase")]
    CastStarted {
        player_id: PlayerId,
        skill_id: SkillId,
        cast_time: f32,
    },
    #[serde(rename_all = "camelCase")]
    CastCancelled {
        player_id: PlayerId,
        skill_id: SkillId,
    },
    #[serde(rename_all = "camelCase")]
    SkillUsed { result: SkillUseResult },
    #[serde(rename_all = "camelCase")]
    SkillUseFailed {
        skill_id: SkillId,
        reason: SkillFailReason,
    },
    #[serde(rename_all = "camelCase")]
    SkillLearned {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        skill_id: Option<SkillId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        skill_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slot_number: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SkillLeveledUp {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        skill_id: Option<SkillId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_level: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status_points: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SkillsResponse { skills: Vec<LearnedSkillView> },
    #[serde(rename_all = "camelCase")]
    SkillListResponse { skills: Vec<SkillTemplateView> },
    #[serde(rename_all = "camelCase")]
    InventoryResponse {
        success: bool,
        inventory: InventorySnapshot,
    },
    #[serde(rename_all = "camelCase")]
    ItemUsed {
        player_id: PlayerId,
        instance_id: ItemInstanceId,
        health: i32,
        max_health: i32,
        mana: i32,
        max_mana: i32,
        remaining_quantity: u32,
    },
    #[serde(rename_all = "camelCase")]
    ItemUseFailed {
        reason: ItemUseFailReason,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    ItemEquipped {
        player_id: PlayerId,
        instance_id: ItemInstanceId,
        new_stats: StatsSnapshot,
        inventory: InventorySnapshot,
    },
    #[serde(rename_all = "camelCase")]
    ItemUnequipped {
        player_id: PlayerId,
        slot: EquipmentSlot,
        new_stats: StatsSnapshot,
        inventory: InventorySnapshot,
    },
    #[serde(rename_all = "camelCase")]
    ItemDropped {
        player_id: PlayerId,
        instance_id: ItemInstanceId,
        quantity: u32,
    },
    #[serde(rename_all = "camelCase")]
    StatusPointAdded {
        player_id: PlayerId,
        stat: StatKind,
        status_points: i32,
        new_stats: StatsSnapshot,
    },
}
