use std::collections::BTreeMap;

use emberfall_data::SkillId;
use emberfall_game_common::components::{ActiveEffects, Character, Inventory, WorldPosition};
use emberfall_game_common::ids::{MonsterInstanceId, PlayerId};

use crate::game::movement::MovementGuard;

/// A skill waiting out its cast time; validation reruns at resolution.
#[derive(Clone, Debug)]
pub struct PendingCast {
    pub skill: SkillId,
    pub target: Option<MonsterInstanceId>,
    pub target_position: Option<WorldPosition>,
    pub resolve_at_ms: i64,
}

/// Runtime state of one in-world session. The world lock guards all
/// of it.
pub struct Player {
    pub id: PlayerId,
    pub character: Character,
    pub inventory: Inventory,
    /// Server-driven movement destination (combat chase).
    pub target_position: Option<WorldPosition>,
    pub is_moving: bool,
    pub combat_target: Option<MonsterInstanceId>,
    pub last_attack_ms: i64,
    pub effects: ActiveEffects,
    pub movement: MovementGuard,
    pub pending_cast: Option<PendingCast>,
    /// Last time periodic damage/heal effects ticked on this player.
    pub last_effect_tick_ms: i64,
}

impl Player {
    pub fn new(id: PlayerId, character: Character, inventory: Inventory, now_ms: i64) -> Self {
        let position = character.position;
        Self {
            id,
            character,
            inventory,
            target_position: None,
            is_moving: false,
            combat_target: None,
            last_attack_ms: 0,
            effects: ActiveEffects::default(),
            movement: MovementGuard::new(position, now_ms),
            pending_cast: None,
            last_effect_tick_ms: now_ms,
        }
    }

    pub fn stop_combat(&mut self) {
        self.combat_target = None;
        self.target_position = None;
        self.is_moving = false;
    }
}

/// Active in-world players keyed by session id. Ids are handed out
/// monotonically at connect time, so iteration order doubles as the
/// session join order used to serialise same-tick attacks.
#[derive(Default)]
pub struct PlayerRegistry {
    players: BTreeMap<PlayerId, Player>,
}

impl PlayerRegistry {
    pub fn insert(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        self.players.remove(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Is this character already being played by another session?
    pub fn character_in_use(&self, character: emberfall_game_common::ids::CharacterId) -> bool {
        self.players
            .values()
            .any(|player| player.character.id == character)
    }
}
