use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use dashmap::DashMap;
use glam::Vec3;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;

use emberfall_data::{ContentCatalog, DamageType, EffectTarget};
use emberfall_game_common::components::WorldPosition;
use emberfall_game_common::data::Damage;
use emberfall_game_common::ids::{MonsterInstanceId, PlayerId};
use emberfall_game_common::messages::ServerMessage;

use crate::game::combat;
use crate::game::loot;
use crate::game::monsters::{Monster, MonsterRegistry};
use crate::game::players::PlayerRegistry;
use crate::game::snapshots;
use crate::game::stats::recalculate_stats;
use crate::game::time::GameTime;
use crate::storage::{CombatLogEntry, PersistenceStore};

/// Units per second for player movement integration.
pub const PLAYER_MOVE_SPEED: f32 = 5.0;
/// Period of damage/heal-over-time application.
pub const EFFECT_TICK_MS: i64 = 1000;

#[derive(Clone, Debug)]
pub enum Outbound {
    Broadcast(ServerMessage),
    To(PlayerId, ServerMessage),
}

#[derive(Clone, Debug)]
pub struct WorldConfig {
    pub spawn_position: WorldPosition,
    pub broadcast_interval_ticks: u64,
    pub save_interval_ms: i64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            spawn_position: WorldPosition::default(),
            broadcast_interval_ticks: 4,
            save_interval_ms: 5_000,
        }
    }
}

pub struct MonsterHit {
    pub damage: Damage,
    pub remaining: i32,
    pub killed: bool,
}

/// All mutable gameplay state. Shared as `Arc<Mutex<World>>`: the tick
/// thread holds the lock for a whole tick, session handlers for the
/// duration of one message.
pub struct World {
    pub catalog: Arc<ContentCatalog>,
    pub store: Arc<dyn PersistenceStore>,
    pub players: PlayerRegistry,
    pub monsters: MonsterRegistry,
    pub rng: StdRng,
    pub config: WorldConfig,
    pub(crate) outbox: Vec<Outbound>,
    pub(crate) pending_combat_logs: Vec<CombatLogEntry>,
    /// (player, effect target) -> last consumable use, outside the
    /// skill cooldown bookkeeping.
    pub consumable_cooldowns: DashMap<(PlayerId, EffectTarget), i64>,
    loot_locks: Mutex<HashMap<MonsterInstanceId, Arc<Mutex<()>>>>,
    next_effect_id: u64,
    tick_counter: u64,
}

impl World {
    pub fn new(
        catalog: Arc<ContentCatalog>,
        store: Arc<dyn PersistenceStore>,
        monsters: MonsterRegistry,
        config: WorldConfig,
        rng_seed: u64,
    ) -> Self {
        Self {
            catalog,
            store,
            players: PlayerRegistry::default(),
            monsters,
            rng: StdRng::seed_from_u64(rng_seed),
            config,
            outbox: Vec::new(),
            pending_combat_logs: Vec::new(),
            consumable_cooldowns: DashMap::new(),
            loot_locks: Mutex::new(HashMap::new()),
            next_effect_id: 1,
            tick_counter: 0,
        }
    }

    pub fn broadcast(&mut self, message: ServerMessage) {
        self.outbox.push(Outbound::Broadcast(message));
    }

    pub fn send_to(&mut self, player: PlayerId, message: ServerMessage) {
        self.outbox.push(Outbound::To(player, message));
    }

    pub fn take_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    pub fn take_pending_combat_logs(&mut self) -> Vec<CombatLogEntry> {
        std::mem::take(&mut self.pending_combat_logs)
    }

    pub fn next_effect_id(&mut self) -> u64 {
        let id = self.next_effect_id;
        self.next_effect_id += 1;
        id
    }

    pub fn tick_counter(&self) -> u64 {
        self.tick_counter
    }

    /// One logical critical section per monster id: held across the
    /// health-zero transition and the loot roll so concurrent kill
    /// paths cannot double-drop.
    pub fn loot_lock(&self, monster: MonsterInstanceId) -> Arc<Mutex<()>> {
        self.loot_locks
            .lock()
            .entry(monster)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// One world step. Phases run in fixed order; a failing phase is
    /// logged with its name and the remaining phases still run.
    pub fn tick(&mut self, time: GameTime, dt: f32) {
        self.tick_counter += 1;

        let phases: [(&str, fn(&mut World, GameTime, f32) -> Result<(), anyhow::Error>); 4] = [
            ("movement", World::integrate_movement),
            ("player_combat", World::process_player_combat),
            ("monsters", World::update_monsters),
            ("effects", World::process_effects),
        ];
        for (name, phase) in phases {
            if let Err(error) = phase(self, time, dt) {
                log::error!("Tick phase {} failed: {:#}", name, error);
            }
        }

        if self.tick_counter % self.config.broadcast_interval_ticks == 0 {
            let message = ServerMessage::WorldState {
                time: time.now_ms,
                players: snapshots::player_snapshots(self),
                monsters: snapshots::monster_snapshots(self),
            };
            self.broadcast(message);
        }
    }

    /// Phase 1: advance players with a server-driven destination.
    fn integrate_movement(&mut self, time: GameTime, dt: f32) -> Result<(), anyhow::Error> {
        let catalog = self.catalog.clone();
        let terrain = &catalog.terrain;
        for player in self.players.iter_mut() {
            let Some(target) = player.target_position else {
                continue;
            };
            if player.character.is_dead {
                player.target_position = None;
                player.is_moving = false;
                continue;
            }

            let current = Vec3::from(player.character.position);
            let destination = Vec3::from(target);
            let delta = destination - current;
            let step = PLAYER_MOVE_SPEED * dt;

            let next = if delta.length() <= step {
                player.target_position = None;
                player.is_moving = false;
                destination
            } else {
                current + delta.normalize() * step
            };

            let clamped: WorldPosition = terrain.clamp(next).into();
            player.character.position = clamped;
            player.movement.commit(clamped, time.now_ms);
        }
        Ok(())
    }

    /// Phase 2: auto-attacks, serialised by session join order. Casts
    /// whose cast time elapsed this tick resolve first.
    fn process_player_combat(&mut self, time: GameTime, _dt: f32) -> Result<(), anyhow::Error> {
        crate::game::skills::resolve_due_casts(self, time);

        for player_id in self.players.ids() {
            let Some((monster_id, position, range, interval_ok, alive)) = ({
                let player = match self.players.get(player_id) {
                    Some(player) => player,
                    None => continue,
                };
                player.combat_target.map(|monster_id| {
                    let class = self.catalog.classes.get_class(player.character.info.class);
                    let range = class.map(|class| class.formulas.attack_range).unwrap_or(2.0);
                    let interval =
                        combat::attack_interval_ms(player.character.derived_stats.attack_speed);
                    (
                        monster_id,
                        player.character.position,
                        range,
                        time.now_ms - player.last_attack_ms >= interval,
                        player.character.is_alive(),
                    )
                })
            }) else {
                continue;
            };

            if !alive {
                if let Some(player) = self.players.get_mut(player_id) {
                    player.stop_combat();
                }
                continue;
            }

            let Some(monster) = self.monsters.get(monster_id) else {
                if let Some(player) = self.players.get_mut(player_id) {
                    player.stop_combat();
                }
                continue;
            };
            if !monster.is_alive {
                if let Some(player) = self.players.get_mut(player_id) {
                    player.stop_combat();
                }
                continue;
            }

            let monster_position = monster.position;
            if position.distance_2d(&monster_position) > range {
                // Out of reach: chase.
                if let Some(player) = self.players.get_mut(player_id) {
                    player.target_position = Some(monster_position);
                    player.is_moving = true;
                }
                continue;
            }

            if !interval_ok {
                continue;
            }

            let monster_defense = self
                .catalog
                .monsters
                .get_monster(monster.template)
                .map(|data| data.defense)
                .ok_or_else(|| anyhow!("monster {} has unknown template", monster_id))?;
            let damage = {
                let player = self
                    .players
                    .get(player_id)
                    .ok_or_else(|| anyhow!("attacking player vanished"))?;
                combat::character_attack_damage(&mut self.rng, &player.character, monster_defense)
            };

            if let Some(player) = self.players.get_mut(player_id) {
                player.last_attack_ms = time.now_ms;
                player.is_moving = false;
                player.target_position = None;
            }
            self.apply_damage_to_monster(monster_id, player_id, damage, None, time)
                .with_context(|| format!("auto-attack on monster {}", monster_id))?;
        }
        Ok(())
    }

    /// Phase 3: monster AI and respawns, in id order.
    fn update_monsters(&mut self, time: GameTime, dt: f32) -> Result<(), anyhow::Error> {
        for monster_id in self.monsters.ids() {
            let Some(monster) = self.monsters.get(monster_id) else {
                continue;
            };
            let template = monster.template;
            let Some(data) = self.catalog.monsters.get_monster(template) else {
                continue;
            };

            if !monster.is_alive {
                let respawn_due =
                    monster.last_respawn_ms + (data.respawn_time * 1000.0) as i64 <= time.now_ms;
                if respawn_due {
                    let position = Monster::respawn_position(data, &self.catalog, &mut self.rng);
                    let max_health = data.max_health;
                    if let Some(monster) = self.monsters.get_mut(monster_id) {
                        monster.is_alive = true;
                        monster.health = max_health;
                        monster.position = position;
                        monster.target = None;
                        monster.effects.clear();
                    }
                }
                continue;
            }

            // Validate or acquire a target.
            let current_target = monster.target;
            let position = monster.position;
            let target = match current_target {
                Some(player_id) => match self.players.get(player_id) {
                    Some(player) if player.character.is_alive() => Some(player_id),
                    _ => None,
                },
                None => self
                    .players
                    .iter()
                    .filter(|player| player.character.is_alive())
                    .filter(|player| {
                        player.character.position.distance_2d(&position) <= data.aggro_range
                    })
                    .map(|player| player.id)
                    .next(),
            };

            if let Some(monster) = self.monsters.get_mut(monster_id) {
                monster.target = target;
            }
            let Some(target_id) = target else {
                continue;
            };

            let target_position = match self.players.get(target_id) {
                Some(player) => player.character.position,
                None => continue,
            };

            if position.distance_2d(&target_position) > data.attack_range {
                // Chase.
                let current = Vec3::from(position);
                let destination = Vec3::from(target_position);
                let delta = destination - current;
                let step = data.move_speed * dt;
                let next = if delta.length() <= step {
                    destination
                } else {
                    current + delta.normalize() * step
                };
                let clamped: WorldPosition = self.catalog.terrain.clamp(next).into();
                if let Some(monster) = self.monsters.get_mut(monster_id) {
                    monster.position = clamped;
                }
                continue;
            }

            let attack_due = time.now_ms
                - self
                    .monsters
                    .get(monster_id)
                    .map(|monster| monster.last_attack_ms)
                    .unwrap_or(0)
                >= combat::attack_interval_ms(data.attack_speed);
            if !attack_due {
                continue;
            }

            let damage = {
                let player = match self.players.get(target_id) {
                    Some(player) => player,
                    None => continue,
                };
                let crit_chance = combat::base_crit_chance(DamageType::Physical, 0, 0);
                combat::compute_damage(
                    &mut self.rng,
                    data.attack_power as f32,
                    crit_chance,
                    player.character.derived_stats.defense,
                )
            };

            if let Some(monster) = self.monsters.get_mut(monster_id) {
                monster.last_attack_ms = time.now_ms;
            }
            self.apply_damage_to_player(target_id, monster_id, damage, time);
        }
        Ok(())
    }

    /// Phase 4: expire finished effects, tick periodic ones.
    fn process_effects(&mut self, time: GameTime, _dt: f32) -> Result<(), anyhow::Error> {
        use emberfall_data::SkillEffectKind;
        use emberfall_game_common::components::EffectSource;

        // Players: expiry undoes buffs via recomputation.
        for player_id in self.players.ids() {
            let expired = match self.players.get_mut(player_id) {
                Some(player) => player.effects.expire(time.now_ms),
                None => continue,
            };
            if !expired.is_empty() {
                self.recalculate_player_stats(player_id)?;
                self.emit_stats_update(player_id);
            }

            // Periodic damage and healing.
            let due = match self.players.get(player_id) {
                Some(player) => time.now_ms - player.last_effect_tick_ms >= EFFECT_TICK_MS,
                None => false,
            };
            if !due {
                continue;
            }

            let (dot, hot) = match self.players.get_mut(player_id) {
                Some(player) => {
                    player.last_effect_tick_ms = time.now_ms;
                    let dot: i32 = player
                        .effects
                        .iter()
                        .filter(|effect| effect.kind == SkillEffectKind::DamageOverTime)
                        .map(|effect| effect.value)
                        .sum();
                    let hot: i32 = player
                        .effects
                        .iter()
                        .filter(|effect| effect.kind == SkillEffectKind::HealOverTime)
                        .map(|effect| effect.value)
                        .sum();
                    (dot, hot)
                }
                None => (0, 0),
            };

            if hot > 0 {
                if let Some(player) = self.players.get_mut(player_id) {
                    if player.character.is_alive() {
                        player.character.set_health(player.character.health.0 + hot);
                    }
                }
                self.emit_stats_update(player_id);
            }
            if dot > 0 {
                let killed = {
                    let player = match self.players.get_mut(player_id) {
                        Some(player) => player,
                        None => continue,
                    };
                    if !player.character.is_alive() {
                        continue;
                    }
                    player.character.set_health(player.character.health.0 - dot);
                    player.character.is_dead
                };
                self.emit_stats_update(player_id);
                if killed {
                    self.on_player_death(player_id, None);
                }
            }
        }

        // Monsters: DoT can kill with credit to the effect source.
        for monster_id in self.monsters.ids() {
            let Some(monster) = self.monsters.get_mut(monster_id) else {
                continue;
            };
            monster.effects.expire(time.now_ms);

            if !monster.is_alive {
                continue;
            }
            if time.now_ms - monster.last_effect_tick_ms < EFFECT_TICK_MS {
                continue;
            }
            monster.last_effect_tick_ms = time.now_ms;

            let mut credit = None;
            let mut dot = 0i32;
            for effect in monster.effects.iter() {
                if effect.kind == SkillEffectKind::DamageOverTime {
                    dot += effect.value;
                    if let EffectSource::Player(player_id) = effect.source {
                        credit = Some(player_id);
                    }
                }
            }

            if dot > 0 {
                if let Some(player_id) = credit.filter(|id| self.players.contains(*id)) {
                    self.apply_damage_to_monster(
                        monster_id,
                        player_id,
                        Damage {
                            amount: dot,
                            is_critical: false,
                        },
                        None,
                        time,
                    )?;
                }
            }
        }

        Ok(())
    }

    /// Apply a strike to a monster inside its per-monster loot
    /// critical section; the killing strike runs the death, XP and
    /// loot path before the lock is released.
    pub fn apply_damage_to_monster(
        &mut self,
        monster_id: MonsterInstanceId,
        attacker: PlayerId,
        damage: Damage,
        skill: Option<emberfall_data::SkillId>,
        time: GameTime,
    ) -> Result<MonsterHit, anyhow::Error> {
        let lock = self.loot_lock(monster_id);
        let _guard = lock.lock();

        let (remaining, killed, template) = {
            let monster = self
                .monsters
                .get_mut(monster_id)
                .ok_or_else(|| anyhow!("monster {} not found", monster_id))?;
            if !monster.is_alive {
                // Already dead: a concurrent strike landed first.
                return Ok(MonsterHit {
                    damage: Damage::default(),
                    remaining: 0,
                    killed: false,
                });
            }
            monster.health = (monster.health - damage.amount).max(0);
            let killed = monster.health == 0;
            if killed {
                monster.is_alive = false;
                monster.last_respawn_ms = time.now_ms;
                monster.target = None;
                monster.effects.clear();
            }
            (monster.health, killed, monster.template)
        };

        self.broadcast(ServerMessage::PlayerAttack {
            player_id: attacker,
            monster_id,
            damage,
            remaining_health: remaining,
            killed,
        });

        self.pending_combat_logs.push(CombatLogEntry {
            time_ms: time.now_ms,
            attacker: format!("player:{}", attacker),
            defender: format!("monster:{}", monster_id),
            damage: damage.amount,
            critical: damage.is_critical,
            killed,
            skill,
        });

        if killed {
            self.on_monster_killed(monster_id, template, attacker, time)?;
        }

        Ok(MonsterHit {
            damage,
            remaining,
            killed,
        })
    }

    fn on_monster_killed(
        &mut self,
        monster_id: MonsterInstanceId,
        template: emberfall_data::MonsterId,
        killer: PlayerId,
        time: GameTime,
    ) -> Result<(), anyhow::Error> {
        let Some(data) = self.catalog.monsters.get_monster(template) else {
            return Err(anyhow!("killed monster {} has unknown template", monster_id));
        };
        let monster_level = data.level;
        let base_reward = data.experience_reward;
        let loot_table = data.loot_table;

        // Everyone fighting this monster drops out of combat with it.
        for player in self.players.iter_mut() {
            if player.combat_target == Some(monster_id) {
                player.combat_target = None;
            }
        }

        let killer_level = self
            .players
            .get(killer)
            .map(|player| player.character.level.0);
        if let Some(level) = killer_level {
            let earned =
                combat::experience_reward(&self.catalog, level, monster_level, base_reward);
            self.award_experience(killer, earned)?;
        }

        if let Some(table) = loot_table {
            loot::resolve_loot(self, monster_id, table, killer, time)?;
        }

        Ok(())
    }

    pub fn award_experience(
        &mut self,
        player_id: PlayerId,
        earned: i64,
    ) -> Result<(), anyhow::Error> {
        let levels_gained = {
            let player = match self.players.get_mut(player_id) {
                Some(player) => player,
                None => return Ok(()),
            };
            let gained = combat::apply_experience(&self.catalog, &mut player.character, earned);
            gained
        };

        if levels_gained > 0 {
            self.recalculate_player_stats(player_id)?;
            // Level-up refills to the new maxima.
            if let Some(player) = self.players.get_mut(player_id) {
                player.character.set_health(player.character.derived_stats.max_health);
                player.character.set_mana(player.character.derived_stats.max_mana);
            }

            if let Some(player) = self.players.get(player_id) {
                let message = ServerMessage::LevelUp {
                    player_id,
                    level: player.character.level.0,
                    status_points: player.character.status_points.0,
                    new_stats: snapshots::stats_snapshot(&player.character),
                };
                self.broadcast(message);
            }
        }
        Ok(())
    }

    pub fn apply_damage_to_player(
        &mut self,
        player_id: PlayerId,
        monster_id: MonsterInstanceId,
        damage: Damage,
        time: GameTime,
    ) {
        let (remaining, killed) = {
            let Some(player) = self.players.get_mut(player_id) else {
                return;
            };
            if player.character.is_dead {
                return;
            }
            player
                .character
                .set_health(player.character.health.0 - damage.amount);
            (player.character.health.0, player.character.is_dead)
        };

        self.broadcast(ServerMessage::CombatResult {
            monster_id,
            player_id,
            damage,
            remaining_health: remaining,
            killed,
        });

        self.pending_combat_logs.push(CombatLogEntry {
            time_ms: time.now_ms,
            attacker: format!("monster:{}", monster_id),
            defender: format!("player:{}", player_id),
            damage: damage.amount,
            critical: damage.is_critical,
            killed,
            skill: None,
        });

        if killed {
            self.on_player_death(player_id, Some(monster_id));
        }
    }

    fn on_player_death(&mut self, player_id: PlayerId, killer: Option<MonsterInstanceId>) {
        if let Some(player) = self.players.get_mut(player_id) {
            player.stop_combat();
            player.pending_cast = None;
            player.effects.clear();
        }

        // Monsters lose interest in the dead.
        for monster in self.monsters.iter_mut() {
            if monster.target == Some(player_id) {
                monster.target = None;
            }
        }

        self.broadcast(ServerMessage::PlayerDeath {
            player_id,
            killer_monster_id: killer,
        });
    }

    pub fn recalculate_player_stats(&mut self, player_id: PlayerId) -> Result<(), anyhow::Error> {
        let catalog = self.catalog.clone();
        let Some(player) = self.players.get_mut(player_id) else {
            return Ok(());
        };
        recalculate_stats(
            &mut player.character,
            &player.inventory,
            &player.effects,
            &catalog,
        )
    }

    pub fn emit_stats_update(&mut self, player_id: PlayerId) {
        let Some(player) = self.players.get(player_id) else {
            return;
        };
        let message = ServerMessage::PlayerStatsUpdate {
            player_id,
            health: player.character.health.0,
            max_health: player.character.derived_stats.max_health,
            mana: player.character.mana.0,
            max_mana: player.character.derived_stats.max_mana,
        };
        self.broadcast(message);
    }
}
