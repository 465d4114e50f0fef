use emberfall_data::{DamageType, SkillData, SkillId, SkillTargetType};
use emberfall_game_common::components::{ActiveEffect, EffectSource, WorldPosition};
use emberfall_game_common::ids::{MonsterInstanceId, PlayerId};
use emberfall_game_common::messages::{
    ServerMessage, SkillFailReason, SkillTargetResult, SkillUseResult,
};

use crate::game::combat;
use crate::game::players::PendingCast;
use crate::game::time::GameTime;
use crate::game::world::World;

#[derive(Clone, Debug)]
pub struct SkillRequest {
    pub skill: SkillId,
    pub target: Option<MonsterInstanceId>,
    pub target_position: Option<WorldPosition>,
}

/// Validation for `useSkill`, in the documented order, stopping at
/// the first failure.
fn validate_use(
    world: &World,
    player_id: PlayerId,
    request: &SkillRequest,
    time: GameTime,
) -> Result<(), SkillFailReason> {
    let player = world
        .players
        .get(player_id)
        .ok_or(SkillFailReason::ExecutionError)?;

    // 1. Caster alive.
    if player.character.is_dead {
        return Err(SkillFailReason::PlayerDead);
    }

    // 2. Skill learned.
    let learned = player
        .character
        .skills
        .find(request.skill)
        .ok_or(SkillFailReason::SkillNotLearned)?;

    // 3. Template known.
    let data = world
        .catalog
        .skills
        .get_skill(request.skill)
        .ok_or(SkillFailReason::SkillNotFound)?;

    // 4. Off cooldown.
    if time.now_ms - learned.last_used_ms < (data.cooldown * 1000.0) as i64 {
        return Err(SkillFailReason::Cooldown);
    }

    // 5. Level table row exists.
    let _level_data = data
        .level_data(learned.level)
        .ok_or(SkillFailReason::InvalidLevel)?;

    // 6. Resource costs payable.
    if player.character.mana.0 < data.mana_cost {
        return Err(SkillFailReason::NoMana);
    }
    if player.character.health.0 <= data.health_cost {
        return Err(SkillFailReason::NoHealth);
    }

    // 7. Target reachable.
    match data.target_type {
        SkillTargetType::Enemy => {
            let monster_id = request.target.ok_or(SkillFailReason::OutOfRange)?;
            let monster = world
                .monsters
                .get(monster_id)
                .filter(|monster| monster.is_alive)
                .ok_or(SkillFailReason::OutOfRange)?;
            if player.character.position.distance_2d(&monster.position) > data.range {
                return Err(SkillFailReason::OutOfRange);
            }
        }
        SkillTargetType::SelfTarget | SkillTargetType::Ally | SkillTargetType::Area => {}
    }

    Ok(())
}

/// Entry point for the `useSkill` message. Skills with a cast time
/// re-validate and pay their costs at resolution, never up front.
pub fn use_skill(
    world: &mut World,
    player_id: PlayerId,
    request: SkillRequest,
    time: GameTime,
) -> Result<(), SkillFailReason> {
    validate_use(world, player_id, &request, time)?;

    let cast_time = world
        .catalog
        .skills
        .get_skill(request.skill)
        .map(|data| data.cast_time)
        .unwrap_or(0.0);

    if cast_time > 0.0 {
        if let Some(player) = world.players.get_mut(player_id) {
            player.pending_cast = Some(PendingCast {
                skill: request.skill,
                target: request.target,
                target_position: request.target_position,
                resolve_at_ms: time.plus_seconds(cast_time),
            });
        }
        world.broadcast(ServerMessage::CastStarted {
            player_id,
            skill_id: request.skill,
            cast_time,
        });
        return Ok(());
    }

    resolve_skill(world, player_id, request, time)
}

pub fn cancel_cast(world: &mut World, player_id: PlayerId) {
    let cancelled = world
        .players
        .get_mut(player_id)
        .and_then(|player| player.pending_cast.take());
    if let Some(pending) = cancelled {
        world.broadcast(ServerMessage::CastCancelled {
            player_id,
            skill_id: pending.skill,
        });
    }
}

/// Called from the session handler each time a cast may have
/// finished; the runtime also sweeps pending casts every tick.
pub fn resolve_due_casts(world: &mut World, time: GameTime) {
    let due: Vec<(PlayerId, PendingCast)> = world
        .players
        .iter()
        .filter_map(|player| {
            player
                .pending_cast
                .as_ref()
                .filter(|pending| pending.resolve_at_ms <= time.now_ms)
                .map(|pending| (player.id, pending.clone()))
        })
        .collect();

    for (player_id, pending) in due {
        if let Some(player) = world.players.get_mut(player_id) {
            player.pending_cast = None;
        }
        let request = SkillRequest {
            skill: pending.skill,
            target: pending.target,
            target_position: pending.target_position,
        };
        if let Err(reason) = resolve_skill(world, player_id, request, time) {
            world.send_to(
                player_id,
                ServerMessage::SkillUseFailed {
                    skill_id: pending.skill,
                    reason,
                },
            );
        }
    }
}

fn resolve_skill(
    world: &mut World,
    player_id: PlayerId,
    request: SkillRequest,
    time: GameTime,
) -> Result<(), SkillFailReason> {
    // Re-validation covers the cast-time window.
    validate_use(world, player_id, &request, time)?;

    let data = world
        .catalog
        .skills
        .get_skill(request.skill)
        .ok_or(SkillFailReason::SkillNotFound)?
        .clone();
    let level = world
        .players
        .get(player_id)
        .and_then(|player| player.character.skills.find(request.skill))
        .map(|learned| learned.level)
        .ok_or(SkillFailReason::SkillNotLearned)?;
    let level_data = *data
        .level_data(level)
        .ok_or(SkillFailReason::InvalidLevel)?;

    // Costs and cooldown commit together, at resolution.
    {
        let player = world
            .players
            .get_mut(player_id)
            .ok_or(SkillFailReason::ExecutionError)?;
        player
            .character
            .set_mana(player.character.mana.0 - data.mana_cost);
        if data.health_cost > 0 {
            player
                .character
                .set_health(player.character.health.0 - data.health_cost);
        }
        if let Some(learned) = player.character.skills.find_mut(request.skill) {
            learned.last_used_ms = time.now_ms;
        }
    }

    let mut targets = Vec::new();
    let mut healing = 0;

    match data.target_type {
        SkillTargetType::Enemy => {
            let monster_id = request.target.ok_or(SkillFailReason::OutOfRange)?;
            let result = strike_monster(world, player_id, monster_id, &data, &level_data, time)
                .map_err(|_| SkillFailReason::ExecutionError)?;
            targets.push(result);
        }
        SkillTargetType::Area => {
            // Centre on the requested position, falling back to the
            // caster.
            let center = request.target_position.unwrap_or(
                world
                    .players
                    .get(player_id)
                    .map(|player| player.character.position)
                    .unwrap_or_default(),
            );
            let in_radius: Vec<MonsterInstanceId> = world
                .monsters
                .iter()
                .filter(|monster| monster.is_alive)
                .filter(|monster| monster.position.distance_2d(&center) <= data.area_radius)
                .map(|monster| monster.id)
                .collect();
            for monster_id in in_radius {
                let result =
                    strike_monster(world, player_id, monster_id, &data, &level_data, time)
                        .map_err(|_| SkillFailReason::ExecutionError)?;
                targets.push(result);
            }
        }
        SkillTargetType::SelfTarget | SkillTargetType::Ally => {
            // TODO: route Ally casts at a chosen party member once
            // parties exist; until then they self-cast.
            healing = apply_self_effects(world, player_id, &data, &level_data, time);
        }
    }

    let (health, mana) = world
        .players
        .get(player_id)
        .map(|player| (player.character.health.0, player.character.mana.0))
        .unwrap_or((0, 0));

    let message = ServerMessage::SkillUsed {
        result: SkillUseResult {
            player_id,
            skill_id: request.skill,
            targets,
            healing,
            health,
            mana,
        },
    };
    world.broadcast(message);

    Ok(())
}

fn strike_monster(
    world: &mut World,
    player_id: PlayerId,
    monster_id: MonsterInstanceId,
    data: &SkillData,
    level_data: &emberfall_data::SkillLevelData,
    time: GameTime,
) -> Result<SkillTargetResult, anyhow::Error> {
    let (power, crit_chance) = {
        let player = world
            .players
            .get(player_id)
            .ok_or_else(|| anyhow::anyhow!("caster vanished"))?;
        let stats = &player.character.derived_stats;
        let power = match data.damage_type {
            DamageType::Magical => stats.magic_power,
            _ => stats.attack_power,
        };
        let crit = combat::base_crit_chance(
            data.damage_type,
            player.character.basic_stats.dexterity,
            player.character.basic_stats.intellect,
        ) + level_data.crit_chance_bonus;
        (power, crit)
    };

    let defense = world
        .monsters
        .get(monster_id)
        .and_then(|monster| world.catalog.monsters.get_monster(monster.template))
        .map(|monster_data| monster_data.defense)
        .unwrap_or(0);

    let raw = power as f32 * level_data.damage_multiplier + level_data.base_damage as f32;
    let damage = match data.damage_type {
        DamageType::True => emberfall_game_common::data::Damage {
            amount: raw.round().max(1.0) as i32,
            is_critical: false,
        },
        _ => combat::compute_damage(&mut world.rng, raw, crit_chance, defense),
    };

    let hit = world.apply_damage_to_monster(monster_id, player_id, damage, Some(data.id), time)?;

    // Lingering effects land only on survivors.
    if !hit.killed {
        apply_monster_effects(world, player_id, monster_id, data, time);
    }

    Ok(SkillTargetResult {
        monster_id,
        damage: hit.damage,
        remaining_health: hit.remaining,
        killed: hit.killed,
    })
}

fn apply_monster_effects(
    world: &mut World,
    source: PlayerId,
    monster_id: MonsterInstanceId,
    data: &SkillData,
    time: GameTime,
) {
    for effect in &data.effects {
        let id = world.next_effect_id();
        if let Some(monster) = world.monsters.get_mut(monster_id) {
            monster.effects.apply(ActiveEffect {
                id,
                skill: data.id,
                kind: effect.kind,
                target_stat: effect.target_stat,
                value: effect.value,
                applied_at_ms: time.now_ms,
                duration_ms: (effect.duration * 1000.0) as i64,
                source: EffectSource::Player(source),
            });
        }
    }
}

fn apply_self_effects(
    world: &mut World,
    player_id: PlayerId,
    data: &SkillData,
    level_data: &emberfall_data::SkillLevelData,
    time: GameTime,
) -> i32 {
    let mut healing = 0;
    let mut applied_buff = false;

    {
        let Some(player) = world.players.get_mut(player_id) else {
            return 0;
        };

        if level_data.base_healing > 0 || level_data.damage_multiplier > 0.0 {
            let amount = level_data.base_healing
                + (player.character.derived_stats.magic_power as f32
                    * level_data.damage_multiplier) as i32;
            if amount > 0 {
                let before = player.character.health.0;
                player
                    .character
                    .set_health(player.character.health.0 + amount);
                healing = player.character.health.0 - before;
            }
        }
    }

    for effect in &data.effects {
        let id = world.next_effect_id();
        if let Some(player) = world.players.get_mut(player_id) {
            player.effects.apply(ActiveEffect {
                id,
                skill: data.id,
                kind: effect.kind,
                target_stat: effect.target_stat,
                value: effect.value,
                applied_at_ms: time.now_ms,
                duration_ms: (effect.duration * 1000.0) as i64,
                source: EffectSource::Player(player_id),
            });
            applied_buff = true;
        }
    }

    if applied_buff {
        if let Err(error) = world.recalculate_player_stats(player_id) {
            log::error!("Stat recompute after buff failed: {:#}", error);
        }
    }
    world.emit_stats_update(player_id);

    healing
}

/// `learnSkill`: class, level, slot and duplicate checks, then a
/// transactional persist of the new list.
pub fn learn_skill(
    world: &mut World,
    player_id: PlayerId,
    skill_id: SkillId,
    slot: u8,
) -> Result<(SkillId, String, u8), String> {
    let data = world
        .catalog
        .skills
        .get_skill(skill_id)
        .ok_or_else(|| String::from("Unknown skill"))?
        .clone();

    let character_id = {
        let player = world
            .players
            .get(player_id)
            .ok_or_else(|| String::from("Not in world"))?;

        if !(1..=9).contains(&slot) {
            return Err(String::from("Slot must be between 1 and 9"));
        }
        if player.character.level.0 < data.required_level {
            return Err(String::from("Level too low"));
        }
        if let Some(required) = data.required_class {
            if player.character.info.class != required {
                return Err(String::from("Your class cannot learn this skill"));
            }
        }
        if player.character.skills.contains(skill_id) {
            return Err(String::from("Skill already learned"));
        }
        player.character.id
    };

    {
        let player = world
            .players
            .get_mut(player_id)
            .ok_or_else(|| String::from("Not in world"))?;
        if player.character.skills.try_learn(skill_id, slot).is_err() {
            return Err(String::from("Skill already learned"));
        }
    }

    // Persist together with the learned-skill insert; unwind the
    // in-memory learn when the store fails.
    let skills = world
        .players
        .get(player_id)
        .map(|player| player.character.skills.clone())
        .ok_or_else(|| String::from("Not in world"))?;
    if let Err(error) = world.store.save_skills(character_id, &skills) {
        log::error!("Failed to persist learned skill: {}", error);
        if let Some(player) = world.players.get_mut(player_id) {
            player.character.skills = {
                let mut rolled_back = skills.clone();
                rolled_back.remove(skill_id);
                rolled_back
            };
        }
        return Err(String::from("Could not save your skills, try again"));
    }

    Ok((skill_id, data.name, slot))
}

/// `levelUpSkill`: spends status points per the next level's row.
/// Both the point spend and the level bump roll back if the store
/// write fails.
pub fn level_up_skill(
    world: &mut World,
    player_id: PlayerId,
    skill_id: SkillId,
) -> Result<(u32, i32), String> {
    let data = world
        .catalog
        .skills
        .get_skill(skill_id)
        .ok_or_else(|| String::from("Unknown skill"))?
        .clone();

    let (character_id, new_level, cost) = {
        let player = world
            .players
            .get(player_id)
            .ok_or_else(|| String::from("Not in world"))?;
        let learned = player
            .character
            .skills
            .find(skill_id)
            .ok_or_else(|| String::from("Skill not learned"))?;

        let new_level = learned.level + 1;
        if new_level > data.max_level {
            return Err(String::from("Skill is already at its maximum level"));
        }
        let next_row = data
            .level_data(new_level)
            .ok_or_else(|| String::from("Skill is already at its maximum level"))?;
        if player.character.status_points.0 < next_row.status_point_cost {
            return Err(String::from("Not enough status points"));
        }
        (player.character.id, new_level, next_row.status_point_cost)
    };

    {
        let player = world
            .players
            .get_mut(player_id)
            .ok_or_else(|| String::from("Not in world"))?;
        player.character.status_points.0 -= cost;
        if let Some(learned) = player.character.skills.find_mut(skill_id) {
            learned.level = new_level;
        }
    }

    let (character, status_points) = {
        let player = world
            .players
            .get(player_id)
            .ok_or_else(|| String::from("Not in world"))?;
        (player.character.clone(), player.character.status_points.0)
    };
    if let Err(error) = world.store.update_character(&character) {
        log::error!("Failed to persist skill level-up: {}", error);
        // Unwind both the point spend and the level bump.
        if let Some(player) = world.players.get_mut(player_id) {
            player.character.status_points.0 += cost;
            if let Some(learned) = player.character.skills.find_mut(skill_id) {
                learned.level = new_level - 1;
            }
        }
        return Err(String::from("Could not save your skills, try again"));
    }

    Ok((new_level, status_points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::tests::{add_test_monster, add_test_player, test_world};
    use crate::game::world::Outbound;
    use emberfall_game_common::components::WorldPosition;

    fn learn(world: &mut World, player_id: PlayerId, skill: u32, slot: u8) {
        learn_skill(world, player_id, SkillId::new(skill), slot).unwrap();
    }

    #[test]
    fn validation_order_reports_the_first_failure() {
        let mut test = test_world();
        let world = &mut test.world;
        let player_id = add_test_player(world, 1, WorldPosition::default());
        let time = GameTime::from_ms(100_000);

        // Not learned beats not-found in the documented order.
        let request = SkillRequest {
            skill: SkillId::new(999),
            target: None,
            target_position: None,
        };
        assert_eq!(
            use_skill(world, player_id, request.clone(), time),
            Err(SkillFailReason::SkillNotLearned)
        );

        // Dead caster outranks everything.
        world
            .players
            .get_mut(player_id)
            .unwrap()
            .character
            .set_health(0);
        assert_eq!(
            use_skill(world, player_id, request, time),
            Err(SkillFailReason::PlayerDead)
        );
    }

    #[test]
    fn cooldown_and_mana_failures() {
        let mut test = test_world();
        let world = &mut test.world;
        let player_id = add_test_player(world, 1, WorldPosition::default());
        let monster_id = add_test_monster(world, 1, 1, WorldPosition::new(1.0, 0.0, 0.0));
        learn(world, player_id, 3, 1);

        let request = SkillRequest {
            skill: SkillId::new(3),
            target: Some(monster_id),
            target_position: None,
        };

        use_skill(world, player_id, request.clone(), GameTime::from_ms(100_000)).unwrap();
        // Immediately again: cooldown (4s).
        assert_eq!(
            use_skill(world, player_id, request.clone(), GameTime::from_ms(101_000)),
            Err(SkillFailReason::Cooldown)
        );

        // After the cooldown, drain mana and expect NO_MANA.
        world
            .players
            .get_mut(player_id)
            .unwrap()
            .character
            .set_mana(0);
        assert_eq!(
            use_skill(world, player_id, request, GameTime::from_ms(105_000)),
            Err(SkillFailReason::NoMana)
        );
    }

    #[test]
    fn enemy_skill_needs_a_live_target_in_range() {
        let mut test = test_world();
        let world = &mut test.world;
        let player_id = add_test_player(world, 1, WorldPosition::default());
        let monster_id = add_test_monster(world, 1, 1, WorldPosition::new(50.0, 0.0, 0.0));
        learn(world, player_id, 3, 1);

        // Power Strike reaches 2.5; the slime is 50 away.
        let request = SkillRequest {
            skill: SkillId::new(3),
            target: Some(monster_id),
            target_position: None,
        };
        assert_eq!(
            use_skill(world, player_id, request, GameTime::from_ms(100_000)),
            Err(SkillFailReason::OutOfRange)
        );
    }

    #[test]
    fn area_skill_hits_only_monsters_in_radius() {
        let mut test = test_world();
        let world = &mut test.world;
        let player_id = add_test_player(world, 1, WorldPosition::default());
        // Radius 3 around (10, 0, 0): the first two qualify.
        add_test_monster(world, 1, 1, WorldPosition::new(10.0, 0.0, 0.0));
        add_test_monster(world, 2, 1, WorldPosition::new(12.0, 0.0, 0.0));
        add_test_monster(world, 3, 1, WorldPosition::new(14.0, 0.0, 0.0));
        learn(world, player_id, 6, 1);

        use_skill(
            world,
            player_id,
            SkillRequest {
                skill: SkillId::new(6),
                target: None,
                target_position: Some(WorldPosition::new(10.0, 0.0, 0.0)),
            },
            GameTime::from_ms(100_000),
        )
        .unwrap();

        let outbox = world.take_outbox();
        let result = outbox
            .iter()
            .find_map(|outbound| match outbound {
                Outbound::Broadcast(ServerMessage::SkillUsed { result }) => Some(result),
                _ => None,
            })
            .expect("no skillUsed broadcast");
        assert_eq!(result.targets.len(), 2);
    }

    #[test]
    fn self_heal_clamps_to_max() {
        let mut test = test_world();
        let world = &mut test.world;
        let player_id = add_test_player(world, 1, WorldPosition::default());
        learn(world, player_id, 5, 1);

        {
            let player = world.players.get_mut(player_id).unwrap();
            let max = player.character.derived_stats.max_health;
            player.character.set_health(max - 5);
        }

        use_skill(
            world,
            player_id,
            SkillRequest {
                skill: SkillId::new(5),
                target: None,
                target_position: None,
            },
            GameTime::from_ms(100_000),
        )
        .unwrap();

        let player = world.players.get(player_id).unwrap();
        assert_eq!(
            player.character.health.0,
            player.character.derived_stats.max_health
        );
    }

    #[test]
    fn buff_skill_applies_and_boosts_stats() {
        let mut test = test_world();
        let world = &mut test.world;
        let player_id = add_test_player(world, 1, WorldPosition::default());
        learn(world, player_id, 7, 1);

        let base_attack = world
            .players
            .get(player_id)
            .unwrap()
            .character
            .derived_stats
            .attack_power;

        use_skill(
            world,
            player_id,
            SkillRequest {
                skill: SkillId::new(7),
                target: None,
                target_position: None,
            },
            GameTime::from_ms(100_000),
        )
        .unwrap();

        let player = world.players.get(player_id).unwrap();
        assert_eq!(player.character.derived_stats.attack_power, base_attack + 10);
    }

    #[test]
    fn cast_time_defers_resolution_and_movement_cancels() {
        let mut test = test_world();
        let world = &mut test.world;
        let player_id = add_test_player(world, 1, WorldPosition::default());
        let monster_id = add_test_monster(world, 1, 1, WorldPosition::new(2.0, 0.0, 0.0));
        learn(world, player_id, 8, 1);

        let mana_before = world.players.get(player_id).unwrap().character.mana.0;

        use_skill(
            world,
            player_id,
            SkillRequest {
                skill: SkillId::new(8),
                target: Some(monster_id),
                target_position: None,
            },
            GameTime::from_ms(100_000),
        )
        .unwrap();

        // Nothing resolved yet: no cost deducted.
        {
            let player = world.players.get(player_id).unwrap();
            assert!(player.pending_cast.is_some());
            assert_eq!(player.character.mana.0, mana_before);
        }

        // Not due yet.
        resolve_due_casts(world, GameTime::from_ms(101_000));
        assert!(world.players.get(player_id).unwrap().pending_cast.is_some());

        // Due at 1.5s: resolves and pays.
        resolve_due_casts(world, GameTime::from_ms(101_500));
        let player = world.players.get(player_id).unwrap();
        assert!(player.pending_cast.is_none());
        assert_eq!(player.character.mana.0, mana_before - 5);
        assert!(world.monsters.get(monster_id).unwrap().health < 20);
    }

    #[test]
    fn cancel_cast_aborts_without_cost() {
        let mut test = test_world();
        let world = &mut test.world;
        let player_id = add_test_player(world, 1, WorldPosition::default());
        let monster_id = add_test_monster(world, 1, 1, WorldPosition::new(2.0, 0.0, 0.0));
        learn(world, player_id, 8, 1);

        let mana_before = world.players.get(player_id).unwrap().character.mana.0;
        use_skill(
            world,
            player_id,
            SkillRequest {
                skill: SkillId::new(8),
                target: Some(monster_id),
                target_position: None,
            },
            GameTime::from_ms(100_000),
        )
        .unwrap();

        cancel_cast(world, player_id);
        resolve_due_casts(world, GameTime::from_ms(102_000));

        let player = world.players.get(player_id).unwrap();
        assert!(player.pending_cast.is_none());
        assert_eq!(player.character.mana.0, mana_before);
        assert_eq!(world.monsters.get(monster_id).unwrap().health, 20);
    }

    #[test]
    fn learn_skill_checks_class_level_and_duplicates() {
        let mut test = test_world();
        let world = &mut test.world;
        let player_id = add_test_player(world, 1, WorldPosition::default());

        // Skill 9 requires level 10 and the Mage class.
        assert!(learn_skill(world, player_id, SkillId::new(9), 1).is_err());
        assert!(learn_skill(world, player_id, SkillId::new(3), 0).is_err());
        learn_skill(world, player_id, SkillId::new(3), 1).unwrap();
        assert!(learn_skill(world, player_id, SkillId::new(3), 2).is_err());
    }

    #[test]
    fn level_up_skill_spends_status_points() {
        let mut test = test_world();
        let world = &mut test.world;
        let player_id = add_test_player(world, 1, WorldPosition::default());
        learn(world, player_id, 3, 1);

        // No points yet.
        assert!(level_up_skill(world, player_id, SkillId::new(3)).is_err());

        world
            .players
            .get_mut(player_id)
            .unwrap()
            .character
            .status_points
            .0 = 10;
        let (new_level, remaining) = level_up_skill(world, player_id, SkillId::new(3)).unwrap();
        assert_eq!(new_level, 2);
        assert_eq!(remaining, 8);

        // Level 3 costs 3 more points.
        let (new_level, remaining) = level_up_skill(world, player_id, SkillId::new(3)).unwrap();
        assert_eq!(new_level, 3);
        assert_eq!(remaining, 5);

        // Max level reached.
        assert!(level_up_skill(world, player_id, SkillId::new(3)).is_err());
    }
}
