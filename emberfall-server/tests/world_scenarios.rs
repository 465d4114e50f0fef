//! End-to-end scenarios driven against an in-process world and a
//! temporary store, the same way the session handlers drive them.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use emberfall_data::{ContentCatalog, EquipmentSlot, SkillId};
use emberfall_game_common::components::WorldPosition;
use emberfall_game_common::ids::{ItemInstanceId, PlayerId};
use emberfall_game_common::messages::ServerMessage;

use emberfall_server::game::character_creator::create_character;
use emberfall_server::game::items;
use emberfall_server::game::monsters::{Monster, MonsterRecord, MonsterRegistry};
use emberfall_server::game::movement::{apply_move_request, MoveRejection};
use emberfall_server::game::players::Player;
use emberfall_server::game::skills::{use_skill, SkillRequest};
use emberfall_server::game::time::GameTime;
use emberfall_server::game::world::{Outbound, World, WorldConfig};
use emberfall_server::storage::{JsonStore, PersistenceStore, StorageError};

fn fixture_catalog() -> Arc<ContentCatalog> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    Arc::new(ContentCatalog::load(&dir).expect("fixture catalog loads"))
}

struct Harness {
    world: Arc<Mutex<World>>,
    store: Arc<dyn PersistenceStore>,
    _store_dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let catalog = fixture_catalog();
    let store_dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn PersistenceStore> = Arc::new(
        JsonStore::open_with_backoff(store_dir.path(), Duration::ZERO).unwrap(),
    );
    let world = World::new(
        catalog,
        store.clone(),
        MonsterRegistry::default(),
        WorldConfig::default(),
        42,
    );
    Harness {
        world: Arc::new(Mutex::new(world)),
        store,
        _store_dir: store_dir,
    }
}

/// Register, persist and enter a fresh Warrior the way the gateway
/// does at `selectCharacter`.
fn enter_world(harness: &Harness, session: u64, name: &str, position: WorldPosition) -> PlayerId {
    let account = harness
        .store
        .create_account(&format!("account{}", session), "hunter7")
        .unwrap();

    let mut world = harness.world.lock();
    let store = harness.store.clone();
    let (mut character, inventory) = create_character(
        &world.catalog,
        name,
        "human",
        "Warrior",
        position,
        || Ok(store.alloc_item_instance_id()?),
    )
    .unwrap();
    character.position = position;
    let id = harness
        .store
        .create_character(account, &character, &inventory)
        .unwrap();
    character.id = id;

    let player_id = PlayerId(session);
    world
        .players
        .insert(Player::new(player_id, character, inventory, 0));
    player_id
}

fn spawn_slime(world: &mut World, id: u32, position: WorldPosition) {
    world.monsters.insert(Monster::from_record(MonsterRecord {
        id: emberfall_game_common::ids::MonsterInstanceId(id),
        template: emberfall_data::MonsterId::new(1),
        position,
        health: 20,
        is_alive: true,
        last_respawn_ms: 0,
    }));
}

#[test]
fn login_success_returns_a_positive_account_id() {
    let harness = harness();
    let created = harness.store.create_account("alice", "hunter7").unwrap();
    let logged_in = harness.store.validate_login("alice", "hunter7").unwrap();
    assert_eq!(created, logged_in);
    assert!(logged_in.is_valid());
}

#[test]
fn lockout_short_circuits_before_the_store() {
    let harness = harness();
    harness.store.create_account("alice", "hunter7").unwrap();

    for _ in 0..5 {
        assert!(matches!(
            harness.store.validate_login("alice", "wrong1"),
            Err(StorageError::InvalidCredentials)
        ));
    }

    // Sixth attempt: locked out, answered from memory.
    let started = Instant::now();
    let result = harness.store.validate_login("alice", "hunter7");
    let elapsed = started.elapsed();
    assert!(matches!(result, Err(StorageError::AccountLocked)));
    assert!(
        elapsed < Duration::from_millis(10),
        "lockout answer took {:?}",
        elapsed
    );
}

#[test]
fn kill_and_loot_a_slime() {
    let harness = harness();
    let player_id = enter_world(&harness, 1, "Aria", WorldPosition::new(0.0, 0.0, 0.0));

    let mut world = harness.world.lock();
    // Level-1 fixture Warrior: attack 20, attack speed 1.0, range 2.0.
    assert_eq!(
        world
            .players
            .get(player_id)
            .unwrap()
            .character
            .derived_stats
            .attack_power,
        20
    );

    spawn_slime(&mut world, 1, WorldPosition::new(1.0, 0.0, 0.0));
    world.players.get_mut(player_id).unwrap().combat_target =
        Some(emberfall_game_common::ids::MonsterInstanceId(1));

    let mut attacks = 0;
    let mut now = 1_000;
    for _ in 0..10 {
        now += 1_100;
        world.tick(GameTime::from_ms(now), 0.05);
        let outbox = world.take_outbox();
        attacks += outbox
            .iter()
            .filter(|out| matches!(out, Outbound::Broadcast(ServerMessage::PlayerAttack { .. })))
            .count();
        let killed = outbox.iter().any(|out| {
            matches!(
                out,
                Outbound::To(_, ServerMessage::LootReceived { gold, .. })
                    if (5..=15).contains(gold)
            )
        });
        if killed {
            break;
        }
    }

    assert!(attacks <= 2, "took {} attacks to kill a 20 hp slime", attacks);
    let player = world.players.get(player_id).unwrap();
    assert!(player.character.experience.0 >= 10);
    assert!(player.inventory.gold >= 5);
    assert!(!world
        .monsters
        .get(emberfall_game_common::ids::MonsterInstanceId(1))
        .unwrap()
        .is_alive);
}

#[test]
fn area_skill_hits_exactly_the_monsters_in_radius() {
    let harness = harness();
    let player_id = enter_world(&harness, 1, "Aria", WorldPosition::new(0.0, 0.0, 0.0));

    let mut world = harness.world.lock();
    spawn_slime(&mut world, 1, WorldPosition::new(10.0, 0.0, 0.0));
    spawn_slime(&mut world, 2, WorldPosition::new(12.0, 0.0, 0.0));
    spawn_slime(&mut world, 3, WorldPosition::new(14.0, 0.0, 0.0));

    world
        .players
        .get_mut(player_id)
        .unwrap()
        .character
        .skills
        .try_learn(SkillId::new(6), 1)
        .unwrap();

    use_skill(
        &mut world,
        player_id,
        SkillRequest {
            skill: SkillId::new(6),
            target: None,
            target_position: Some(WorldPosition::new(10.0, 0.0, 0.0)),
        },
        GameTime::from_ms(60_000),
    )
    .unwrap();

    let outbox = world.take_outbox();
    let result = outbox
        .iter()
        .find_map(|out| match out {
            Outbound::Broadcast(ServerMessage::SkillUsed { result }) => Some(result),
            _ => None,
        })
        .expect("skillUsed broadcast missing");
    assert_eq!(result.targets.len(), 2);

    let ids: Vec<u32> = result.targets.iter().map(|target| target.monster_id.0).collect();
    assert!(ids.contains(&1));
    assert!(ids.contains(&2));
    assert!(!ids.contains(&3));
}

#[test]
fn equip_unequip_round_trip_is_identity() {
    let harness = harness();
    let player_id = enter_world(&harness, 1, "Aria", WorldPosition::new(0.0, 0.0, 0.0));

    let mut world = harness.world.lock();
    let helm_id = harness.store.alloc_item_instance_id().unwrap();
    {
        let player = world.players.get_mut(player_id).unwrap();
        player
            .inventory
            .items
            .push(emberfall_game_common::components::ItemInstance {
                instance_id: helm_id,
                item: emberfall_data::ItemId::new(3),
                quantity: 1,
                slot: 10,
                is_equipped: false,
            });
    }

    let (stats_before, items_before): (_, std::collections::BTreeSet<ItemInstanceId>) = {
        let player = world.players.get(player_id).unwrap();
        (
            player.character.derived_stats,
            player
                .inventory
                .items
                .iter()
                .map(|item| item.instance_id)
                .collect(),
        )
    };

    items::equip_item(&mut world, player_id, helm_id).unwrap();
    items::unequip_item(&mut world, player_id, EquipmentSlot::Helmet).unwrap();

    let player = world.players.get(player_id).unwrap();
    assert_eq!(player.character.derived_stats, stats_before);
    let items_after: std::collections::BTreeSet<ItemInstanceId> = player
        .inventory
        .items
        .iter()
        .map(|item| item.instance_id)
        .collect();
    assert_eq!(items_after, items_before);
    assert!(player.inventory.equipment[EquipmentSlot::Helmet].is_none());
}

#[test]
fn speed_hack_reverts_to_the_last_accepted_position() {
    let harness = harness();
    let player_id = enter_world(&harness, 1, "Aria", WorldPosition::new(0.0, 0.0, 0.0));

    let mut world = harness.world.lock();

    // A sane move first: 5 units over a full second.
    let first_target = WorldPosition::new(5.0, 0.0, 0.0);
    let accepted =
        apply_move_request(&mut world, player_id, first_target, GameTime::from_ms(1_000));
    assert_eq!(accepted.unwrap(), first_target);

    // 10 more units only 100 ms later: 100 u/s, rejected silently.
    let second_target = WorldPosition::new(5.0, 10.0, 0.0);
    let rejected =
        apply_move_request(&mut world, player_id, second_target, GameTime::from_ms(1_100));
    assert_eq!(rejected.unwrap_err(), MoveRejection::SpeedHack);

    let player = world.players.get(player_id).unwrap();
    assert_eq!(player.character.position, first_target);
}

#[test]
fn disconnect_persists_through_the_store() {
    let harness = harness();
    let player_id = enter_world(&harness, 1, "Aria", WorldPosition::new(3.0, 4.0, 0.0));

    // Mutate some state, then persist the way session cleanup does.
    let (character, inventory) = {
        let mut world = harness.world.lock();
        {
            let player = world.players.get_mut(player_id).unwrap();
            player.character.set_health(17);
            player.inventory.add_gold(99);
        }
        let player = world.players.remove(player_id).unwrap();
        (player.character, player.inventory)
    };
    harness.store.update_character(&character).unwrap();
    harness.store.save_inventory(&inventory).unwrap();

    let reloaded = harness.store.load_character(character.id).unwrap();
    assert_eq!(reloaded.health.0, 17);
    let reloaded_inventory = harness.store.load_inventory(character.id).unwrap();
    assert_eq!(reloaded_inventory.gold, inventory.gold);
}
