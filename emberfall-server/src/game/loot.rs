use anyhow::anyhow;
use rand::Rng;

use emberfall_data::LootTableId;
use emberfall_game_common::ids::{MonsterInstanceId, PlayerId};
use emberfall_game_common::messages::{LootedItem, ServerMessage};

use crate::game::time::GameTime;
use crate::game::world::World;

/// Roll a dead monster's loot table and hand everything to the
/// killer. Runs inside the per-monster loot critical section taken by
/// `apply_damage_to_monster`, so one death yields exactly one roll.
pub fn resolve_loot(
    world: &mut World,
    monster_id: MonsterInstanceId,
    table_id: LootTableId,
    killer: PlayerId,
    _time: GameTime,
) -> Result<(), anyhow::Error> {
    // The caller marked the monster dead before rolling; if it is
    // somehow alive again the death path was not taken and no loot is
    // owed.
    if world
        .monsters
        .get(monster_id)
        .map(|monster| monster.is_alive)
        .unwrap_or(true)
    {
        return Ok(());
    }

    let catalog = world.catalog.clone();
    let table = catalog
        .loot_tables
        .get_table(table_id)
        .ok_or_else(|| anyhow!("loot table {} not found", table_id))?;

    if !world.players.contains(killer) {
        // Killer disconnected between the strike and the roll; the
        // loot is forfeit rather than duplicated later.
        log::info!(
            "Discarding loot of monster {}: killer {} is gone",
            monster_id,
            killer
        );
        return Ok(());
    }

    let gold = if table.gold_max > table.gold_min {
        world.rng.gen_range(table.gold_min..=table.gold_max)
    } else {
        table.gold_min
    };

    // Each entry rolls independently.
    let mut rolled: Vec<(emberfall_data::ItemId, u32)> = Vec::new();
    for entry in &table.entries {
        if world.rng.gen::<f32>() >= entry.chance {
            continue;
        }
        let quantity = if entry.quantity_max > entry.quantity_min {
            world.rng.gen_range(entry.quantity_min..=entry.quantity_max)
        } else {
            entry.quantity_min
        };
        if quantity > 0 {
            rolled.push((entry.item, quantity));
        }
    }

    let mut items = Vec::new();
    let mut discarded = Vec::new();
    let store = world.store.clone();

    {
        let Some(player) = world.players.get_mut(killer) else {
            return Ok(());
        };

        for (item_id, quantity) in rolled {
            let Some(item_data) = catalog.items.get_item(item_id) else {
                log::error!("Loot table {} references unknown item {}", table_id, item_id);
                continue;
            };
            let looted = LootedItem {
                item: item_id,
                name: item_data.name.clone(),
                quantity,
            };

            // Allocate eagerly; an id skipped by a stack merge stays
            // unused, which keeps the sequence strictly monotonic.
            let instance_id = match store.alloc_item_instance_id() {
                Ok(id) => id,
                Err(error) => {
                    log::error!("Item id allocation failed during loot: {}", error);
                    discarded.push(looted);
                    continue;
                }
            };
            let mut allocate = || instance_id;

            match player
                .inventory
                .try_add_item(item_data, quantity, &mut allocate)
            {
                Ok(_) => items.push(looted),
                Err(_) => {
                    log::info!(
                        "Discarding loot {} x{} for player {}: inventory full",
                        item_data.name,
                        quantity,
                        killer
                    );
                    discarded.push(looted);
                }
            }
        }

        player.inventory.add_gold(gold);
    }

    world.send_to(
        killer,
        ServerMessage::LootReceived {
            player_id: killer,
            monster_id,
            gold,
            items,
            discarded,
        },
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::tests::{add_test_monster, add_test_player, test_world};
    use crate::game::world::Outbound;
    use emberfall_game_common::components::WorldPosition;
    use emberfall_game_common::data::Damage;

    #[test]
    fn loot_gold_is_within_table_range() {
        let mut test = test_world();
        let world = &mut test.world;
        let player_id = add_test_player(world, 1, WorldPosition::default());
        let monster_id = add_test_monster(world, 1, 1, WorldPosition::default());

        world
            .apply_damage_to_monster(
                monster_id,
                player_id,
                Damage {
                    amount: 999,
                    is_critical: false,
                },
                None,
                GameTime::from_ms(1_000),
            )
            .unwrap();

        let gold = world.players.get(player_id).unwrap().inventory.gold;
        assert!((5..=15).contains(&gold), "gold {} outside [5, 15]", gold);

        let outbox = world.take_outbox();
        let loot = outbox.iter().find_map(|outbound| match outbound {
            Outbound::To(_, ServerMessage::LootReceived { gold, items, .. }) => {
                Some((gold, items))
            }
            _ => None,
        });
        let (loot_gold, loot_items) = loot.expect("no lootReceived event");
        assert_eq!(*loot_gold, gold);
        // Slime goo drops at 100% with quantity 1-2.
        assert_eq!(loot_items.len(), 1);
        assert!((1..=2).contains(&loot_items[0].quantity));
    }

    #[test]
    fn full_inventory_discards_items_but_keeps_gold() {
        let mut test = test_world();
        let world = &mut test.world;
        let player_id = add_test_player(world, 1, WorldPosition::default());
        let monster_id = add_test_monster(world, 1, 1, WorldPosition::default());

        world.players.get_mut(player_id).unwrap().inventory.max_slots = 0;

        world
            .apply_damage_to_monster(
                monster_id,
                player_id,
                Damage {
                    amount: 999,
                    is_critical: false,
                },
                None,
                GameTime::from_ms(1_000),
            )
            .unwrap();

        let player = world.players.get(player_id).unwrap();
        assert!(player.inventory.items.is_empty());
        assert!(player.inventory.gold >= 5);

        let outbox = world.take_outbox();
        let discarded = outbox.iter().any(|outbound| {
            matches!(
                outbound,
                Outbound::To(_, ServerMessage::LootReceived { discarded, .. }) if !discarded.is_empty()
            )
        });
        assert!(discarded);
    }
}
