use thiserror::Error;

use emberfall_data::{EffectTarget, EquipmentSlot, ItemType};
use emberfall_game_common::ids::{ItemInstanceId, PlayerId};
use emberfall_game_common::messages::{ItemUseFailReason, ServerMessage};

use crate::game::snapshots;
use crate::game::time::GameTime;
use crate::game::world::World;

/// Minimum seconds between consumables hitting the same resource bar.
pub const CONSUMABLE_COOLDOWN_MS: i64 = 1_000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ItemError {
    #[error("item not found")]
    NotFound,

    #[error("item cannot be used")]
    NotConsumable,

    #[error("item cannot be equipped")]
    NotEquipment,

    #[error("dead characters cannot use items")]
    PlayerDead,

    #[error("that effect is still on cooldown")]
    OnCooldown,

    #[error("health is already full")]
    HealthFull,

    #[error("mana is already full")]
    ManaFull,

    #[error("level too low for this item")]
    LevelRequirement,

    #[error("class cannot use this item")]
    ClassRequirement,

    #[error("item is already equipped")]
    AlreadyEquipped,

    #[error("no free inventory slot")]
    InventoryFull,

    #[error("nothing equipped in that slot")]
    NotEquipped,

    #[error("not enough of that item")]
    QuantityInsufficient,

    #[error("equipped items cannot be dropped")]
    ItemEquipped,

    #[error("persistence failed")]
    Persistence,
}

impl ItemError {
    /// Stable machine-readable code for failures without a dedicated
    /// typed response; carried in `error.message`.
    pub fn code(&self) -> &'static str {
        match self {
            ItemError::NotFound => "ITEM_NOT_FOUND",
            ItemError::NotConsumable => "NOT_CONSUMABLE",
            ItemError::NotEquipment => "NOT_EQUIPMENT",
            ItemError::PlayerDead => "PLAYER_DEAD",
            ItemError::OnCooldown => "ON_COOLDOWN",
            ItemError::HealthFull => "HP_FULL",
            ItemError::ManaFull => "MP_FULL",
            ItemError::LevelRequirement => "LEVEL_REQUIREMENT",
            ItemError::ClassRequirement => "CLASS_REQUIREMENT",
            ItemError::AlreadyEquipped => "ALREADY_EQUIPPED",
            ItemError::InventoryFull => "INVENTORY_FULL",
            ItemError::NotEquipped => "NOT_EQUIPPED",
            ItemError::QuantityInsufficient => "QUANTITY_INSUFFICIENT",
            ItemError::ItemEquipped => "ITEM_EQUIPPED",
            ItemError::Persistence => "INTERNAL_ERROR",
        }
    }

    pub fn use_fail_reason(&self) -> ItemUseFailReason {
        match self {
            ItemError::HealthFull => ItemUseFailReason::HpFull,
            ItemError::ManaFull => ItemUseFailReason::MpFull,
            ItemError::OnCooldown => ItemUseFailReason::OnCooldown,
            ItemError::NotConsumable => ItemUseFailReason::NotConsumable,
            ItemError::PlayerDead => ItemUseFailReason::PlayerDead,
            _ => ItemUseFailReason::NotFound,
        }
    }
}

fn persist_player(world: &World, player_id: PlayerId) -> Result<(), ItemError> {
    let Some(player) = world.players.get(player_id) else {
        return Err(ItemError::NotFound);
    };
    world
        .store
        .save_inventory(&player.inventory)
        .and_then(|_| world.store.update_character(&player.character))
        .map_err(|error| {
            log::error!("Failed to persist player {}: {}", player_id, error);
            ItemError::Persistence
        })
}

/// Consume one unit of a consumable, clamp-adding its effect.
pub fn use_item(
    world: &mut World,
    player_id: PlayerId,
    instance_id: ItemInstanceId,
    time: GameTime,
) -> Result<(), ItemError> {
    let catalog = world.catalog.clone();

    let (target, value) = {
        let player = world.players.get(player_id).ok_or(ItemError::NotFound)?;
        if player.character.is_dead {
            return Err(ItemError::PlayerDead);
        }

        let instance = player
            .inventory
            .find_item(instance_id)
            .ok_or(ItemError::NotFound)?;
        let item_data = catalog
            .items
            .get_item(instance.item)
            .ok_or(ItemError::NotFound)?;
        if item_data.item_type != ItemType::Consumable {
            return Err(ItemError::NotConsumable);
        }
        let effect = item_data.effect.ok_or(ItemError::NotConsumable)?;

        // One cooldown per (player, resource bar).
        if let Some(last_used) = world
            .consumable_cooldowns
            .get(&(player_id, effect.target))
        {
            if time.now_ms - *last_used < CONSUMABLE_COOLDOWN_MS {
                return Err(ItemError::OnCooldown);
            }
        }

        match effect.target {
            EffectTarget::Health => {
                if player.character.health.0 >= player.character.derived_stats.max_health {
                    return Err(ItemError::HealthFull);
                }
            }
            EffectTarget::Mana => {
                if player.character.mana.0 >= player.character.derived_stats.max_mana {
                    return Err(ItemError::ManaFull);
                }
            }
        }

        (effect.target, effect.value)
    };

    let remaining_quantity = {
        let player = world.players.get_mut(player_id).ok_or(ItemError::NotFound)?;
        match target {
            EffectTarget::Health => {
                player.character.set_health(player.character.health.0 + value)
            }
            EffectTarget::Mana => player.character.set_mana(player.character.mana.0 + value),
        }

        let remaining = {
            let instance = player
                .inventory
                .find_item_mut(instance_id)
                .ok_or(ItemError::NotFound)?;
            instance.quantity -= 1;
            instance.quantity
        };
        if remaining == 0 {
            player.inventory.remove_item(instance_id);
        }
        remaining
    };

    world
        .consumable_cooldowns
        .insert((player_id, target), time.now_ms);

    persist_player(world, player_id)?;

    let (health, max_health, mana, max_mana) = {
        let player = world.players.get(player_id).ok_or(ItemError::NotFound)?;
        (
            player.character.health.0,
            player.character.derived_stats.max_health,
            player.character.mana.0,
            player.character.derived_stats.max_mana,
        )
    };

    world.send_to(
        player_id,
        ServerMessage::ItemUsed {
            player_id,
            instance_id,
            health,
            max_health,
            mana,
            max_mana,
            remaining_quantity,
        },
    );
    world.broadcast(ServerMessage::PlayerStatsUpdate {
        player_id,
        health,
        max_health,
        mana,
        max_mana,
    });

    Ok(())
}

/// Equip an equipment item into its template slot, swapping out any
/// occupant.
pub fn equip_item(
    world: &mut World,
    player_id: PlayerId,
    instance_id: ItemInstanceId,
) -> Result<(), ItemError> {
    let catalog = world.catalog.clone();

    let slot = {
        let player = world.players.get(player_id).ok_or(ItemError::NotFound)?;
        let instance = player
            .inventory
            .find_item(instance_id)
            .ok_or(ItemError::NotFound)?;
        if instance.is_equipped {
            return Err(ItemError::AlreadyEquipped);
        }
        let item_data = catalog
            .items
            .get_item(instance.item)
            .ok_or(ItemError::NotFound)?;
        if item_data.item_type != ItemType::Equipment {
            return Err(ItemError::NotEquipment);
        }
        let slot = item_data.equipment_slot.ok_or(ItemError::NotEquipment)?;
        if player.character.level.0 < item_data.required_level {
            return Err(ItemError::LevelRequirement);
        }
        if let Some(required) = item_data.required_class {
            if player.character.info.class != required {
                return Err(ItemError::ClassRequirement);
            }
        }

        // Swapping out the occupant needs a bag slot to put it in.
        if player.inventory.equipment[slot].is_some() && !player.inventory.has_free_slot() {
            return Err(ItemError::InventoryFull);
        }

        slot
    };

    {
        let player = world.players.get_mut(player_id).ok_or(ItemError::NotFound)?;

        if let Some(previous_id) = player.inventory.equipment[slot] {
            if let Some(previous) = player.inventory.find_item_mut(previous_id) {
                previous.is_equipped = false;
            } else {
                log::error!(
                    "Equipment slot {:?} of player {} referenced missing instance {}",
                    slot,
                    player_id,
                    previous_id
                );
            }
            player.inventory.equipment[slot] = None;
        }

        let instance = player
            .inventory
            .find_item_mut(instance_id)
            .ok_or(ItemError::NotFound)?;
        instance.is_equipped = true;
        player.inventory.equipment[slot] = Some(instance_id);
    }

    world
        .recalculate_player_stats(player_id)
        .map_err(|_| ItemError::Persistence)?;
    persist_player(world, player_id)?;

    let (new_stats, inventory) = {
        let player = world.players.get(player_id).ok_or(ItemError::NotFound)?;
        (
            snapshots::stats_snapshot(&player.character),
            snapshots::inventory_snapshot(&catalog, &player.inventory),
        )
    };
    world.send_to(
        player_id,
        ServerMessage::ItemEquipped {
            player_id,
            instance_id,
            new_stats,
            inventory,
        },
    );
    world.emit_stats_update(player_id);

    Ok(())
}

/// Unequip whatever occupies `slot` back into the bag.
pub fn unequip_item(
    world: &mut World,
    player_id: PlayerId,
    slot: EquipmentSlot,
) -> Result<(), ItemError> {
    let catalog = world.catalog.clone();

    let (occupant, dangling) = {
        let player = world.players.get(player_id).ok_or(ItemError::NotFound)?;
        let occupant = player.inventory.equipment[slot].ok_or(ItemError::NotEquipped)?;
        (occupant, player.inventory.find_item(occupant).is_none())
    };

    if dangling {
        // Dangling reference: recover by clearing the slot rather
        // than wedging the character.
        log::error!(
            "Equipment slot {:?} of player {} referenced missing instance {}; clearing",
            slot,
            player_id,
            occupant
        );
        if let Some(player) = world.players.get_mut(player_id) {
            player.inventory.equipment[slot] = None;
        }
        let _ = persist_player(world, player_id);
        return Err(ItemError::NotFound);
    }

    {
        let player = world.players.get_mut(player_id).ok_or(ItemError::NotFound)?;
        if !player.inventory.has_free_slot() {
            return Err(ItemError::InventoryFull);
        }

        if let Some(instance) = player.inventory.find_item_mut(occupant) {
            instance.is_equipped = false;
        }
        player.inventory.equipment[slot] = None;
    }

    world
        .recalculate_player_stats(player_id)
        .map_err(|_| ItemError::Persistence)?;
    persist_player(world, player_id)?;

    let (new_stats, inventory) = {
        let player = world.players.get(player_id).ok_or(ItemError::NotFound)?;
        (
            snapshots::stats_snapshot(&player.character),
            snapshots::inventory_snapshot(&catalog, &player.inventory),
        )
    };
    world.send_to(
        player_id,
        ServerMessage::ItemUnequipped {
            player_id,
            slot,
            new_stats,
            inventory,
        },
    );
    world.emit_stats_update(player_id);

    Ok(())
}

pub fn drop_item(
    world: &mut World,
    player_id: PlayerId,
    instance_id: ItemInstanceId,
    quantity: u32,
) -> Result<(), ItemError> {
    {
        let player = world.players.get_mut(player_id).ok_or(ItemError::NotFound)?;
        let instance = player
            .inventory
            .find_item(instance_id)
            .ok_or(ItemError::NotFound)?;
        if instance.is_equipped {
            return Err(ItemError::ItemEquipped);
        }
        if quantity == 0 || instance.quantity < quantity {
            return Err(ItemError::QuantityInsufficient);
        }

        let remaining = {
            let instance = player
                .inventory
                .find_item_mut(instance_id)
                .ok_or(ItemError::NotFound)?;
            instance.quantity -= quantity;
            instance.quantity
        };
        if remaining == 0 {
            player.inventory.remove_item(instance_id);
        }
    }

    persist_player(world, player_id)?;

    world.send_to(
        player_id,
        ServerMessage::ItemDropped {
            player_id,
            instance_id,
            quantity,
        },
    );

    Ok(())
}
