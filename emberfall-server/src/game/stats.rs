use anyhow::anyhow;

use emberfall_data::{ContentCatalog, StatBonuses, StatKind};
use emberfall_game_common::components::{
    ActiveEffects, Character, DerivedStats, Inventory,
};

/// The canonical derivation of every derived stat. All equipment,
/// level and buff changes end here; nothing else writes
/// `derived_stats`, `max_health` or `max_mana`.
pub fn recalculate_stats(
    character: &mut Character,
    inventory: &Inventory,
    effects: &ActiveEffects,
    catalog: &ContentCatalog,
) -> Result<(), anyhow::Error> {
    let class = catalog
        .classes
        .get_class(character.info.class)
        .ok_or_else(|| anyhow!("character {} has unknown class", character.info.name))?;

    // Sum equipment bonuses over equipped instances.
    let mut bonuses = StatBonuses::default();
    for instance in inventory.items.iter().filter(|item| item.is_equipped) {
        let Some(item_data) = catalog.items.get_item(instance.item) else {
            log::error!(
                "Equipped item {} has unknown template {}",
                instance.instance_id,
                instance.item
            );
            continue;
        };
        let item_bonuses = &item_data.stat_bonuses;
        bonuses.strength += item_bonuses.strength;
        bonuses.intellect += item_bonuses.intellect;
        bonuses.dexterity += item_bonuses.dexterity;
        bonuses.vitality += item_bonuses.vitality;
        bonuses.attack_power += item_bonuses.attack_power;
        bonuses.magic_power += item_bonuses.magic_power;
        bonuses.defense += item_bonuses.defense;
        bonuses.attack_speed += item_bonuses.attack_speed;
    }

    // Bonuses land on base stats first, then the class formulas run on
    // the combined values.
    let mut combined = character.basic_stats.with_bonuses(&bonuses);
    combined.strength += effects.stat_buff_total(StatKind::Strength);
    combined.intellect += effects.stat_buff_total(StatKind::Intellect);
    combined.dexterity += effects.stat_buff_total(StatKind::Dexterity);
    combined.vitality += effects.stat_buff_total(StatKind::Vitality);

    let level = character.level.0;
    character.derived_stats = DerivedStats {
        attack_power: class.attack_power(combined.strength, combined.dexterity)
            + bonuses.attack_power
            + effects.stat_buff_total(StatKind::AttackPower),
        magic_power: class.magic_power(combined.intellect)
            + bonuses.magic_power
            + effects.stat_buff_total(StatKind::MagicPower),
        defense: class.defense(level, combined.vitality)
            + bonuses.defense
            + effects.stat_buff_total(StatKind::Defense),
        attack_speed: (class.attack_speed(combined.dexterity) + bonuses.attack_speed).max(0.1),
        max_health: class.max_health(level, combined.vitality).max(1),
        max_mana: class.max_mana(level, combined.intellect).max(0),
    };

    // Current values may never exceed the recomputed maxima.
    character.set_health(character.health.0);
    character.set_mana(character.mana.0);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::tests::{test_catalog, test_character};
    use emberfall_data::ItemId;
    use emberfall_game_common::components::ItemInstance;
    use emberfall_game_common::ids::ItemInstanceId;

    #[test]
    fn equipment_bonuses_are_recomputable() {
        let catalog = test_catalog();
        let mut character = test_character(&catalog);
        let mut inventory = Inventory::new(character.id);
        let effects = ActiveEffects::default();

        recalculate_stats(&mut character, &inventory, &effects, &catalog).unwrap();
        let bare = character.derived_stats;

        // Equip the iron sword (+12 attack power).
        inventory.items.push(ItemInstance {
            instance_id: ItemInstanceId(1),
            item: ItemId::new(2),
            quantity: 1,
            slot: 0,
            is_equipped: true,
        });
        recalculate_stats(&mut character, &inventory, &effects, &catalog).unwrap();
        assert_eq!(character.derived_stats.attack_power, bare.attack_power + 12);

        // Unequip: derived stats return to the bare values.
        inventory.items.clear();
        recalculate_stats(&mut character, &inventory, &effects, &catalog).unwrap();
        assert_eq!(character.derived_stats, bare);
    }

    #[test]
    fn health_clamps_when_max_drops() {
        let catalog = test_catalog();
        let mut character = test_character(&catalog);
        let mut inventory = Inventory::new(character.id);
        let effects = ActiveEffects::default();

        // Equip the hardy helm (+5 vitality) and heal to the new max.
        inventory.items.push(ItemInstance {
            instance_id: ItemInstanceId(2),
            item: ItemId::new(3),
            quantity: 1,
            slot: 0,
            is_equipped: true,
        });
        recalculate_stats(&mut character, &inventory, &effects, &catalog).unwrap();
        let boosted_max = character.derived_stats.max_health;
        character.set_health(boosted_max);

        inventory.items.clear();
        recalculate_stats(&mut character, &inventory, &effects, &catalog).unwrap();
        assert!(character.derived_stats.max_health < boosted_max);
        assert_eq!(character.health.0, character.derived_stats.max_health);
    }
}
