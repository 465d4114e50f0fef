use thiserror::Error;

use emberfall_data::ContentCatalog;
use emberfall_game_common::components::{
    BasicStats, Character, CharacterInfo, DerivedStats, ExperiencePoints, HealthPoints, Inventory,
    ItemInstance, Level, ManaPoints, SkillList, StatusPoints, WorldPosition,
};
use emberfall_game_common::ids::{CharacterId, ItemInstanceId};

use crate::game::stats::recalculate_stats;

#[derive(Error, Debug)]
pub enum CharacterCreateError {
    #[error("unknown class")]
    UnknownClass,

    #[error("invalid name")]
    InvalidName,

    #[error("invalid race")]
    InvalidRace,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

/// Build a fresh level-1 character of the given class with its
/// starter items, positioned at the world spawn. Ids are assigned by
/// the store at persist time.
pub fn create_character(
    catalog: &ContentCatalog,
    name: &str,
    race: &str,
    class_name: &str,
    spawn_position: WorldPosition,
    mut allocate_instance_id: impl FnMut() -> anyhow::Result<ItemInstanceId>,
) -> Result<(Character, Inventory), CharacterCreateError> {
    if name.trim().is_empty() {
        return Err(CharacterCreateError::InvalidName);
    }
    if race.trim().is_empty() {
        return Err(CharacterCreateError::InvalidRace);
    }
    let class = catalog
        .classes
        .find_class(class_name)
        .ok_or(CharacterCreateError::UnknownClass)?;

    let stats = class.stats_at_level(1);
    let mut character = Character {
        id: CharacterId(0),
        account: String::new(),
        info: CharacterInfo {
            name: name.to_string(),
            race: race.to_string(),
            class: class.id,
        },
        level: Level(1),
        experience: ExperiencePoints(0),
        status_points: StatusPoints(0),
        basic_stats: BasicStats {
            strength: stats.strength,
            intellect: stats.intellect,
            dexterity: stats.dexterity,
            vitality: stats.vitality,
        },
        derived_stats: DerivedStats::default(),
        health: HealthPoints(1),
        mana: ManaPoints(0),
        position: catalog
            .terrain
            .clamp(glam::Vec3::from(spawn_position))
            .into(),
        is_dead: false,
        skills: SkillList::default(),
    };

    let mut inventory = Inventory::new(character.id);
    for (item_id, quantity) in &class.starter_items {
        let Some(item_data) = catalog.items.get_item(*item_id) else {
            log::error!(
                "Class {} starter item {} is not in the catalog",
                class.name,
                item_id
            );
            continue;
        };
        let instance_id = allocate_instance_id()?;
        let slot = inventory.used_slots();
        inventory.items.push(ItemInstance {
            instance_id,
            item: *item_id,
            quantity: (*quantity).clamp(1, item_data.max_stack),
            slot,
            is_equipped: false,
        });
    }

    recalculate_stats(&mut character, &inventory, &Default::default(), catalog)?;
    character.set_health(character.derived_stats.max_health);
    character.set_mana(character.derived_stats.max_mana);

    Ok((character, inventory))
}
