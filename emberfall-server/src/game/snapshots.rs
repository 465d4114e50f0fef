use emberfall_data::{ContentCatalog, SkillData};
use emberfall_game_common::components::{Character, Inventory};
use emberfall_game_common::messages::{
    CharacterSnapshot, CharacterSummary, InventorySnapshot, ItemInstanceView, LearnedSkillView,
    MonsterSnapshot, PlayerSnapshot, SkillTemplateView, StatsSnapshot,
};

use crate::game::players::Player;
use crate::game::world::World;

pub fn stats_snapshot(character: &Character) -> StatsSnapshot {
    StatsSnapshot {
        strength: character.basic_stats.strength,
        intellect: character.basic_stats.intellect,
        dexterity: character.basic_stats.dexterity,
        vitality: character.basic_stats.vitality,
        attack_power: character.derived_stats.attack_power,
        magic_power: character.derived_stats.magic_power,
        defense: character.derived_stats.defense,
        attack_speed: character.derived_stats.attack_speed,
        max_health: character.derived_stats.max_health,
        max_mana: character.derived_stats.max_mana,
    }
}

pub fn character_summary(catalog: &ContentCatalog, character: &Character) -> CharacterSummary {
    CharacterSummary {
        id: character.id,
        name: character.info.name.clone(),
        race: character.info.race.clone(),
        class: character.info.class,
        class_name: catalog
            .classes
            .get_class(character.info.class)
            .map(|class| class.name.clone())
            .unwrap_or_default(),
        level: character.level.0,
    }
}

pub fn character_snapshot(catalog: &ContentCatalog, character: &Character) -> CharacterSnapshot {
    CharacterSnapshot {
        id: character.id,
        name: character.info.name.clone(),
        race: character.info.race.clone(),
        class: character.info.class,
        class_name: catalog
            .classes
            .get_class(character.info.class)
            .map(|class| class.name.clone())
            .unwrap_or_default(),
        level: character.level.0,
        experience: character.experience.0,
        status_points: character.status_points.0,
        stats: stats_snapshot(character),
        position: character.position,
        health: character.health.0,
        mana: character.mana.0,
        is_dead: character.is_dead,
    }
}

pub fn player_snapshot(player: &Player) -> PlayerSnapshot {
    PlayerSnapshot {
        player_id: player.id,
        name: player.character.info.name.clone(),
        class: player.character.info.class,
        level: player.character.level.0,
        position: player.character.position,
        health: player.character.health.0,
        max_health: player.character.derived_stats.max_health,
        mana: player.character.mana.0,
        max_mana: player.character.derived_stats.max_mana,
        is_dead: player.character.is_dead,
        is_moving: player.is_moving,
        in_combat: player.combat_target.is_some(),
    }
}

pub fn player_snapshots(world: &World) -> Vec<PlayerSnapshot> {
    world.players.iter().map(player_snapshot).collect()
}

pub fn monster_snapshots(world: &World) -> Vec<MonsterSnapshot> {
    world
        .monsters
        .iter()
        .map(|monster| MonsterSnapshot {
            id: monster.id,
            template: monster.template,
            name: world
                .catalog
                .monsters
                .get_monster(monster.template)
                .map(|data| data.name.clone())
                .unwrap_or_default(),
            level: world
                .catalog
                .monsters
                .get_monster(monster.template)
                .map(|data| data.level)
                .unwrap_or(1),
            position: monster.position,
            health: monster.health,
            max_health: world
                .catalog
                .monsters
                .get_monster(monster.template)
                .map(|data| data.max_health)
                .unwrap_or(monster.health),
            is_alive: monster.is_alive,
            target: monster.target,
        })
        .collect()
}

pub fn inventory_snapshot(catalog: &ContentCatalog, inventory: &Inventory) -> InventorySnapshot {
    InventorySnapshot {
        max_slots: inventory.max_slots,
        gold: inventory.gold,
        equipment: inventory.equipment.clone(),
        items: inventory
            .items
            .iter()
            .map(|instance| ItemInstanceView {
                instance_id: instance.instance_id,
                item: instance.item,
                name: catalog
                    .items
                    .get_item(instance.item)
                    .map(|data| data.name.clone())
                    .unwrap_or_default(),
                quantity: instance.quantity,
                slot: instance.slot,
                is_equipped: instance.is_equipped,
            })
            .collect(),
    }
}

pub fn skill_template_view(data: &SkillData) -> SkillTemplateView {
    SkillTemplateView {
        id: data.id,
        name: data.name.clone(),
        skill_type: data.skill_type,
        damage_type: data.damage_type,
        target_type: data.target_type,
        required_level: data.required_level,
        max_level: data.max_level,
        mana_cost: data.mana_cost,
        health_cost: data.health_cost,
        cooldown: data.cooldown,
        cast_time: data.cast_time,
        range: data.range,
        area_radius: data.area_radius,
    }
}

/// Learned skills with their templates embedded, for `getSkills`.
pub fn learned_skill_views(catalog: &ContentCatalog, character: &Character) -> Vec<LearnedSkillView> {
    character
        .skills
        .iter()
        .filter_map(|learned| {
            catalog
                .skills
                .get_skill(learned.skill)
                .map(|data| LearnedSkillView {
                    skill_id: learned.skill,
                    level: learned.level,
                    slot_number: learned.slot,
                    template: skill_template_view(data),
                })
        })
        .collect()
}

/// Skill templates available to the given class, for `getSkillList`.
pub fn class_skill_views(catalog: &ContentCatalog, class: emberfall_data::ClassId) -> Vec<SkillTemplateView> {
    let mut views: Vec<SkillTemplateView> = catalog
        .skills
        .iter()
        .filter(|data| data.required_class.map(|required| required == class).unwrap_or(true))
        .map(skill_template_view)
        .collect();
    views.sort_by_key(|view| view.id);
    views
}
