use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

macro_rules! id_wrapper_impl {
    ($name:ident, $value_type:ty) => {
        impl $name {
            #[allow(dead_code)]
            pub fn new(value: $value_type) -> Self {
                Self(value)
            }

            #[allow(dead_code)]
            pub fn get(&self) -> $value_type {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

mod class_database;
mod item_database;
mod loot_table_database;
mod monster_database;
mod skill_database;
mod terrain;
mod xp_tables;

pub use class_database::{ClassData, ClassDatabase, ClassFormulas, StatGrowth};
pub use item_database::{
    ConsumableEffect, EffectTarget, EquipmentSlot, ItemData, ItemDatabase, ItemType, StatBonuses,
};
pub use loot_table_database::{LootEntry, LootTableData, LootTableDatabase};
pub use monster_database::{MonsterData, MonsterDatabase};
pub use skill_database::{
    DamageType, SkillData, SkillDatabase, SkillEffectData, SkillEffectKind, SkillLevelData,
    SkillTargetType, SkillType, StatKind,
};
pub use terrain::Terrain;
pub use xp_tables::XpTables;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Deserialize, Serialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ItemId(u32);
id_wrapper_impl!(ItemId, u32);

#[derive(Copy, Clone, Debug, Deserialize, Serialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonsterId(u32);
id_wrapper_impl!(MonsterId, u32);

#[derive(Copy, Clone, Debug, Deserialize, Serialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SkillId(u32);
id_wrapper_impl!(SkillId, u32);

#[derive(Copy, Clone, Debug, Deserialize, Serialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClassId(u32);
id_wrapper_impl!(ClassId, u32);

#[derive(Copy, Clone, Debug, Deserialize, Serialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct LootTableId(u32);
id_wrapper_impl!(LootTableId, u32);

/// The read-only game data loaded once at boot. Everything the runtime
/// needs to make a gameplay decision that is not player state lives
/// here, so balance changes never touch the runtime code.
pub struct ContentCatalog {
    pub items: ItemDatabase,
    pub monsters: MonsterDatabase,
    pub skills: SkillDatabase,
    pub classes: ClassDatabase,
    pub loot_tables: LootTableDatabase,
    pub xp_tables: XpTables,
    pub terrain: Terrain,
}

fn load_json_file<T: DeserializeOwned>(dir: &Path, file_name: &str) -> Result<T, anyhow::Error> {
    let path = dir.join(file_name);
    let str = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read catalog file {}", path.to_string_lossy()))?;
    serde_json::from_str(&str)
        .with_context(|| format!("Failed to parse catalog file {}", path.to_string_lossy()))
}

impl ContentCatalog {
    pub fn load(dir: &Path) -> Result<Self, anyhow::Error> {
        let terrain: Terrain = load_json_file(dir, "terrain.json")?;
        terrain
            .validate()
            .map_err(|reason| anyhow::anyhow!("Invalid terrain.json: {}", reason))?;

        let catalog = Self {
            items: ItemDatabase::new(load_json_file(dir, "items.json")?),
            monsters: MonsterDatabase::new(load_json_file(dir, "monsters.json")?),
            skills: SkillDatabase::new(load_json_file(dir, "skills.json")?),
            classes: ClassDatabase::new(load_json_file(dir, "classes.json")?),
            loot_tables: LootTableDatabase::new(load_json_file(dir, "loot_tables.json")?),
            xp_tables: load_json_file(dir, "xp_tables.json")?,
            terrain,
        };

        log::info!(
            "Loaded content catalog: {} items, {} monsters, {} skills, {} classes, {} loot tables",
            catalog.items.len(),
            catalog.monsters.len(),
            catalog.skills.len(),
            catalog.classes.len(),
            catalog.loot_tables.len()
        );

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn load_minimal_catalog() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "items.json",
            r#"[{"id": 1, "name": "Minor Health Potion", "item_type": "consumable",
                 "max_stack": 20, "required_level": 1,
                 "effect": {"target": "health", "value": 50}}]"#,
        );
        write_file(
            dir.path(),
            "monsters.json",
            r#"[{"id": 1, "name": "Slime", "level": 1, "max_health": 20,
                 "attack_power": 3, "defense": 0, "experience_reward": 10,
                 "attack_speed": 1.0, "move_speed": 2.0, "attack_range": 1.5,
                 "aggro_range": 8.0, "spawn_center": [10.0, 10.0, 0.0],
                 "spawn_radius": 5.0, "respawn_time": 30.0}]"#,
        );
        write_file(dir.path(), "skills.json", "[]");
        write_file(
            dir.path(),
            "classes.json",
            r#"[{"id": 1, "name": "Warrior",
                 "base_stats": {"strength": 8, "intellect": 3, "dexterity": 5, "vitality": 7},
                 "growth_per_level": {"strength": 2, "intellect": 1, "dexterity": 1, "vitality": 2},
                 "status_points_per_level": 5,
                 "formulas": {"base_health": 80, "health_per_vitality": 10, "health_per_level": 15,
                              "base_mana": 20, "mana_per_intellect": 8, "mana_per_level": 5,
                              "attack_per_strength": 2.0, "attack_per_dexterity": 0.5,
                              "magic_per_intellect": 2.0, "defense_per_vitality": 1.5,
                              "defense_per_level": 1.0, "base_attack_speed": 1.0,
                              "attack_speed_per_dexterity": 0.005}}]"#,
        );
        write_file(dir.path(), "loot_tables.json", "[]");
        write_file(
            dir.path(),
            "xp_tables.json",
            r#"{"level_xp": [100, 250, 500], "reward_multipliers": [[-5, 1.5], [0, 1.0], [5, 0.2]]}"#,
        );
        write_file(
            dir.path(),
            "terrain.json",
            r#"{"origin": [0.0, 0.0], "cell_size": 10.0, "width": 2, "height": 2,
                 "heights": [0.0, 0.0, 0.0, 0.0]}"#,
        );

        let catalog = ContentCatalog::load(dir.path()).unwrap();
        assert_eq!(catalog.items.len(), 1);
        assert!(catalog.items.get_item(ItemId::new(1)).is_some());
        assert_eq!(catalog.monsters.len(), 1);
        assert!(catalog.classes.get_class(ClassId::new(1)).is_some());
    }

    #[test]
    fn load_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = ContentCatalog::load(&dir.path().join("does-not-exist"));
        assert!(result.is_err());
    }
}
