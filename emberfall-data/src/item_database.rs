use std::collections::HashMap;

use enum_map::Enum;
use serde::{Deserialize, Serialize};

use crate::{ClassId, ItemId};

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Consumable,
    Equipment,
    Material,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, Enum)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentSlot {
    Weapon,
    Armor,
    Helmet,
    Boots,
    Gloves,
    Ring,
    Necklace,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EffectTarget {
    Health,
    Mana,
}

impl EffectTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectTarget::Health => "health",
            EffectTarget::Mana => "mana",
        }
    }
}

/// Flat stat bonuses granted by an equipped item.
#[derive(Copy, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StatBonuses {
    pub strength: i32,
    pub intellect: i32,
    pub dexterity: i32,
    pub vitality: i32,
    pub attack_power: i32,
    pub magic_power: i32,
    pub defense: i32,
    pub attack_speed: f32,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct ConsumableEffect {
    pub target: EffectTarget,
    pub value: i32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ItemData {
    pub id: ItemId,
    pub name: String,
    pub item_type: ItemType,
    pub max_stack: u32,
    #[serde(default)]
    pub required_level: i32,
    #[serde(default)]
    pub required_class: Option<ClassId>,
    #[serde(default)]
    pub equipment_slot: Option<EquipmentSlot>,
    #[serde(default)]
    pub stat_bonuses: StatBonuses,
    #[serde(default)]
    pub effect: Option<ConsumableEffect>,
    #[serde(default)]
    pub gold_value: i64,
}

impl ItemData {
    pub fn is_stackable(&self) -> bool {
        self.max_stack > 1
    }
}

pub struct ItemDatabase {
    items: HashMap<ItemId, ItemData>,
}

impl ItemDatabase {
    pub fn new(items: Vec<ItemData>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
        }
    }

    pub fn get_item(&self, id: ItemId) -> Option<&ItemData> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemData> {
        self.items.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equipment_slot_names_match_wire_format() {
        assert_eq!(
            serde_json::to_string(&EquipmentSlot::Weapon).unwrap(),
            "\"weapon\""
        );
        assert_eq!(
            serde_json::from_str::<EquipmentSlot>("\"necklace\"").unwrap(),
            EquipmentSlot::Necklace
        );
    }

    #[test]
    fn missing_optional_fields_default() {
        let item: ItemData = serde_json::from_str(
            r#"{"id": 7, "name": "Iron Sword", "item_type": "equipment",
                "max_stack": 1, "equipment_slot": "weapon",
                "stat_bonuses": {"attack_power": 12}}"#,
        )
        .unwrap();
        assert_eq!(item.required_level, 0);
        assert!(item.required_class.is_none());
        assert!(item.effect.is_none());
        assert_eq!(item.stat_bonuses.attack_power, 12);
        assert_eq!(item.stat_bonuses.defense, 0);
        assert!(!item.is_stackable());
    }
}
