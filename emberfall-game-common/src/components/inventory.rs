use enum_map::EnumMap;
use serde::{Deserialize, Serialize};

use emberfall_data::{EquipmentSlot, ItemData};

use crate::ids::ItemInstanceId;

pub const DEFAULT_INVENTORY_SLOTS: u32 = 50;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ItemInstance {
    pub instance_id: ItemInstanceId,
    pub item: emberfall_data::ItemId,
    pub quantity: u32,
    pub slot: u32,
    pub is_equipped: bool,
}

/// Equipment slot references. Every `Some` must point at an
/// `ItemInstance` in the same inventory with `is_equipped == true`
/// whose template slot matches the key.
pub type Equipment = EnumMap<EquipmentSlot, Option<ItemInstanceId>>;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Inventory {
    pub character: crate::ids::CharacterId,
    pub max_slots: u32,
    pub gold: i64,
    pub equipment: Equipment,
    pub items: Vec<ItemInstance>,
}

impl Inventory {
    pub fn new(character: crate::ids::CharacterId) -> Self {
        Self {
            character,
            max_slots: DEFAULT_INVENTORY_SLOTS,
            gold: 0,
            equipment: Equipment::default(),
            items: Vec::new(),
        }
    }

    /// Occupied bag slots; equipped items do not count against the cap.
    pub fn used_slots(&self) -> u32 {
        self.items.iter().filter(|item| !item.is_equipped).count() as u32
    }

    pub fn has_free_slot(&self) -> bool {
        self.used_slots() < self.max_slots
    }

    pub fn find_item(&self, instance_id: ItemInstanceId) -> Option<&ItemInstance> {
        self.items
            .iter()
            .find(|item| item.instance_id == instance_id)
    }

    pub fn find_item_mut(&mut self, instance_id: ItemInstanceId) -> Option<&mut ItemInstance> {
        self.items
            .iter_mut()
            .find(|item| item.instance_id == instance_id)
    }

    pub fn remove_item(&mut self, instance_id: ItemInstanceId) -> Option<ItemInstance> {
        let index = self
            .items
            .iter()
            .position(|item| item.instance_id == instance_id)?;
        Some(self.items.remove(index))
    }

    fn next_free_slot_index(&self) -> u32 {
        let mut index = 0;
        loop {
            if !self
                .items
                .iter()
                .any(|item| !item.is_equipped && item.slot == index)
            {
                return index;
            }
            index += 1;
        }
    }

    /// Stack into an existing pile first, then fall back to a free
    /// slot. Returns the rejected quantity when the inventory cannot
    /// take everything.
    pub fn try_add_item(
        &mut self,
        item_data: &ItemData,
        quantity: u32,
        allocate_instance_id: &mut dyn FnMut() -> ItemInstanceId,
    ) -> Result<ItemInstanceId, u32> {
        if quantity == 0 {
            return Err(0);
        }

        if item_data.is_stackable() {
            if let Some(existing) = self.items.iter_mut().find(|existing| {
                !existing.is_equipped
                    && existing.item == item_data.id
                    && existing.quantity + quantity <= item_data.max_stack
            }) {
                existing.quantity += quantity;
                return Ok(existing.instance_id);
            }
        }

        if !self.has_free_slot() || quantity > item_data.max_stack {
            return Err(quantity);
        }

        let instance = ItemInstance {
            instance_id: allocate_instance_id(),
            item: item_data.id,
            quantity,
            slot: self.next_free_slot_index(),
            is_equipped: false,
        };
        let instance_id = instance.instance_id;
        self.items.push(instance);
        Ok(instance_id)
    }

    pub fn add_gold(&mut self, amount: i64) {
        self.gold = self.gold.saturating_add(amount).max(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CharacterId;
    use emberfall_data::{ItemId, ItemType, StatBonuses};

    fn potion() -> ItemData {
        ItemData {
            id: ItemId::new(1),
            name: "Minor Health Potion".into(),
            item_type: ItemType::Consumable,
            max_stack: 20,
            required_level: 0,
            required_class: None,
            equipment_slot: None,
            stat_bonuses: StatBonuses::default(),
            effect: None,
            gold_value: 5,
        }
    }

    fn alloc_from(counter: &mut u64) -> impl FnMut() -> ItemInstanceId + '_ {
        move || {
            *counter += 1;
            ItemInstanceId(*counter)
        }
    }

    #[test]
    fn stacks_merge_before_new_slots() {
        let mut inventory = Inventory::new(CharacterId(1));
        let mut counter = 0;
        let first = inventory
            .try_add_item(&potion(), 5, &mut alloc_from(&mut counter))
            .unwrap();
        let second = inventory
            .try_add_item(&potion(), 3, &mut alloc_from(&mut counter))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(inventory.items.len(), 1);
        assert_eq!(inventory.items[0].quantity, 8);
    }

    #[test]
    fn overflow_spills_to_new_slot() {
        let mut inventory = Inventory::new(CharacterId(1));
        let mut counter = 0;
        inventory
            .try_add_item(&potion(), 18, &mut alloc_from(&mut counter))
            .unwrap();
        inventory
            .try_add_item(&potion(), 5, &mut alloc_from(&mut counter))
            .unwrap();
        assert_eq!(inventory.items.len(), 2);
        assert_eq!(inventory.used_slots(), 2);
    }

    #[test]
    fn full_inventory_rejects_with_quantity() {
        let mut inventory = Inventory::new(CharacterId(1));
        inventory.max_slots = 1;
        let mut counter = 0;
        inventory
            .try_add_item(&potion(), 20, &mut alloc_from(&mut counter))
            .unwrap();
        let rejected = inventory
            .try_add_item(&potion(), 4, &mut alloc_from(&mut counter))
            .unwrap_err();
        assert_eq!(rejected, 4);
    }

    #[test]
    fn equipped_items_do_not_use_bag_slots() {
        let mut inventory = Inventory::new(CharacterId(1));
        inventory.items.push(ItemInstance {
            instance_id: ItemInstanceId(9),
            item: ItemId::new(2),
            quantity: 1,
            slot: 0,
            is_equipped: true,
        });
        assert_eq!(inventory.used_slots(), 0);
        assert!(inventory.has_free_slot());
    }

    #[test]
    fn slot_indices_reuse_gaps() {
        let mut inventory = Inventory::new(CharacterId(1));
        let mut counter = 0;
        let sword = ItemData {
            item_type: ItemType::Equipment,
            max_stack: 1,
            ..potion()
        };
        inventory
            .try_add_item(&sword, 1, &mut alloc_from(&mut counter))
            .unwrap();
        let second = inventory
            .try_add_item(&sword, 1, &mut alloc_from(&mut counter))
            .unwrap();
        inventory.remove_item(ItemInstanceId(1));
        inventory
            .try_add_item(&sword, 1, &mut alloc_from(&mut counter))
            .unwrap();
        assert_eq!(inventory.find_item(second).unwrap().slot, 1);
        assert!(inventory.items.iter().any(|item| item.slot == 0));
    }
}
