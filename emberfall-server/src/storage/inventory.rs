use std::path::PathBuf;

use emberfall_game_common::components::Inventory;
use emberfall_game_common::ids::CharacterId;

use crate::storage::{read_json_file, write_json_file, JsonStore, StorageError};

impl JsonStore {
    fn inventory_path(&self, character: CharacterId) -> PathBuf {
        self.inventories_dir().join(format!("{}.json", character))
    }

    pub(crate) fn load_inventory_impl(
        &self,
        character: CharacterId,
    ) -> Result<Inventory, StorageError> {
        read_json_file(&self.inventory_path(character))
    }

    /// Full rewrite of the inventory document, equipment references
    /// included; the atomic rename makes the delete-and-reinsert a
    /// single visible step.
    pub(crate) fn save_inventory_impl(&self, inventory: &Inventory) -> Result<(), StorageError> {
        write_json_file(&self.inventory_path(inventory.character), inventory, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use emberfall_data::ItemId;
    use emberfall_game_common::components::ItemInstance;
    use emberfall_game_common::ids::ItemInstanceId;

    #[test]
    fn save_and_reload_preserves_items_and_equipment() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open_with_backoff(dir.path(), Duration::ZERO).unwrap();

        let mut inventory = Inventory::new(CharacterId(9));
        inventory.gold = 123;
        inventory.items.push(ItemInstance {
            instance_id: ItemInstanceId(1),
            item: ItemId::new(5),
            quantity: 1,
            slot: 0,
            is_equipped: true,
        });
        inventory.equipment[emberfall_data::EquipmentSlot::Weapon] = Some(ItemInstanceId(1));

        store.save_inventory_impl(&inventory).unwrap();
        let loaded = store.load_inventory_impl(CharacterId(9)).unwrap();
        assert_eq!(loaded.gold, 123);
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(
            loaded.equipment[emberfall_data::EquipmentSlot::Weapon],
            Some(ItemInstanceId(1))
        );
    }

    #[test]
    fn missing_inventory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open_with_backoff(dir.path(), Duration::ZERO).unwrap();
        assert!(matches!(
            store.load_inventory_impl(CharacterId(404)),
            Err(StorageError::NotFound)
        ));
    }
}
