use std::path::PathBuf;

use emberfall_game_common::components::{Character, Inventory, SkillList};
use emberfall_game_common::ids::{AccountId, CharacterId};

use crate::storage::account::{is_valid_username, MAX_CHARACTERS_PER_ACCOUNT};
use crate::storage::{read_json_file, write_json_file, JsonStore, StorageError};

impl JsonStore {
    fn character_path(&self, name: &str) -> PathBuf {
        self.characters_dir().join(format!("{}.json", name))
    }

    fn character_index_path(&self) -> PathBuf {
        self.meta_dir().join("character_index.json")
    }

    fn load_character_index(&self) -> Result<Vec<(CharacterId, String)>, StorageError> {
        match read_json_file(&self.character_index_path()) {
            Ok(index) => Ok(index),
            Err(StorageError::NotFound) => Ok(Vec::new()),
            Err(error) => Err(error),
        }
    }

    fn save_character_index(&self, index: &[(CharacterId, String)]) -> Result<(), StorageError> {
        write_json_file(&self.character_index_path(), &index, true)
    }

    fn character_name_by_id(&self, id: CharacterId) -> Result<String, StorageError> {
        self.load_character_index()?
            .into_iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, name)| name)
            .ok_or(StorageError::NotFound)
    }

    pub(crate) fn list_characters_impl(
        &self,
        account: AccountId,
    ) -> Result<Vec<Character>, StorageError> {
        let record = self.load_account_by_id(account)?;
        let mut characters = Vec::with_capacity(record.character_names.len());
        for name in &record.character_names {
            match read_json_file::<Character>(&self.character_path(name)) {
                Ok(character) => characters.push(character),
                Err(StorageError::NotFound) => {
                    log::error!(
                        "Account {} references missing character file {}",
                        record.name,
                        name
                    );
                }
                Err(error) => return Err(error),
            }
        }
        Ok(characters)
    }

    pub(crate) fn create_character_impl(
        &self,
        account: AccountId,
        character: &Character,
        inventory: &Inventory,
    ) -> Result<CharacterId, StorageError> {
        if !is_valid_username(&character.info.name) {
            return Err(StorageError::InvalidCharacterName);
        }

        let _guard = self.directory_lock_guard();

        let mut account_record = self.load_account_by_id(account)?;
        if account_record.character_names.len() >= MAX_CHARACTERS_PER_ACCOUNT {
            return Err(StorageError::CharacterLimit);
        }

        let id = self.alloc_character_id()?;
        let mut character = character.clone();
        character.id = id;
        character.account = account_record.name.clone();
        let mut inventory = inventory.clone();
        inventory.character = id;

        let character_path = self.character_path(&character.info.name);

        // Character file first; a duplicate name fails here and leaves
        // nothing behind.
        write_json_file(&character_path, &character, false)?;

        let rollback_character = || {
            let _ = std::fs::remove_file(&character_path);
        };

        if let Err(error) = write_json_file(
            &self.inventories_dir().join(format!("{}.json", id)),
            &inventory,
            true,
        ) {
            rollback_character();
            return Err(error);
        }

        let mut index = match self.load_character_index() {
            Ok(index) => index,
            Err(error) => {
                let _ = std::fs::remove_file(self.inventories_dir().join(format!("{}.json", id)));
                rollback_character();
                return Err(error);
            }
        };
        index.push((id, character.info.name.clone()));
        if let Err(error) = self.save_character_index(&index) {
            let _ = std::fs::remove_file(self.inventories_dir().join(format!("{}.json", id)));
            rollback_character();
            return Err(error);
        }

        account_record
            .character_names
            .push(character.info.name.clone());
        if let Err(error) = self.save_account(&account_record) {
            index.retain(|(entry_id, _)| *entry_id != id);
            let _ = self.save_character_index(&index);
            let _ = std::fs::remove_file(self.inventories_dir().join(format!("{}.json", id)));
            rollback_character();
            return Err(error);
        }

        log::info!(
            "Created character {} ({}) for account {}",
            character.info.name,
            id,
            account_record.name
        );
        Ok(id)
    }

    pub(crate) fn load_character_impl(&self, id: CharacterId) -> Result<Character, StorageError> {
        let name = self.character_name_by_id(id)?;
        read_json_file(&self.character_path(&name))
    }

    pub(crate) fn update_character_impl(&self, character: &Character) -> Result<(), StorageError> {
        write_json_file(&self.character_path(&character.info.name), character, true)
    }

    pub(crate) fn delete_character_impl(
        &self,
        account: AccountId,
        id: CharacterId,
    ) -> Result<(), StorageError> {
        let _guard = self.directory_lock_guard();

        let mut account_record = self.load_account_by_id(account)?;
        let name = self.character_name_by_id(id)?;
        if !account_record.character_names.contains(&name) {
            return Err(StorageError::NotFound);
        }

        let mut index = self.load_character_index()?;
        index.retain(|(entry_id, _)| *entry_id != id);
        self.save_character_index(&index)?;

        account_record.character_names.retain(|entry| entry != &name);
        self.save_account(&account_record)?;

        let _ = std::fs::remove_file(self.character_path(&name));
        let _ = std::fs::remove_file(self.inventories_dir().join(format!("{}.json", id)));

        log::info!("Deleted character {} ({})", name, id);
        Ok(())
    }

    pub(crate) fn save_skills_impl(
        &self,
        id: CharacterId,
        skills: &SkillList,
    ) -> Result<(), StorageError> {
        let mut character = self.load_character_impl(id)?;
        character.skills = skills.clone();
        self.update_character_impl(&character)
    }
}
