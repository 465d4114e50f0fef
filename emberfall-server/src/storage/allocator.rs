use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use emberfall_game_common::ids::{AccountId, CharacterId, ItemInstanceId};

use crate::storage::{read_json_file, write_json_file, StorageError};

#[derive(Clone, Debug, Deserialize, Serialize)]
struct NextIds {
    next_item_instance_id: u64,
    next_account_id: u32,
    next_character_id: i64,
}

impl Default for NextIds {
    fn default() -> Self {
        // Zero is reserved as the "no account" sentinel.
        Self {
            next_item_instance_id: 1,
            next_account_id: 1,
            next_character_id: 1,
        }
    }
}

/// Monotonic id allocation, persisted on every allocation so a
/// restart can never reissue an id. The owning store wraps this in a
/// mutex; allocation and persistence happen under the same hold.
pub struct IdAllocator {
    path: PathBuf,
    next: NextIds,
}

impl IdAllocator {
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let next = match read_json_file(path) {
            Ok(next) => next,
            Err(StorageError::NotFound) => NextIds::default(),
            Err(error) => return Err(error),
        };
        Ok(Self {
            path: path.to_path_buf(),
            next,
        })
    }

    fn persist(&self) -> Result<(), StorageError> {
        write_json_file(&self.path, &self.next, true)
    }

    pub fn next_item_instance_id(&mut self) -> Result<ItemInstanceId, StorageError> {
        let id = self.next.next_item_instance_id;
        self.next.next_item_instance_id += 1;
        self.persist()?;
        Ok(ItemInstanceId(id))
    }

    pub fn next_account_id(&mut self) -> Result<AccountId, StorageError> {
        let id = self.next.next_account_id;
        self.next.next_account_id += 1;
        self.persist()?;
        Ok(AccountId(id))
    }

    pub fn next_character_id(&mut self) -> Result<CharacterId, StorageError> {
        let id = self.next.next_character_id;
        self.next.next_character_id += 1;
        self.persist()?;
        Ok(CharacterId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_across_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("next_ids.json");

        let mut allocator = IdAllocator::load(&path).unwrap();
        let first = allocator.next_item_instance_id().unwrap();
        let second = allocator.next_item_instance_id().unwrap();
        assert!(second > first);

        // A fresh load continues where the old allocator stopped.
        let mut reloaded = IdAllocator::load(&path).unwrap();
        let third = reloaded.next_item_instance_id().unwrap();
        assert!(third > second);
    }

    #[test]
    fn account_ids_start_at_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut allocator = IdAllocator::load(&dir.path().join("ids.json")).unwrap();
        assert_eq!(allocator.next_account_id().unwrap(), AccountId(1));
    }
}
