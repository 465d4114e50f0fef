use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use emberfall_game_common::components::{Character, Inventory, SkillList};
use emberfall_game_common::ids::{AccountId, CharacterId, ItemInstanceId};

use crate::game::monsters::MonsterRecord;

mod account;
mod allocator;
mod character;
mod combat_log;
mod inventory;
mod login_limiter;
mod monster;
mod password;

pub use account::AccountRecord;
pub use combat_log::CombatLogEntry;
pub use login_limiter::LoginLimiter;
pub use password::{hash_password, validate_password_strength, verify_password};

use allocator::IdAllocator;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("account temporarily locked")]
    AccountLocked,

    #[error("username must be 3-20 characters of letters, digits or underscore")]
    InvalidUsername,

    #[error("{0}")]
    WeakPassword(&'static str),

    #[error("already exists")]
    AlreadyExists,

    #[error("not found")]
    NotFound,

    #[error("account already has the maximum number of characters")]
    CharacterLimit,

    #[error("character name must be 3-20 characters of letters, digits or underscore")]
    InvalidCharacterName,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// The durable account/character/inventory/monster store. Every
/// operation is atomic: a failed write never leaves a half-updated
/// entity behind.
pub trait PersistenceStore: Send + Sync {
    fn validate_login(&self, username: &str, password: &str) -> Result<AccountId, StorageError>;
    fn create_account(&self, username: &str, password: &str) -> Result<AccountId, StorageError>;

    fn list_characters(&self, account: AccountId) -> Result<Vec<Character>, StorageError>;
    /// Persist a freshly created character together with its starter
    /// inventory; rolled back as a unit on any failure.
    fn create_character(
        &self,
        account: AccountId,
        character: &Character,
        inventory: &Inventory,
    ) -> Result<CharacterId, StorageError>;
    fn load_character(&self, id: CharacterId) -> Result<Character, StorageError>;
    fn update_character(&self, character: &Character) -> Result<(), StorageError>;
    fn delete_character(&self, account: AccountId, id: CharacterId) -> Result<(), StorageError>;

    fn load_inventory(&self, character: CharacterId) -> Result<Inventory, StorageError>;
    fn save_inventory(&self, inventory: &Inventory) -> Result<(), StorageError>;

    /// Upsert the learned-skill list of one character.
    fn save_skills(&self, character: CharacterId, skills: &SkillList) -> Result<(), StorageError>;

    fn load_monster_instances(&self) -> Result<Vec<MonsterRecord>, StorageError>;
    fn update_monster_instance(&self, record: &MonsterRecord) -> Result<(), StorageError>;

    /// Strictly monotonic across the lifetime of the store.
    fn alloc_item_instance_id(&self) -> Result<ItemInstanceId, StorageError>;

    fn log_combat(&self, entry: &CombatLogEntry) -> Result<(), StorageError>;
    fn clean_old_combat_logs(&self, days: i64) -> Result<usize, StorageError>;

    fn health_check(&self) -> (bool, String);
}

/// File-backed store: one JSON document per entity under a root
/// directory, written through a temporary file and an atomic rename.
pub struct JsonStore {
    root: PathBuf,
    login_limiter: LoginLimiter,
    login_backoff: Duration,
    allocator: Mutex<IdAllocator>,
    /// create/delete of characters and accounts touch multiple files; serialised
    /// here so two sessions cannot race the account index.
    directory_lock: Mutex<()>,
    combat_log_lock: Mutex<()>,
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl JsonStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::open_with_backoff(root, Duration::from_millis(500))
    }

    pub fn open_with_backoff(
        root: impl Into<PathBuf>,
        login_backoff: Duration,
    ) -> Result<Self, StorageError> {
        let root = root.into();
        for dir in ["accounts", "characters", "inventories", "monsters", "logs", "meta"] {
            std::fs::create_dir_all(root.join(dir)).with_context(|| {
                format!(
                    "Failed to create storage directory {}",
                    root.join(dir).to_string_lossy()
                )
            })?;
        }

        let allocator = IdAllocator::load(&root.join("meta").join("next_ids.json"))?;

        Ok(Self {
            root,
            login_limiter: LoginLimiter::new(),
            login_backoff,
            allocator: Mutex::new(allocator),
            directory_lock: Mutex::new(()),
            combat_log_lock: Mutex::new(()),
        })
    }

    pub(crate) fn accounts_dir(&self) -> PathBuf {
        self.root.join("accounts")
    }

    pub(crate) fn characters_dir(&self) -> PathBuf {
        self.root.join("characters")
    }

    pub(crate) fn inventories_dir(&self) -> PathBuf {
        self.root.join("inventories")
    }

    pub(crate) fn monsters_dir(&self) -> PathBuf {
        self.root.join("monsters")
    }

    pub(crate) fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub(crate) fn meta_dir(&self) -> PathBuf {
        self.root.join("meta")
    }

    pub(crate) fn directory_lock_guard(&self) -> parking_lot::MutexGuard<'_, ()> {
        self.directory_lock.lock()
    }

    pub(crate) fn login_backoff(&self) -> Duration {
        self.login_backoff
    }

    pub(crate) fn limiter(&self) -> &LoginLimiter {
        &self.login_limiter
    }

    pub(crate) fn alloc_character_id(&self) -> Result<CharacterId, StorageError> {
        self.allocator.lock().next_character_id()
    }

    pub(crate) fn alloc_account_id(&self) -> Result<AccountId, StorageError> {
        self.allocator.lock().next_account_id()
    }
}

/// Serialise `value` next to `path` and atomically move it into place.
pub(crate) fn write_json_file<T: Serialize>(
    path: &Path,
    value: &T,
    allow_overwrite: bool,
) -> Result<(), StorageError> {
    let dir = path
        .parent()
        .context("Storage path has no parent directory")?;

    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialise {}", path.to_string_lossy()))?;

    let mut file = tempfile::Builder::new().tempfile_in(dir).with_context(|| {
        format!(
            "Failed to create temporary file in {}",
            dir.to_string_lossy()
        )
    })?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("Failed to write {}", path.to_string_lossy()))?;

    if allow_overwrite {
        file.persist(path)
            .with_context(|| format!("Failed to persist {}", path.to_string_lossy()))?;
    } else if let Err(error) = file.persist_noclobber(path) {
        return if error.error.kind() == std::io::ErrorKind::AlreadyExists {
            Err(StorageError::AlreadyExists)
        } else {
            Err(anyhow::Error::from(error.error)
                .context(format!(
                    "Failed to persist_noclobber {}",
                    path.to_string_lossy()
                ))
                .into())
        };
    }

    Ok(())
}

pub(crate) fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    if !path.exists() {
        return Err(StorageError::NotFound);
    }
    let str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.to_string_lossy()))?;
    serde_json::from_str(&str)
        .with_context(|| format!("Failed to parse {}", path.to_string_lossy()))
        .map_err(StorageError::from)
}

impl PersistenceStore for JsonStore {
    fn validate_login(&self, username: &str, password: &str) -> Result<AccountId, StorageError> {
        self.validate_login_impl(username, password)
    }

    fn create_account(&self, username: &str, password: &str) -> Result<AccountId, StorageError> {
        self.create_account_impl(username, password)
    }

    fn list_characters(&self, account: AccountId) -> Result<Vec<Character>, StorageError> {
        self.list_characters_impl(account)
    }

    fn create_character(
        &self,
        account: AccountId,
        character: &Character,
        inventory: &Inventory,
    ) -> Result<CharacterId, StorageError> {
        self.create_character_impl(account, character, inventory)
    }

    fn load_character(&self, id: CharacterId) -> Result<Character, StorageError> {
        self.load_character_impl(id)
    }

    fn update_character(&self, character: &Character) -> Result<(), StorageError> {
        self.update_character_impl(character)
    }

    fn delete_character(&self, account: AccountId, id: CharacterId) -> Result<(), StorageError> {
        self.delete_character_impl(account, id)
    }

    fn load_inventory(&self, character: CharacterId) -> Result<Inventory, StorageError> {
        self.load_inventory_impl(character)
    }

    fn save_inventory(&self, inventory: &Inventory) -> Result<(), StorageError> {
        self.save_inventory_impl(inventory)
    }

    fn save_skills(&self, character: CharacterId, skills: &SkillList) -> Result<(), StorageError> {
        self.save_skills_impl(character, skills)
    }

    fn load_monster_instances(&self) -> Result<Vec<MonsterRecord>, StorageError> {
        self.load_monster_instances_impl()
    }

    fn update_monster_instance(&self, record: &MonsterRecord) -> Result<(), StorageError> {
        self.update_monster_instance_impl(record)
    }

    fn alloc_item_instance_id(&self) -> Result<ItemInstanceId, StorageError> {
        self.allocator.lock().next_item_instance_id()
    }

    fn log_combat(&self, entry: &CombatLogEntry) -> Result<(), StorageError> {
        self.log_combat_impl(entry)
    }

    fn clean_old_combat_logs(&self, days: i64) -> Result<usize, StorageError> {
        self.clean_old_combat_logs_impl(days)
    }

    fn health_check(&self) -> (bool, String) {
        let probe = self.root.join("meta").join(".healthcheck");
        match std::fs::write(&probe, b"ok").and_then(|_| std::fs::read(&probe)) {
            Ok(_) => (true, String::from("storage ok")),
            Err(error) => (false, format!("storage unavailable: {}", error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_json_noclobber_reports_already_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value.json");
        write_json_file(&path, &42, false).unwrap();
        assert!(matches!(
            write_json_file(&path, &43, false),
            Err(StorageError::AlreadyExists)
        ));
        // Overwrite mode succeeds and replaces the content.
        write_json_file(&path, &44, true).unwrap();
        let value: i32 = read_json_file(&path).unwrap();
        assert_eq!(value, 44);
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_json_file::<i32>(&dir.path().join("missing.json")),
            Err(StorageError::NotFound)
        ));
    }
}
