use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use emberfall_game_common::ids::AccountId;

use crate::storage::{
    hash_password, now_ms, read_json_file, validate_password_strength, verify_password,
    write_json_file, JsonStore, StorageError,
};

pub const MAX_CHARACTERS_PER_ACCOUNT: usize = 5;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub name: String,
    pub password_hash: String,
    pub created_at_ms: i64,
    pub last_login_ms: i64,
    pub character_names: Vec<String>,
}

pub(crate) fn is_valid_username(name: &str) -> bool {
    (3..=20).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl JsonStore {
    fn account_path(&self, name: &str) -> PathBuf {
        self.accounts_dir().join(format!("{}.json", name))
    }

    fn account_index_path(&self) -> PathBuf {
        self.meta_dir().join("account_index.json")
    }

    pub(crate) fn load_account_by_name(&self, name: &str) -> Result<AccountRecord, StorageError> {
        read_json_file(&self.account_path(name))
    }

    pub(crate) fn load_account_by_id(&self, id: AccountId) -> Result<AccountRecord, StorageError> {
        let index: Vec<(AccountId, String)> = match read_json_file(&self.account_index_path()) {
            Ok(index) => index,
            Err(StorageError::NotFound) => Vec::new(),
            Err(error) => return Err(error),
        };
        let name = index
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, name)| name.clone())
            .ok_or(StorageError::NotFound)?;
        self.load_account_by_name(&name)
    }

    pub(crate) fn save_account(&self, record: &AccountRecord) -> Result<(), StorageError> {
        write_json_file(&self.account_path(&record.name), record, true)
    }

    fn append_account_index(&self, id: AccountId, name: &str) -> Result<(), StorageError> {
        let mut index: Vec<(AccountId, String)> = match read_json_file(&self.account_index_path()) {
            Ok(index) => index,
            Err(StorageError::NotFound) => Vec::new(),
            Err(error) => return Err(error),
        };
        index.retain(|(entry_id, _)| *entry_id != id);
        index.push((id, name.to_string()));
        write_json_file(&self.account_index_path(), &index, true)
    }

    pub(crate) fn validate_login_impl(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccountId, StorageError> {
        let now = now_ms();

        // Lockout decision before any store access.
        if self.limiter().is_locked(username, now) {
            return Err(StorageError::AccountLocked);
        }

        let fail = || {
            self.limiter().record_failure(username, now);
            std::thread::sleep(self.login_backoff());
            StorageError::InvalidCredentials
        };

        let mut record = match self.load_account_by_name(username) {
            Ok(record) => record,
            Err(StorageError::NotFound) => return Err(fail()),
            Err(error) => return Err(error),
        };

        if !verify_password(password, &record.password_hash) {
            return Err(fail());
        }

        self.limiter().record_success(username);
        record.last_login_ms = now;
        self.save_account(&record)?;
        Ok(record.id)
    }

    pub(crate) fn create_account_impl(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccountId, StorageError> {
        if !is_valid_username(username) {
            return Err(StorageError::InvalidUsername);
        }
        validate_password_strength(password)?;

        let _guard = self.directory_lock_guard();

        let id = self.alloc_account_id()?;
        let record = AccountRecord {
            id,
            name: username.to_string(),
            password_hash: hash_password(password)?,
            created_at_ms: now_ms(),
            last_login_ms: 0,
            character_names: Vec::new(),
        };

        write_json_file(&self.account_path(username), &record, false)?;

        if let Err(error) = self.append_account_index(id, username) {
            // Roll the account file back so the name stays free.
            let _ = std::fs::remove_file(self.account_path(username));
            return Err(error);
        }

        log::info!("Created account {} ({})", username, id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open_with_backoff(dir.path(), Duration::ZERO).unwrap();
        (dir, store)
    }

    #[test]
    fn register_then_login() {
        let (_dir, store) = store();
        let created = store.create_account_impl("alice", "hunter7").unwrap();
        assert!(created.is_valid());
        let logged_in = store.validate_login_impl("alice", "hunter7").unwrap();
        assert_eq!(created, logged_in);
    }

    #[test]
    fn duplicate_username_rejected() {
        let (_dir, store) = store();
        store.create_account_impl("alice", "hunter7").unwrap();
        assert!(matches!(
            store.create_account_impl("alice", "other99"),
            Err(StorageError::AlreadyExists)
        ));
    }

    #[test]
    fn invalid_usernames_rejected() {
        let (_dir, store) = store();
        for name in ["ab", "a".repeat(21).as_str(), "bad name", "semi;colon"] {
            assert!(matches!(
                store.create_account_impl(name, "hunter7"),
                Err(StorageError::InvalidUsername)
            ));
        }
    }

    #[test]
    fn wrong_password_fails_and_eventually_locks() {
        let (_dir, store) = store();
        store.create_account_impl("alice", "hunter7").unwrap();
        for _ in 0..5 {
            assert!(matches!(
                store.validate_login_impl("alice", "wrong1"),
                Err(StorageError::InvalidCredentials)
            ));
        }
        // Sixth attempt short-circuits on the lockout, even with the
        // right password.
        assert!(matches!(
            store.validate_login_impl("alice", "hunter7"),
            Err(StorageError::AccountLocked)
        ));
    }

    #[test]
    fn unknown_account_fails_like_bad_password() {
        let (_dir, store) = store();
        assert!(matches!(
            store.validate_login_impl("nobody", "hunter7"),
            Err(StorageError::InvalidCredentials)
        ));
    }

    #[test]
    fn account_lookup_by_id() {
        let (_dir, store) = store();
        let id = store.create_account_impl("alice", "hunter7").unwrap();
        let record = store.load_account_by_id(id).unwrap();
        assert_eq!(record.name, "alice");
    }
}
