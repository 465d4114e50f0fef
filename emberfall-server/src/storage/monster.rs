use std::path::PathBuf;

use anyhow::Context;

use emberfall_game_common::ids::MonsterInstanceId;

use crate::game::monsters::MonsterRecord;
use crate::storage::{read_json_file, write_json_file, JsonStore, StorageError};

impl JsonStore {
    fn monster_path(&self, id: MonsterInstanceId) -> PathBuf {
        self.monsters_dir().join(format!("{}.json", id))
    }

    pub(crate) fn load_monster_instances_impl(&self) -> Result<Vec<MonsterRecord>, StorageError> {
        let mut records = Vec::new();
        let entries = std::fs::read_dir(self.monsters_dir())
            .context("Failed to read monster storage directory")?;
        for entry in entries {
            let entry = entry.context("Failed to read monster storage entry")?;
            let path = entry.path();
            if path.extension().map(|ext| ext != "json").unwrap_or(true) {
                continue;
            }
            match read_json_file::<MonsterRecord>(&path) {
                Ok(record) => records.push(record),
                Err(error) => {
                    log::error!(
                        "Skipping unreadable monster record {}: {}",
                        path.to_string_lossy(),
                        error
                    );
                }
            }
        }
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    pub(crate) fn update_monster_instance_impl(
        &self,
        record: &MonsterRecord,
    ) -> Result<(), StorageError> {
        write_json_file(&self.monster_path(record.id), record, true)
    }
}
