use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::storage::{now_ms, JsonStore, StorageError};

/// One damage or kill event, appended as a JSON line.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CombatLogEntry {
    pub time_ms: i64,
    pub attacker: String,
    pub defender: String,
    pub damage: i32,
    pub critical: bool,
    pub killed: bool,
    #[serde(default)]
    pub skill: Option<emberfall_data::SkillId>,
}

impl JsonStore {
    fn combat_log_path(&self) -> PathBuf {
        self.logs_dir().join("combat.jsonl")
    }

    pub(crate) fn log_combat_impl(&self, entry: &CombatLogEntry) -> Result<(), StorageError> {
        let _guard = self.combat_log_lock.lock();
        let line = serde_json::to_string(entry).context("Failed to serialise combat log entry")?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.combat_log_path())
            .context("Failed to open combat log")?;
        writeln!(file, "{}", line).context("Failed to append combat log entry")?;
        Ok(())
    }

    /// Rewrite the log keeping only entries younger than `days`.
    /// Returns the number of removed entries.
    pub(crate) fn clean_old_combat_logs_impl(&self, days: i64) -> Result<usize, StorageError> {
        let _guard = self.combat_log_lock.lock();
        let path = self.combat_log_path();
        if !path.exists() {
            return Ok(0);
        }

        let cutoff_ms = now_ms() - days * 24 * 60 * 60 * 1000;
        let file = std::fs::File::open(&path).context("Failed to open combat log")?;
        let mut kept = Vec::new();
        let mut removed = 0usize;
        for line in BufReader::new(file).lines() {
            let line = line.context("Failed to read combat log line")?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CombatLogEntry>(&line) {
                Ok(entry) if entry.time_ms >= cutoff_ms => kept.push(line),
                Ok(_) => removed += 1,
                Err(error) => {
                    log::warn!("Dropping unparseable combat log line: {}", error);
                    removed += 1;
                }
            }
        }

        let mut file = tempfile::Builder::new()
            .tempfile_in(self.logs_dir())
            .context("Failed to create temporary combat log")?;
        for line in &kept {
            writeln!(file, "{}", line).context("Failed to write combat log")?;
        }
        file.persist(&path)
            .context("Failed to persist cleaned combat log")?;

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry(time_ms: i64) -> CombatLogEntry {
        CombatLogEntry {
            time_ms,
            attacker: "player:1".into(),
            defender: "monster:2".into(),
            damage: 14,
            critical: false,
            killed: false,
            skill: None,
        }
    }

    #[test]
    fn append_then_clean() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open_with_backoff(dir.path(), Duration::ZERO).unwrap();

        let now = now_ms();
        store.log_combat_impl(&entry(now)).unwrap();
        store
            .log_combat_impl(&entry(now - 10 * 24 * 60 * 60 * 1000))
            .unwrap();

        let removed = store.clean_old_combat_logs_impl(7).unwrap();
        assert_eq!(removed, 1);
        // Cleaning again removes nothing further.
        assert_eq!(store.clean_old_combat_logs_impl(7).unwrap(), 0);
    }
}
