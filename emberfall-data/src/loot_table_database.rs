use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ItemId, LootTableId};

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct LootEntry {
    pub item: ItemId,
    /// Independent drop probability in [0, 1].
    pub chance: f32,
    pub quantity_min: u32,
    pub quantity_max: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LootTableData {
    pub id: LootTableId,
    pub gold_min: i64,
    pub gold_max: i64,
    #[serde(default)]
    pub entries: Vec<LootEntry>,
}

pub struct LootTableDatabase {
    tables: HashMap<LootTableId, LootTableData>,
}

impl LootTableDatabase {
    pub fn new(tables: Vec<LootTableData>) -> Self {
        Self {
            tables: tables.into_iter().map(|table| (table.id, table)).collect(),
        }
    }

    pub fn get_table(&self, id: LootTableId) -> Option<&LootTableData> {
        self.tables.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
