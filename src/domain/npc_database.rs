//! In-memory harvest database
//!
//! Owned by the harvest coordinator for the duration of a run. Keys are
//! always the expected NPC name, and every record's `name` equals its key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::npc::NpcRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NpcDatabase {
    records: BTreeMap<String, NpcRecord>,
}

impl NpcDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&NpcRecord> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Insert or overwrite the record for `name`. The stored record is
    /// re-keyed so its `name` always matches the database key; hand-added
    /// keys of the previous record carry over unless the new one has its own.
    pub fn merge(&mut self, name: &str, mut record: NpcRecord) {
        if record.name != name {
            record.name = name.to_string();
        }
        if let Some(previous) = self.records.remove(name) {
            for (key, value) in previous.extra {
                record.extra.entry(key).or_insert(value);
            }
        }
        self.records.insert(name.to_string(), record);
    }

    /// Whether `name` already has a complete record and may be skipped.
    pub fn is_complete(&self, name: &str) -> bool {
        self.records.get(name).is_some_and(NpcRecord::is_complete)
    }

    /// Non-empty attribute value recorded for `name`.
    pub fn sex_of(&self, name: &str) -> Option<&str> {
        self.records.get(name).and_then(NpcRecord::sex)
    }

    pub fn complete_count(&self) -> usize {
        self.records.values().filter(|r| r.is_complete()).count()
    }

    /// Names from `catalog` that still need harvesting, in catalog order.
    pub fn pending_names(&self, catalog: &[String]) -> Vec<String> {
        catalog
            .iter()
            .filter(|name| !self.is_complete(name))
            .cloned()
            .collect()
    }

    /// Repair records whose `name` disagrees with their key (hand-edited
    /// files). Returns the number of records rewritten.
    pub fn normalize_names(&mut self) -> usize {
        let mut repaired = 0;
        for (key, record) in &mut self.records {
            if record.name != *key {
                warn!(
                    "Database record keyed '{}' had name '{}', using the key",
                    key, record.name
                );
                record.name.clone_from(key);
                repaired += 1;
            }
        }
        repaired
    }
}

impl FromIterator<NpcRecord> for NpcDatabase {
    fn from_iter<I: IntoIterator<Item = NpcRecord>>(iter: I) -> Self {
        let records = iter
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();
        Self { records }
    }
}
