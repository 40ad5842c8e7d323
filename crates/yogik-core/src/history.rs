//! Most-recently-used configuration ledger.
//!
//! One list per mode, persisted under its own key, capped at
//! [`HISTORY_CAP`] entries, newest first. The configuration itself is the
//! dedup key: starting a known configuration moves its entry to the front
//! and resets its outcome; stopping writes the final outcome back.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::storage::{Store, StoreExt};

pub const HISTORY_CAP: usize = 5;

/// A configuration that can be listed in history.
pub trait HistoryConfig: Clone + PartialEq + Serialize + DeserializeOwned {
    /// Short display name ("hold-10", "4:4:6:2").
    fn display_name(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry<C> {
    pub id: Uuid,
    pub name: String,
    pub config: C,
    pub last_used: DateTime<Utc>,
    /// Laps (yoga) or rounds (pranayama) reached by the last run.
    pub outcome: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLedger<C> {
    key: &'static str,
    entries: Vec<HistoryEntry<C>>,
}

impl<C: HistoryConfig> HistoryLedger<C> {
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            entries: Vec::new(),
        }
    }

    /// Read the list stored under `key`. Corrupt data yields an empty list.
    pub fn load(store: &dyn Store, key: &'static str) -> Self {
        let mut entries: Vec<HistoryEntry<C>> = store.load_or_default(key);
        entries.truncate(HISTORY_CAP);
        Self { key, entries }
    }

    pub fn save(&self, store: &dyn Store) -> Result<(), CoreError> {
        store.save(self.key, &self.entries)
    }

    pub fn entries(&self) -> &[HistoryEntry<C>] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry<C>> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, config: &C) -> Option<usize> {
        self.entries.iter().position(|e| &e.config == config)
    }

    /// Move `config` to the front with a zero outcome, inserting it if new.
    pub fn record_start(&mut self, config: &C, now: DateTime<Utc>) {
        let entry = match self.position(config) {
            Some(idx) => {
                let mut entry = self.entries.remove(idx);
                entry.last_used = now;
                entry.outcome = 0;
                entry
            }
            None => HistoryEntry {
                id: Uuid::new_v4(),
                name: config.display_name(),
                config: config.clone(),
                last_used: now,
                outcome: 0,
            },
        };
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);
    }

    /// Write the final outcome for `config`. Returns false when the entry is
    /// no longer listed (deleted mid-session), in which case nothing changes.
    pub fn record_stop(&mut self, config: &C, outcome: u32, now: DateTime<Utc>) -> bool {
        let Some(idx) = self.position(config) else {
            return false;
        };
        let mut entry = self.entries.remove(idx);
        entry.outcome = outcome;
        entry.last_used = now;
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);
        true
    }

    pub fn delete(&mut self, index: usize) -> Option<HistoryEntry<C>> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Load, apply `f`, save. Persistence failures are logged, never surfaced.
pub(crate) fn update<C, F>(store: &dyn Store, key: &'static str, f: F)
where
    C: HistoryConfig,
    F: FnOnce(&mut HistoryLedger<C>),
{
    let mut ledger = HistoryLedger::<C>::load(store, key);
    f(&mut ledger);
    if let Err(e) = ledger.save(store) {
        tracing::warn!(key, error = %e, "failed to persist history");
    }
}
