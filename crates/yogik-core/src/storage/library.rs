//! Saved custom sequences and kriyas, plus the sequence exchange format.
//!
//! Both lists are unbounded, appended on save and pruned by id on delete.
//! A session run never writes back to a saved definition.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{keys, Store, StoreExt};
use crate::error::{CoreError, ImportError};
use crate::modes::{SavedKriya, SavedSequence};

pub const SEQUENCE_FORMAT_VERSION: u32 = 1;
pub const SEQUENCE_FILE_EXTENSION: &str = "yogikseq";

/// On-disk envelope for a shared sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedSequence {
    pub version: u32,
    pub sequence: SavedSequence,
}

impl ExportedSequence {
    pub fn new(sequence: SavedSequence) -> Self {
        Self {
            version: SEQUENCE_FORMAT_VERSION,
            sequence,
        }
    }

    /// Pretty-printed JSON with keys in sorted order.
    pub fn to_json(&self) -> Result<String, CoreError> {
        // Going through Value sorts object keys (serde_json's default map).
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string_pretty(&value)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        let doc: ExportedSequence = serde_json::from_str(json)?;
        if doc.version > SEQUENCE_FORMAT_VERSION {
            return Err(ImportError::UnsupportedVersion(doc.version));
        }
        if doc.sequence.poses.is_empty() {
            return Err(ImportError::NoPoses(doc.sequence.name));
        }
        Ok(doc)
    }

    /// Suggested file name: spaces become underscores.
    pub fn file_name(&self) -> String {
        format!(
            "{}.{SEQUENCE_FILE_EXTENSION}",
            self.sequence.name.replace(' ', "_")
        )
    }
}

/// Saved-definition lists in a [`Store`].
pub struct Library<'a> {
    store: &'a dyn Store,
}

impl<'a> Library<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    // ── Sequences ────────────────────────────────────────────────────

    pub fn sequences(&self) -> Vec<SavedSequence> {
        self.store.load_or_default(keys::SAVED_SEQUENCES)
    }

    pub fn find_sequence(&self, id: Uuid) -> Option<SavedSequence> {
        self.sequences().into_iter().find(|s| s.id == id)
    }

    pub fn save_sequence(&self, sequence: SavedSequence) -> Result<(), CoreError> {
        let mut all = self.sequences();
        all.push(sequence);
        self.store.save(keys::SAVED_SEQUENCES, &all)
    }

    /// Returns whether anything was removed.
    pub fn delete_sequence(&self, id: Uuid) -> Result<bool, CoreError> {
        let mut all = self.sequences();
        let before = all.len();
        all.retain(|s| s.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.store.save(keys::SAVED_SEQUENCES, &all)?;
        Ok(true)
    }

    pub fn export_sequence(&self, id: Uuid) -> Result<Option<String>, CoreError> {
        self.find_sequence(id)
            .map(|s| ExportedSequence::new(s).to_json())
            .transpose()
    }

    /// Append the sequence from an exchange document. A malformed document
    /// is logged and rejected; the saved list is left as it was.
    ///
    /// Re-importing the same document adds a second entry with the same id.
    pub fn import_sequence(&self, json: &str) -> Result<SavedSequence, CoreError> {
        let doc = ExportedSequence::from_json(json).map_err(|e| {
            tracing::warn!(error = %e, "sequence import rejected");
            e
        })?;
        self.save_sequence(doc.sequence.clone())?;
        tracing::info!(name = %doc.sequence.name, poses = doc.sequence.poses.len(), "sequence imported");
        Ok(doc.sequence)
    }

    // ── Kriyas ───────────────────────────────────────────────────────

    pub fn kriyas(&self) -> Vec<SavedKriya> {
        self.store.load_or_default(keys::SAVED_KRIYAS)
    }

    pub fn find_kriya(&self, id: Uuid) -> Option<SavedKriya> {
        self.kriyas().into_iter().find(|k| k.id == id)
    }

    pub fn save_kriya(&self, kriya: SavedKriya) -> Result<(), CoreError> {
        let mut all = self.kriyas();
        all.push(kriya);
        self.store.save(keys::SAVED_KRIYAS, &all)
    }

    pub fn delete_kriya(&self, id: Uuid) -> Result<bool, CoreError> {
        let mut all = self.kriyas();
        let before = all.len();
        all.retain(|k| k.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.store.save(keys::SAVED_KRIYAS, &all)?;
        Ok(true)
    }
}
