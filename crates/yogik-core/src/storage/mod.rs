mod database;
pub mod library;
mod memory;
mod settings;

pub use database::SqliteStore;
pub use library::{ExportedSequence, Library, SEQUENCE_FILE_EXTENSION, SEQUENCE_FORMAT_VERSION};
pub use memory::MemoryStore;
pub use settings::Settings;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CoreError, StoreError};

/// Storage keys. Each names an independent JSON record.
pub mod keys {
    pub const SETTINGS: &str = "settings";
    pub const YOGA_HISTORY: &str = "yogik.history.yoga";
    pub const PRANAYAMA_HISTORY: &str = "yogik.history.pranayama";
    pub const SAVED_SEQUENCES: &str = "yogik.saved.sequences";
    pub const SAVED_KRIYAS: &str = "yogik.saved.kriyas";
}

/// String-keyed blob store. Values are JSON text.
pub trait Store: Send + Sync {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed access on top of [`Store`].
pub trait StoreExt: Store {
    /// Read and decode `key`, falling back to `T::default()` when the key is
    /// missing, unreadable, or holds malformed JSON.
    fn load_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.get_raw(key) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(key, error = %e, "discarding malformed record");
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "store read failed, using default");
                T::default()
            }
        }
    }

    fn save<T>(&self, key: &str, value: &T) -> Result<(), CoreError>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, &json)?;
        Ok(())
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// Returns `~/.config/yogik[-dev]/` based on YOGIK_ENV.
///
/// Set YOGIK_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("YOGIK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("yogik-dev")
    } else {
        base_dir.join("yogik")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir(e.to_string()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
    struct Record {
        count: u32,
    }

    #[test]
    fn malformed_json_falls_back_to_default() {
        let store = MemoryStore::new();
        store.set_raw("k", "{not json").unwrap();
        let record: Record = store.load_or_default("k");
        assert_eq!(record, Record::default());
    }

    #[test]
    fn missing_key_is_default() {
        let store = MemoryStore::new();
        let list: Vec<Record> = store.load_or_default("absent");
        assert!(list.is_empty());
    }

    #[test]
    fn save_then_load() {
        let store = MemoryStore::new();
        store.save("k", &Record { count: 3 }).unwrap();
        let record: Record = store.load_or_default("k");
        assert_eq!(record.count, 3);
    }
}
