//! Global user settings.
//!
//! Stores user preferences including:
//! - Voice used for spoken prompts
//! - Prep countdown before a session starts ticking
//! - Whether pranayama counts are spoken
//! - Breath labels spoken at inhale/exhale
//! - Tone played during yoga holds
//!
//! Settings are persisted as one JSON record under [`keys::SETTINGS`] and
//! copied into a [`SessionSettings`] snapshot when a session starts.

use serde::{Deserialize, Serialize};

use super::{keys, Store, StoreExt};
use crate::error::{CoreError, ValidationError};
use crate::prompt::ToneId;
use crate::session::SessionSettings;

pub const PREP_TIME_RANGE: std::ops::RangeInclusive<u32> = 1..=60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub voice_id: String,
    #[serde(default = "default_prep_time")]
    pub prep_time_secs: u32,
    #[serde(default = "default_true")]
    pub progress_sound_enabled: bool,
    #[serde(default = "default_breath_in_label")]
    pub breath_in_label: String,
    #[serde(default = "default_breath_out_label")]
    pub breath_out_label: String,
    #[serde(default = "default_yoga_tone")]
    pub yoga_progress_tone: ToneId,
}

fn default_prep_time() -> u32 {
    5
}
fn default_true() -> bool {
    true
}
fn default_breath_in_label() -> String {
    "Inhale".into()
}
fn default_breath_out_label() -> String {
    "Exhale".into()
}
fn default_yoga_tone() -> ToneId {
    1057
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            voice_id: String::new(),
            prep_time_secs: default_prep_time(),
            progress_sound_enabled: true,
            breath_in_label: default_breath_in_label(),
            breath_out_label: default_breath_out_label(),
            yoga_progress_tone: default_yoga_tone(),
        }
    }
}

impl Settings {
    /// Load from `store`, using defaults for anything missing or corrupt.
    pub fn load(store: &dyn Store) -> Self {
        let mut settings: Settings = store.load_or_default(keys::SETTINGS);
        settings.prep_time_secs = clamp_prep(settings.prep_time_secs);
        settings
    }

    pub fn save(&self, store: &dyn Store) -> Result<(), CoreError> {
        store.save(keys::SETTINGS, self)
    }

    /// Immutable copy handed to a session at start.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            voice_id: self.voice_id.clone(),
            prep_time_secs: clamp_prep(self.prep_time_secs),
            progress_sound_enabled: self.progress_sound_enabled,
            breath_in_label: self.breath_in_label.clone(),
            breath_out_label: self.breath_out_label.clone(),
        }
    }

    /// Set a field by its serialized name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ValidationError> {
        let invalid = |message: &str| ValidationError::InvalidValue {
            field: key.to_string(),
            message: message.to_string(),
        };
        match key {
            "voice_id" => self.voice_id = value.to_string(),
            "prep_time_secs" => {
                let secs: u32 = value.parse().map_err(|_| invalid("expected seconds"))?;
                if !PREP_TIME_RANGE.contains(&secs) {
                    return Err(invalid("must be between 1 and 60"));
                }
                self.prep_time_secs = secs;
            }
            "progress_sound_enabled" => {
                self.progress_sound_enabled =
                    value.parse().map_err(|_| invalid("expected true or false"))?;
            }
            "breath_in_label" => self.breath_in_label = value.to_string(),
            "breath_out_label" => self.breath_out_label = value.to_string(),
            "yoga_progress_tone" => {
                self.yoga_progress_tone = value.parse().map_err(|_| invalid("expected tone id"))?;
            }
            _ => return Err(invalid("unknown setting")),
        }
        Ok(())
    }
}

fn clamp_prep(secs: u32) -> u32 {
    secs.clamp(*PREP_TIME_RANGE.start(), *PREP_TIME_RANGE.end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn missing_fields_use_defaults() {
        let store = MemoryStore::new();
        store
            .set_raw(keys::SETTINGS, r#"{"voice_id":"samantha"}"#)
            .unwrap();
        let settings = Settings::load(&store);
        assert_eq!(settings.voice_id, "samantha");
        assert_eq!(settings.prep_time_secs, 5);
        assert_eq!(settings.breath_in_label, "Inhale");
        assert!(settings.progress_sound_enabled);
    }

    #[test]
    fn corrupt_record_loads_defaults() {
        let store = MemoryStore::new();
        store.set_raw(keys::SETTINGS, "[1,2").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn stored_prep_time_is_clamped() {
        let store = MemoryStore::new();
        store
            .set_raw(keys::SETTINGS, r#"{"prep_time_secs":0}"#)
            .unwrap();
        assert_eq!(Settings::load(&store).prep_time_secs, 1);
    }

    #[test]
    fn set_validates() {
        let mut settings = Settings::default();
        settings.set("prep_time_secs", "12").unwrap();
        assert_eq!(settings.prep_time_secs, 12);
        assert!(settings.set("prep_time_secs", "61").is_err());
        assert!(settings.set("progress_sound_enabled", "maybe").is_err());
        assert!(settings.set("colour", "blue").is_err());
        settings.set("breath_out_label", "Out").unwrap();
        assert_eq!(settings.session_settings().breath_out_label, "Out");
    }

    #[test]
    fn round_trip_through_store() {
        let store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.voice_id = "karen".into();
        settings.save(&store).unwrap();
        assert_eq!(Settings::load(&store), settings);
    }
}
