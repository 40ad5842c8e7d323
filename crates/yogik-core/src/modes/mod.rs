//! Practice modes.
//!
//! Each mode is a thin configuration over the shared
//! [`PhaseSequencer`](crate::timer::PhaseSequencer): it supplies the phase
//! lists, the exhaustion policy, the prompts, and what gets persisted when a
//! session starts and ends.

pub mod custom;
pub mod kriya;
pub mod pranayama;
pub mod yoga;

pub use custom::{CustomConfig, Pose, SavedSequence};
pub use kriya::{KriyaConfig, SavedKriya, Stage};
pub use pranayama::{BreathRatio, Pace, PranayamaConfig};
pub use yoga::YogaConfig;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::prompt::Prompt;
use crate::session::SessionSettings;
use crate::storage::Store;
use crate::timer::PassPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Yoga,
    Pranayama,
    Kriya,
    Custom,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::Yoga => "yoga",
            Mode::Pranayama => "pranayama",
            Mode::Kriya => "kriya",
            Mode::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// A configured practice, snapshotted when a session starts.
pub trait Practice: Send + Sync {
    fn mode(&self) -> Mode;

    /// Reject configurations that cannot run.
    fn validate(&self) -> Result<(), ValidationError>;

    fn tick_interval_secs(&self) -> f64;

    /// Spoken once when the prep countdown begins.
    fn prep_prompt(&self) -> Prompt;

    fn plan(&self, settings: &SessionSettings) -> Box<dyn PassPlan>;

    /// Persist whatever a start implies (history entry, auto-saved definition).
    fn on_session_start(&self, _store: &dyn Store) {}

    /// Commit the final outcome count.
    fn on_session_end(&self, _store: &dyn Store, _outcome: u32) {}
}
