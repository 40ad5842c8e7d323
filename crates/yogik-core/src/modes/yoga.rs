//! Yoga holds: transition into a pose, hold it, repeat.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{Mode, Practice};
use crate::error::ValidationError;
use crate::history::{self, HistoryConfig};
use crate::prompt::{Cue, Prompt, ToneId, DEFAULT_RATE};
use crate::session::SessionSettings;
use crate::storage::{keys, Store};
use crate::timer::{Looping, PassPlan, Phase, PhaseKind, PhaseList};

pub const TICK_SECS: f64 = 1.0;

const PREP_PROMPT: &str = "Prepare for the session. Move into first pose";
const HOLD_PROMPT: &str = "Hold";
const NEXT_POSE_PROMPT: &str = "Move to next pose";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YogaConfig {
    pub transition_secs: u32,
    pub hold_secs: u32,
    /// Played on every tick of a hold. 0 is silent.
    pub progress_tone: ToneId,
    /// Stop after this many laps. `None` loops until stopped.
    #[serde(default)]
    pub laps: Option<u32>,
}

impl Default for YogaConfig {
    fn default() -> Self {
        Self {
            transition_secs: 5,
            hold_secs: 10,
            progress_tone: 1057,
            laps: None,
        }
    }
}

impl HistoryConfig for YogaConfig {
    fn display_name(&self) -> String {
        format!("hold-{}", self.hold_secs)
    }
}

impl YogaConfig {
    fn pass(&self, announce_transition: bool) -> PhaseList {
        let mut transition = Phase::new(
            PhaseKind::Transition,
            "Transition",
            f64::from(self.transition_secs),
        );
        if announce_transition {
            transition = transition.announce(Prompt::speak(NEXT_POSE_PROMPT, DEFAULT_RATE));
        }

        let mut hold = Phase::new(PhaseKind::Hold, "Hold", f64::from(self.hold_secs));
        // Without a transition the hold simply restarts; there is nothing to
        // announce.
        if self.transition_secs > 0 {
            hold = hold.announce(Prompt::speak(HOLD_PROMPT, DEFAULT_RATE));
        }
        if self.progress_tone != 0 {
            hold = hold.cue(Cue::EveryTick(Prompt::tone(self.progress_tone)));
        }

        vec![transition, hold].into()
    }
}

impl Practice for YogaConfig {
    fn mode(&self) -> Mode {
        Mode::Yoga
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.transition_secs == 0 && self.hold_secs == 0 {
            return Err(ValidationError::AllPhasesZero);
        }
        Ok(())
    }

    fn tick_interval_secs(&self) -> f64 {
        TICK_SECS
    }

    fn prep_prompt(&self) -> Prompt {
        Prompt::speak(PREP_PROMPT, DEFAULT_RATE)
    }

    fn plan(&self, _settings: &SessionSettings) -> Box<dyn PassPlan> {
        Box::new(Looping::new(self.pass(false), self.pass(true)).limit(self.laps))
    }

    fn on_session_start(&self, store: &dyn Store) {
        history::update::<YogaConfig, _>(store, keys::YOGA_HISTORY, |ledger| {
            ledger.record_start(self, Utc::now());
        });
    }

    fn on_session_end(&self, store: &dyn Store, outcome: u32) {
        history::update::<YogaConfig, _>(store, keys::YOGA_HISTORY, |ledger| {
            ledger.record_stop(self, outcome, Utc::now());
        });
    }
}
