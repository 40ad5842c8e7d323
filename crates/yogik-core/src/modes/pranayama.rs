//! Pranayama: a four-part breath ratio paced in counts.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{Mode, Practice};
use crate::error::ValidationError;
use crate::history::{self, HistoryConfig};
use crate::prompt::{Cue, Prompt, DEFAULT_RATE};
use crate::session::SessionSettings;
use crate::storage::{keys, Store};
use crate::timer::{Looping, PassPlan, Phase, PhaseKind, PhaseList};

pub const TICK_SECS: f64 = 0.1;

const PREP_PROMPT: &str = "Prepare for breathing exercise. Take position.";
const HOLD_PROMPT: &str = "Hold";

/// Seconds per ratio count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    #[default]
    Fast,
    Medium,
    Slow,
}

impl Pace {
    pub const ALL: [Pace; 3] = [Pace::Fast, Pace::Medium, Pace::Slow];

    pub fn secs_per_count(self) -> f64 {
        match self {
            Pace::Fast => 1.0,
            Pace::Medium => 1.5,
            Pace::Slow => 2.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Pace::Fast => "Fast (1s)",
            Pace::Medium => "Medium (1.5s)",
            Pace::Slow => "Slow (2s)",
        }
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Pace {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Pace::Fast),
            "medium" => Ok(Pace::Medium),
            "slow" => Ok(Pace::Slow),
            _ => Err(ValidationError::InvalidValue {
                field: "pace".into(),
                message: format!("'{s}' is not one of fast, medium, slow"),
            }),
        }
    }
}

/// Inhale : hold : exhale : hold, in counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BreathRatio {
    pub inhale: u32,
    pub hold_in: u32,
    pub exhale: u32,
    pub hold_out: u32,
}

impl Default for BreathRatio {
    fn default() -> Self {
        Self {
            inhale: 4,
            hold_in: 4,
            exhale: 6,
            hold_out: 2,
        }
    }
}

impl BreathRatio {
    pub fn total_counts(&self) -> u32 {
        self.inhale + self.hold_in + self.exhale + self.hold_out
    }
}

impl fmt::Display for BreathRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.inhale, self.hold_in, self.exhale, self.hold_out
        )
    }
}

impl FromStr for BreathRatio {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidValue {
            field: "ratio".into(),
            message: format!("'{s}' is not four counts like 4:4:6:2"),
        };
        let parts = s
            .split(':')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        match parts[..] {
            [inhale, hold_in, exhale, hold_out] => Ok(Self {
                inhale,
                hold_in,
                exhale,
                hold_out,
            }),
            _ => Err(invalid()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PranayamaConfig {
    pub ratio: BreathRatio,
    pub pace: Pace,
    /// Stop after this many rounds. `None` loops until stopped.
    #[serde(default)]
    pub rounds: Option<u32>,
}

impl HistoryConfig for PranayamaConfig {
    fn display_name(&self) -> String {
        self.ratio.to_string()
    }
}

impl PranayamaConfig {
    fn cycle(&self, settings: &SessionSettings) -> PhaseList {
        let unit = self.pace.secs_per_count();
        let parts = [
            (PhaseKind::BreathIn, "Breathe In", self.ratio.inhale, settings.breath_in_label.as_str()),
            (PhaseKind::Hold, "Hold", self.ratio.hold_in, HOLD_PROMPT),
            (PhaseKind::BreathOut, "Breathe Out", self.ratio.exhale, settings.breath_out_label.as_str()),
            (PhaseKind::Hold, "Hold", self.ratio.hold_out, HOLD_PROMPT),
        ];

        parts
            .into_iter()
            .map(|(kind, label, counts, prompt)| {
                let mut phase = Phase::new(kind, label, f64::from(counts) * unit)
                    .counted(unit)
                    .announce(Prompt::speak(prompt, DEFAULT_RATE));
                if settings.progress_sound_enabled {
                    phase = phase.cue(Cue::Count {
                        unit_secs: unit,
                        rate: DEFAULT_RATE,
                    });
                }
                phase
            })
            .collect::<Vec<_>>()
            .into()
    }
}

impl Practice for PranayamaConfig {
    fn mode(&self) -> Mode {
        Mode::Pranayama
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.ratio.total_counts() == 0 {
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

    fn plan(&self, settings: &SessionSettings) -> Box<dyn PassPlan> {
        Box::new(Looping::uniform(self.cycle(settings)).limit(self.rounds))
    }

    fn on_session_start(&self, store: &dyn Store) {
        history::update::<PranayamaConfig, _>(store, keys::PRANAYAMA_HISTORY, |ledger| {
            ledger.record_start(self, Utc::now());
        });
    }

    fn on_session_end(&self, store: &dyn Store, outcome: u32) {
        history::update::<PranayamaConfig, _>(store, keys::PRANAYAMA_HISTORY, |ledger| {
            ledger.record_stop(self, outcome, Utc::now());
        });
    }
}
