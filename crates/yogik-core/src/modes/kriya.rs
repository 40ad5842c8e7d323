//! Kriya: rapid breathing through an ordered list of stages.
//!
//! ```text
//! round:  stage[0] x counts -> stage[1] x counts -> ... -> [rest] -> next round
//! stage:  BreathIn -> BreathOut
//! ```
//!
//! Each breath pair is one pass of the sequencer. Rest is inserted between
//! rounds, never after the last one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Mode, Practice};
use crate::error::ValidationError;
use crate::prompt::{kriya_rate_for, Cue, Prompt, DEFAULT_RATE};
use crate::session::SessionSettings;
use crate::storage::{Library, Store};
use crate::timer::{Advance, PassPlan, Phase, PhaseKind, PhaseList, PlanProgress};

pub const TICK_SECS: f64 = 0.05;

/// Remaining rest time at which the "get ready" prompt fires.
pub const GET_READY_LEAD_SECS: f64 = 3.0;

const PREP_PROMPT: &str = "Prepare for breathing exercise. Take position.";
const REST_PROMPT: &str = "Rest";
const GET_READY_PROMPT: &str = "Get ready";
const FINAL_PROMPT: &str = "Relax, take few long and deep breaths";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub breath_in_seconds: f64,
    pub breath_out_seconds: f64,
    pub counts: u32,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(1.0, 1.0, 20)
    }
}

impl Stage {
    pub fn new(breath_in_seconds: f64, breath_out_seconds: f64, counts: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            breath_in_seconds,
            breath_out_seconds,
            counts,
        }
    }

    fn is_empty(&self) -> bool {
        self.breath_in_seconds <= 0.0 && self.breath_out_seconds <= 0.0
    }

    /// A stage always breathes at least once.
    fn repetitions(&self) -> u32 {
        self.counts.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KriyaConfig {
    /// Saved under this name when the session starts. Empty means unsaved.
    #[serde(default)]
    pub name: String,
    pub stages: Vec<Stage>,
    pub breath_in_label: String,
    pub breath_out_label: String,
    /// Times the whole stage list is run.
    pub repeat_count: u32,
    /// Rest between rounds. 0 disables it.
    #[serde(default)]
    pub rest_secs: u32,
}

impl Default for KriyaConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            stages: vec![Stage::default()],
            breath_in_label: "In".into(),
            breath_out_label: "Out".into(),
            repeat_count: 1,
            rest_secs: 0,
        }
    }
}

/// A kriya as persisted in the saved list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedKriya {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "rounds", alias = "stages")]
    pub stages: Vec<Stage>,
    pub kriya_breath_in_label: String,
    pub kriya_breath_out_label: String,
    pub repeat_count: u32,
    #[serde(default)]
    pub rest_seconds: u32,
}

impl SavedKriya {
    /// Config for running this kriya. The name is left empty so a run does
    /// not save it a second time.
    pub fn to_config(&self) -> KriyaConfig {
        KriyaConfig {
            name: String::new(),
            stages: self.stages.clone(),
            breath_in_label: self.kriya_breath_in_label.clone(),
            breath_out_label: self.kriya_breath_out_label.clone(),
            repeat_count: self.repeat_count,
            rest_secs: self.rest_seconds,
        }
    }
}

impl KriyaConfig {
    /// Snapshot for the saved list, or `None` without a name.
    pub fn to_saved(&self) -> Option<SavedKriya> {
        let name = self.name.trim();
        if name.is_empty() || self.stages.is_empty() {
            return None;
        }
        Some(SavedKriya {
            id: Uuid::new_v4(),
            name: name.to_string(),
            stages: self.stages.clone(),
            kriya_breath_in_label: self.breath_in_label.clone(),
            kriya_breath_out_label: self.breath_out_label.clone(),
            repeat_count: self.repeat_count,
            rest_seconds: self.rest_secs,
        })
    }
}

impl Practice for KriyaConfig {
    fn mode(&self) -> Mode {
        Mode::Kriya
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.stages.is_empty() {
            return Err(ValidationError::EmptyCollection("stages".into()));
        }
        if let Some(index) = self.stages.iter().position(Stage::is_empty) {
            return Err(ValidationError::EmptyStage { index });
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
        Box::new(KriyaPlan::new(self.clone()))
    }

    fn on_session_start(&self, store: &dyn Store) {
        let Some(saved) = self.to_saved() else {
            return;
        };
        if let Err(e) = Library::new(store).save_kriya(saved) {
            tracing::warn!(error = %e, "failed to auto-save kriya");
        }
    }
}

/// Walks stages, repetitions and rounds one breath pair at a time.
#[derive(Debug, Clone)]
pub struct KriyaPlan {
    config: KriyaConfig,
    stage: usize,
    /// 1-based repetition within the current stage.
    repetition: u32,
    rounds_completed: u32,
    resting: bool,
}

impl KriyaPlan {
    pub fn new(config: KriyaConfig) -> Self {
        Self {
            config,
            stage: 0,
            repetition: 1,
            rounds_completed: 0,
            resting: false,
        }
    }

    fn rounds_total(&self) -> u32 {
        self.config.repeat_count.max(1)
    }

    fn breath_pair(&self) -> Advance {
        let Some(stage) = self.config.stages.get(self.stage) else {
            return Advance::Complete(Vec::new());
        };
        let inhale = &self.config.breath_in_label;
        let exhale = &self.config.breath_out_label;
        Advance::Pass(PhaseList::new(vec![
            Phase::new(PhaseKind::BreathIn, inhale.clone(), stage.breath_in_seconds).announce(
                Prompt::speak(inhale.clone(), kriya_rate_for(stage.breath_in_seconds)),
            ),
            Phase::new(PhaseKind::BreathOut, exhale.clone(), stage.breath_out_seconds).announce(
                Prompt::speak(exhale.clone(), kriya_rate_for(stage.breath_out_seconds)),
            ),
        ]))
    }

    fn rest(&self) -> Advance {
        Advance::Pass(PhaseList::new(vec![Phase::new(
            PhaseKind::Rest,
            "Rest",
            f64::from(self.config.rest_secs),
        )
        .announce(Prompt::speak(REST_PROMPT, DEFAULT_RATE))
        .cue(Cue::BeforeEnd {
            lead_secs: GET_READY_LEAD_SECS,
            prompt: Prompt::speak(GET_READY_PROMPT, DEFAULT_RATE),
        })]))
    }

    fn start_round(&mut self) -> Advance {
        self.stage = 0;
        self.repetition = 1;
        self.breath_pair()
    }
}

impl PassPlan for KriyaPlan {
    fn first_pass(&mut self) -> Advance {
        self.start_round()
    }

    fn next_pass(&mut self) -> Advance {
        if self.resting {
            self.resting = false;
            return self.start_round();
        }

        let repetitions = self
            .config
            .stages
            .get(self.stage)
            .map(Stage::repetitions)
            .unwrap_or(1);
        if self.repetition < repetitions {
            self.repetition += 1;
            return self.breath_pair();
        }
        if self.stage + 1 < self.config.stages.len() {
            self.stage += 1;
            self.repetition = 1;
            return self.breath_pair();
        }

        self.rounds_completed += 1;
        tracing::debug!(rounds = self.rounds_completed, "kriya round finished");
        if self.rounds_completed >= self.rounds_total() {
            return Advance::Complete(vec![Prompt::speak(FINAL_PROMPT, DEFAULT_RATE)]);
        }
        if self.config.rest_secs > 0 {
            self.resting = true;
            return self.rest();
        }
        self.start_round()
    }

    fn is_bounded(&self) -> bool {
        true
    }

    fn progress(&self) -> PlanProgress {
        let total = self.rounds_total();
        PlanProgress {
            round: (self.rounds_completed + 1).min(total),
            rounds_total: Some(total),
            unit_index: self.stage,
            unit_count: self.config.stages.len(),
            unit_label: None,
            repetition: self.repetition,
            repetitions_total: self
                .config
                .stages
                .get(self.stage)
                .map(Stage::repetitions)
                .unwrap_or(0),
            completed: self.rounds_completed,
        }
    }
}
