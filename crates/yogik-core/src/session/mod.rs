//! Session lifecycle shared by every practice mode.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Preparing -> Active <-> Paused -> Complete -> Idle
//!            |            |          |
//!            +------------+----------+-----> Idle (stop)
//! ```
//!
//! `Session` is a pure state machine: it never sleeps or spawns. Timing is
//! supplied from outside, by [`SessionRunner`] in production and by direct
//! `tick()` calls in tests. Every command returns the [`Effects`] it caused.

mod runner;

pub use runner::SessionRunner;

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;
use crate::modes::{Mode, Practice};
use crate::prompt::Prompt;
use crate::timer::{PhaseKind, PhaseSequencer, PlanProgress, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Idle,
    Preparing,
    Active,
    Paused,
    Complete,
}

/// Settings copied into a session when it is created.
///
/// Later edits to the persisted settings do not reach a running session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub voice_id: String,
    pub prep_time_secs: u32,
    pub progress_sound_enabled: bool,
    pub breath_in_label: String,
    pub breath_out_label: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        crate::storage::Settings::default().session_settings()
    }
}

/// Read-only view of a session for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: Mode,
    pub lifecycle: Lifecycle,
    pub phase_index: Option<usize>,
    pub phase_kind: PhaseKind,
    pub phase_label: String,
    pub elapsed_secs: f64,
    pub remaining_secs: f64,
    pub duration_secs: f64,
    /// 0.0 ..= 1.0 within the current phase.
    pub progress: f64,
    pub passes: u32,
    pub plan: PlanProgress,
}

/// Side effects produced by one session command.
#[derive(Debug, Clone, Default)]
pub struct Effects {
    pub prompts: Vec<Prompt>,
    pub events: Vec<Event>,
}

impl Effects {
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty() && self.events.is_empty()
    }
}

pub struct Session {
    practice: Box<dyn Practice>,
    settings: SessionSettings,
    lifecycle: Lifecycle,
    sequencer: Option<PhaseSequencer>,
    /// Token that a pending Preparing -> Active transition must present.
    prep_generation: u64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.practice.mode())
            .field("lifecycle", &self.lifecycle)
            .field("sequencer", &self.sequencer)
            .finish()
    }
}

impl Session {
    pub fn new(practice: impl Practice + 'static, settings: SessionSettings) -> Self {
        Self::from_boxed(Box::new(practice), settings)
    }

    pub fn from_boxed(practice: Box<dyn Practice>, settings: SessionSettings) -> Self {
        Self {
            practice,
            settings,
            lifecycle: Lifecycle::Idle,
            sequencer: None,
            prep_generation: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn mode(&self) -> Mode {
        self.practice.mode()
    }

    pub fn practice(&self) -> &dyn Practice {
        self.practice.as_ref()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn tick_interval_secs(&self) -> f64 {
        self.practice.tick_interval_secs()
    }

    pub fn prep_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.settings.prep_time_secs))
    }

    /// Token for the currently pending prep transition.
    pub fn prep_token(&self) -> u64 {
        self.prep_generation
    }

    pub fn sequencer(&self) -> Option<&PhaseSequencer> {
        self.sequencer.as_ref()
    }

    /// Laps for yoga, completed rounds for the other modes.
    pub fn outcome(&self) -> u32 {
        self.sequencer
            .as_ref()
            .map(|s| s.plan_progress().completed)
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let seq = self.sequencer.as_ref();
        let phase = seq.and_then(PhaseSequencer::current_phase);
        SessionSnapshot {
            mode: self.mode(),
            lifecycle: self.lifecycle,
            phase_index: phase.and(seq.map(PhaseSequencer::phase_index)),
            phase_kind: phase.map(|p| p.kind).unwrap_or(PhaseKind::Idle),
            phase_label: phase.map(|p| p.label.clone()).unwrap_or_default(),
            elapsed_secs: seq.map(PhaseSequencer::elapsed_secs).unwrap_or(0.0),
            remaining_secs: seq.map(PhaseSequencer::remaining_secs).unwrap_or(0.0),
            duration_secs: phase.map(|p| p.duration_secs).unwrap_or(0.0),
            progress: seq.map(PhaseSequencer::progress).unwrap_or(0.0),
            passes: seq.map(PhaseSequencer::passes_completed).unwrap_or(0),
            plan: seq.map(PhaseSequencer::plan_progress).unwrap_or_default(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Validate, build the phase plan and enter Preparing.
    ///
    /// Only valid from Idle; otherwise nothing happens. An invalid
    /// configuration leaves the session Idle.
    pub fn begin(&mut self) -> Result<Effects, ValidationError> {
        let mut effects = Effects::default();
        if self.lifecycle != Lifecycle::Idle {
            return Ok(effects);
        }
        self.practice.validate()?;

        self.sequencer = Some(PhaseSequencer::new(self.practice.plan(&self.settings)));
        self.lifecycle = Lifecycle::Preparing;
        self.prep_generation += 1;
        tracing::info!(mode = %self.mode(), prep_secs = self.settings.prep_time_secs, "session preparing");

        effects.prompts.push(self.practice.prep_prompt());
        effects.events.push(Event::SessionPreparing {
            mode: self.mode(),
            prep_secs: self.settings.prep_time_secs,
            at: Utc::now(),
        });
        Ok(effects)
    }

    /// Finish the prep countdown. Ignored unless still Preparing with the
    /// same token that `begin` issued.
    pub fn activate(&mut self, token: u64) -> Option<Effects> {
        if self.lifecycle != Lifecycle::Preparing || token != self.prep_generation {
            return None;
        }
        let signals = self.sequencer.as_mut()?.begin();
        self.lifecycle = Lifecycle::Active;
        tracing::info!(mode = %self.mode(), "session active");

        let mut effects = Effects::default();
        effects.events.push(Event::SessionStarted {
            mode: self.mode(),
            at: Utc::now(),
        });
        self.absorb(signals, &mut effects);
        Some(effects)
    }

    /// Invalidate any pending prep transition.
    pub fn cancel_prep(&mut self) {
        self.prep_generation += 1;
    }

    pub fn tick(&mut self, delta: f64) -> Effects {
        let mut effects = Effects::default();
        if self.lifecycle != Lifecycle::Active {
            return effects;
        }
        let signals = match self.sequencer.as_mut() {
            Some(seq) => seq.tick(delta),
            None => return effects,
        };
        self.absorb(signals, &mut effects);
        effects
    }

    pub fn pause(&mut self) -> Option<Effects> {
        if self.lifecycle != Lifecycle::Active {
            return None;
        }
        self.lifecycle = Lifecycle::Paused;
        let elapsed_secs = self
            .sequencer
            .as_ref()
            .map(PhaseSequencer::elapsed_secs)
            .unwrap_or(0.0);
        Some(Effects {
            prompts: Vec::new(),
            events: vec![Event::SessionPaused {
                elapsed_secs,
                at: Utc::now(),
            }],
        })
    }

    pub fn resume(&mut self) -> Option<Effects> {
        if self.lifecycle != Lifecycle::Paused {
            return None;
        }
        self.lifecycle = Lifecycle::Active;
        Some(Effects {
            prompts: Vec::new(),
            events: vec![Event::SessionResumed { at: Utc::now() }],
        })
    }

    /// Tear the run down and return its outcome count. No-op when Idle.
    pub fn stop(&mut self) -> Option<(u32, Effects)> {
        if self.lifecycle == Lifecycle::Idle {
            return None;
        }
        let outcome = self.outcome();
        self.prep_generation += 1;
        self.sequencer = None;
        self.lifecycle = Lifecycle::Idle;
        tracing::info!(mode = %self.mode(), outcome, "session stopped");

        let effects = Effects {
            prompts: Vec::new(),
            events: vec![Event::SessionStopped {
                mode: self.mode(),
                outcome,
                at: Utc::now(),
            }],
        };
        Some((outcome, effects))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn absorb(&mut self, signals: Vec<Signal>, effects: &mut Effects) {
        for signal in signals {
            match signal {
                Signal::Entered {
                    index,
                    kind,
                    label,
                    duration_secs,
                } => effects.events.push(Event::PhaseEntered {
                    index,
                    kind,
                    label,
                    duration_secs,
                    at: Utc::now(),
                }),
                Signal::Prompt(prompt) => effects.prompts.push(prompt),
                Signal::PassCompleted { passes } => effects.events.push(Event::PassCompleted {
                    passes,
                    at: Utc::now(),
                }),
                Signal::Complete => {
                    self.lifecycle = Lifecycle::Complete;
                    let outcome = self.outcome();
                    tracing::info!(mode = %self.mode(), outcome, "session complete");
                    effects.events.push(Event::SessionCompleted {
                        mode: self.mode(),
                        outcome,
                        at: Utc::now(),
                    });
                }
            }
        }
    }
}
