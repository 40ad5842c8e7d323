//! Phase sequencer implementation.
//!
//! The sequencer is a tick-driven state machine with no internal thread.
//! The caller delivers elapsed-time deltas through `tick()`; the sequencer
//! advances through the current [`PhaseList`], asks its [`PassPlan`] for
//! the next pass when the list is exhausted, and reports what happened as
//! an ordered list of [`Signal`]s.
//!
//! ## Phase entry
//!
//! ```text
//! enter(i) -> duration(i) == 0 ? enter(i + 1) : run(i)
//! enter(len) -> plan.next_pass() -> enter(0) | Complete
//! ```
//!
//! Elapsed time is reset to zero on every entry. Overshoot from the tick
//! that finished the previous phase is discarded.

use serde::{Deserialize, Serialize};

use super::phase::{Phase, PhaseKind, PhaseList, EPSILON};
use crate::prompt::{CueTracker, Prompt};

/// What the plan wants after a pass.
#[derive(Debug, Clone)]
pub enum Advance {
    /// Run this list next.
    Pass(PhaseList),
    /// Nothing left. The prompts are emitted on the way out.
    Complete(Vec<Prompt>),
}

/// Higher-level counters a plan exposes for display and history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanProgress {
    /// Current round, 1-based.
    pub round: u32,
    /// None for open-ended plans.
    pub rounds_total: Option<u32>,
    /// Index of the current stage or pose.
    pub unit_index: usize,
    pub unit_count: usize,
    /// Name of the current pose, when the plan has one.
    pub unit_label: Option<String>,
    /// Repetition within the current unit, 1-based.
    pub repetition: u32,
    pub repetitions_total: u32,
    /// The outcome recorded to history: laps or completed rounds.
    pub completed: u32,
}

/// Exhaustion policy: supplies phase lists pass by pass.
pub trait PassPlan: Send {
    fn first_pass(&mut self) -> Advance;

    /// Called each time the current list has been fully consumed.
    fn next_pass(&mut self) -> Advance;

    /// Whether `next_pass` eventually returns `Complete` without outside help.
    ///
    /// Unbounded plans get exactly one retry after an all-zero pass; a
    /// second consecutive all-zero pass completes the sequencer.
    fn is_bounded(&self) -> bool;

    fn progress(&self) -> PlanProgress;
}

/// Repeats one phase list, forever or a fixed number of times.
///
/// The first pass may differ from later ones (e.g. no "move to next pose"
/// prompt before the very first transition).
#[derive(Debug, Clone)]
pub struct Looping {
    first: PhaseList,
    repeat: PhaseList,
    limit: Option<u32>,
    farewell: Vec<Prompt>,
    passes: u32,
}

impl Looping {
    pub fn new(first: PhaseList, repeat: PhaseList) -> Self {
        Self {
            first,
            repeat,
            limit: None,
            farewell: Vec::new(),
            passes: 0,
        }
    }

    pub fn uniform(phases: PhaseList) -> Self {
        Self::new(phases.clone(), phases)
    }

    /// Stop after `limit` passes. `None` or zero loops forever.
    pub fn limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit.filter(|n| *n > 0);
        self
    }

    pub fn farewell(mut self, prompts: Vec<Prompt>) -> Self {
        self.farewell = prompts;
        self
    }
}

impl PassPlan for Looping {
    fn first_pass(&mut self) -> Advance {
        Advance::Pass(self.first.clone())
    }

    fn next_pass(&mut self) -> Advance {
        self.passes += 1;
        match self.limit {
            Some(limit) if self.passes >= limit => Advance::Complete(self.farewell.clone()),
            _ => Advance::Pass(self.repeat.clone()),
        }
    }

    fn is_bounded(&self) -> bool {
        self.limit.is_some()
    }

    fn progress(&self) -> PlanProgress {
        PlanProgress {
            round: self.passes + 1,
            rounds_total: self.limit,
            completed: self.passes,
            ..PlanProgress::default()
        }
    }
}

/// Something observable the sequencer did during one call.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Entered {
        index: usize,
        kind: PhaseKind,
        label: String,
        duration_secs: f64,
    },
    Prompt(Prompt),
    PassCompleted {
        passes: u32,
    },
    Complete,
}

/// Generic timed-phase state machine shared by every practice mode.
pub struct PhaseSequencer {
    plan: Box<dyn PassPlan>,
    pass: PhaseList,
    index: usize,
    elapsed: f64,
    passes_completed: u32,
    /// A nonzero phase has been entered during the current pass.
    ran_in_pass: bool,
    started: bool,
    finished: bool,
    cues: CueTracker,
}

impl std::fmt::Debug for PhaseSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseSequencer")
            .field("index", &self.index)
            .field("elapsed", &self.elapsed)
            .field("passes_completed", &self.passes_completed)
            .field("finished", &self.finished)
            .finish()
    }
}

impl PhaseSequencer {
    pub fn new(plan: Box<dyn PassPlan>) -> Self {
        Self {
            plan,
            pass: PhaseList::default(),
            index: 0,
            elapsed: 0.0,
            passes_completed: 0,
            ran_in_pass: false,
            started: false,
            finished: false,
            cues: CueTracker::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn current_phase(&self) -> Option<&Phase> {
        if !self.started || self.finished {
            return None;
        }
        self.pass.get(self.index)
    }

    pub fn phase_index(&self) -> usize {
        self.index
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed
    }

    pub fn remaining_secs(&self) -> f64 {
        self.current_phase()
            .map(|p| (p.duration_secs - self.elapsed).max(0.0))
            .unwrap_or(0.0)
    }

    pub fn progress(&self) -> f64 {
        self.current_phase()
            .map(|p| p.progress(self.elapsed))
            .unwrap_or(0.0)
    }

    pub fn passes_completed(&self) -> u32 {
        self.passes_completed
    }

    pub fn plan_progress(&self) -> PlanProgress {
        self.plan.progress()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Enter the first nonzero phase of the first pass.
    ///
    /// A second call is a no-op.
    pub fn begin(&mut self) -> Vec<Signal> {
        let mut out = Vec::new();
        if self.started {
            return out;
        }
        self.started = true;
        match self.plan.first_pass() {
            Advance::Pass(list) => {
                self.pass = list;
                self.enter(0, &mut out);
            }
            Advance::Complete(prompts) => self.finish(prompts, &mut out),
        }
        out
    }

    /// Deliver `delta` seconds to the current phase.
    pub fn tick(&mut self, delta: f64) -> Vec<Signal> {
        let mut out = Vec::new();
        if !self.started || self.finished {
            return out;
        }
        let Some(phase) = self.pass.phases.get(self.index) else {
            return out;
        };

        self.elapsed += delta;
        out.extend(
            self.cues
                .on_tick(phase, self.elapsed)
                .into_iter()
                .map(Signal::Prompt),
        );

        if self.elapsed + EPSILON >= phase.duration_secs {
            tracing::debug!(
                index = self.index,
                kind = ?phase.kind,
                elapsed = self.elapsed,
                "phase finished"
            );
            self.enter(self.index + 1, &mut out);
        }
        out
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter(&mut self, mut index: usize, out: &mut Vec<Signal>) {
        let mut empty_passes = 0u32;
        loop {
            while self.pass.get(index).is_some_and(Phase::is_skipped) {
                index += 1;
            }

            if let Some(phase) = self.pass.get(index) {
                self.index = index;
                self.elapsed = 0.0;
                self.cues.reset();
                self.ran_in_pass = true;
                out.push(Signal::Entered {
                    index,
                    kind: phase.kind,
                    label: phase.label.clone(),
                    duration_secs: phase.duration_secs,
                });
                out.extend(phase.on_enter.iter().cloned().map(Signal::Prompt));
                return;
            }

            // Pass exhausted.
            if self.ran_in_pass {
                self.passes_completed += 1;
                empty_passes = 0;
                out.push(Signal::PassCompleted {
                    passes: self.passes_completed,
                });
            } else {
                empty_passes += 1;
                if empty_passes > 1 && !self.plan.is_bounded() {
                    tracing::debug!("consecutive all-zero passes, completing");
                    self.finish(Vec::new(), out);
                    return;
                }
            }
            self.ran_in_pass = false;

            match self.plan.next_pass() {
                Advance::Pass(list) => {
                    self.pass = list;
                    index = 0;
                }
                Advance::Complete(prompts) => {
                    self.finish(prompts, out);
                    return;
                }
            }
        }
    }

    fn finish(&mut self, prompts: Vec<Prompt>, out: &mut Vec<Signal>) {
        self.finished = true;
        self.elapsed = 0.0;
        out.extend(prompts.into_iter().map(Signal::Prompt));
        out.push(Signal::Complete);
    }
}
