use serde::{Deserialize, Serialize};

use crate::prompt::{Cue, Prompt};

/// Slack absorbed when comparing accumulated float time to a duration.
///
/// Summing 0.05 s ticks drifts below the exact total; without this a 0.25 s
/// phase would need a sixth tick.
pub const EPSILON: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Transition,
    Hold,
    BreathIn,
    BreathOut,
    Rest,
    Idle,
}

/// One timed segment of a practice cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub kind: PhaseKind,
    /// Display label ("Breathe In", "Hold", a pose name...).
    pub label: String,
    pub duration_secs: f64,
    /// Emitted in order when the phase is entered. Never emitted for a
    /// skipped (zero-duration) phase.
    pub on_enter: Vec<Prompt>,
    pub cues: Vec<Cue>,
    /// When set, progress is reported in discrete counts of this size
    /// instead of raw seconds.
    pub count_unit_secs: Option<f64>,
}

impl Phase {
    pub fn new(kind: PhaseKind, label: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            kind,
            label: label.into(),
            duration_secs: duration_secs.max(0.0),
            on_enter: Vec::new(),
            cues: Vec::new(),
            count_unit_secs: None,
        }
    }

    pub fn announce(mut self, prompt: Prompt) -> Self {
        self.on_enter.push(prompt);
        self
    }

    pub fn cue(mut self, cue: Cue) -> Self {
        self.cues.push(cue);
        self
    }

    pub fn counted(mut self, unit_secs: f64) -> Self {
        if unit_secs > 0.0 {
            self.count_unit_secs = Some(unit_secs);
        }
        self
    }

    pub fn is_skipped(&self) -> bool {
        self.duration_secs <= EPSILON
    }

    /// Progress fraction 0.0 ..= 1.0 after `elapsed` seconds in the phase.
    ///
    /// Counted phases show the current count as already filled on entry,
    /// then refill it from empty, so the value dips within each count
    /// (0.25, 0.125, 0.5 for four counts). Displays depend on this shape.
    pub fn progress(&self, elapsed: f64) -> f64 {
        if self.is_skipped() {
            return 0.0;
        }
        let fraction = match self.count_unit_secs {
            Some(unit) => {
                let total = (self.duration_secs / unit).round().max(1.0);
                let done = ((elapsed + EPSILON) / unit).floor().min(total);
                let remaining = total - done;
                if remaining <= 0.0 {
                    return 1.0;
                }
                let partial = ((elapsed - done * unit) / unit).max(0.0);
                1.0 - (remaining - 1.0 + partial) / total
            }
            None => elapsed / self.duration_secs,
        };
        fraction.clamp(0.0, 1.0)
    }
}

/// Ordered phases for one pass through a cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseList {
    pub phases: Vec<Phase>,
}

impl PhaseList {
    pub fn new(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    /// True when nothing in the list would consume a tick.
    pub fn is_all_zero(&self) -> bool {
        self.phases.iter().all(Phase::is_skipped)
    }

    pub fn total_secs(&self) -> f64 {
        self.phases.iter().map(|p| p.duration_secs).sum()
    }
}

impl From<Vec<Phase>> for PhaseList {
    fn from(phases: Vec<Phase>) -> Self {
        Self::new(phases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_negative_durations_are_skipped() {
        assert!(Phase::new(PhaseKind::Hold, "Hold", 0.0).is_skipped());
        assert!(Phase::new(PhaseKind::Hold, "Hold", -3.0).is_skipped());
        assert!(!Phase::new(PhaseKind::Hold, "Hold", 0.05).is_skipped());
    }

    #[test]
    fn plain_progress_is_elapsed_over_duration() {
        let p = Phase::new(PhaseKind::Hold, "Hold", 10.0);
        assert_eq!(p.progress(0.0), 0.0);
        assert!((p.progress(2.5) - 0.25).abs() < 1e-9);
        assert_eq!(p.progress(12.0), 1.0);
    }

    #[test]
    fn counted_progress_starts_one_count_in() {
        // 4 counts of 1 s: the first count is shown as already filled.
        let p = Phase::new(PhaseKind::BreathIn, "Breathe In", 4.0).counted(1.0);
        assert!((p.progress(0.0) - 0.25).abs() < 1e-9);
        assert!((p.progress(0.5) - 0.125).abs() < 1e-9);
        assert!((p.progress(1.0) - 0.5).abs() < 1e-9);
        assert_eq!(p.progress(4.0), 1.0);
    }

    #[test]
    fn all_zero_list() {
        let list = PhaseList::new(vec![
            Phase::new(PhaseKind::Transition, "Transition", 0.0),
            Phase::new(PhaseKind::Hold, "Hold", 0.0),
        ]);
        assert!(list.is_all_zero());
        assert_eq!(list.total_secs(), 0.0);
    }
}
