use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::modes::Mode;
use crate::session::SessionSnapshot;
use crate::timer::PhaseKind;

/// Every session state change produces an Event.
/// The presentation layer consumes them in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionPreparing {
        mode: Mode,
        prep_secs: u32,
        at: DateTime<Utc>,
    },
    SessionStarted {
        mode: Mode,
        at: DateTime<Utc>,
    },
    PhaseEntered {
        index: usize,
        kind: PhaseKind,
        label: String,
        duration_secs: f64,
        at: DateTime<Utc>,
    },
    PassCompleted {
        passes: u32,
        at: DateTime<Utc>,
    },
    SessionPaused {
        elapsed_secs: f64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        at: DateTime<Utc>,
    },
    /// Final unit of the final round finished. The session stays in
    /// `Complete` until stopped.
    SessionCompleted {
        mode: Mode,
        outcome: u32,
        at: DateTime<Utc>,
    },
    SessionStopped {
        mode: Mode,
        outcome: u32,
        at: DateTime<Utc>,
    },
    /// Periodic or on-demand view for displays.
    Snapshot {
        snapshot: SessionSnapshot,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::SessionCompleted { .. } | Event::SessionStopped { .. }
        )
    }
}
