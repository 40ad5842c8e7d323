//! # Yogik Core Library
//!
//! This library provides the core logic for Yogik, a guided yoga and
//! breathing practice timer. Everything runs headless: the CLI binary and
//! any other front end are thin layers over the same core.
//!
//! ## Architecture
//!
//! - **Timer**: a cancellable repeating [`SessionClock`] and the generic
//!   [`PhaseSequencer`] that every practice mode shares
//! - **Prompts**: spoken prompts and tones, and [`Cue`]s describing when they
//!   fire relative to a phase
//! - **Modes**: Yoga, Pranayama, Kriya and Custom as thin [`Practice`]
//!   configurations over the sequencer
//! - **Session**: the Idle/Preparing/Active/Paused/Complete lifecycle and a
//!   tokio [`SessionRunner`] that drives it in real time
//! - **Storage**: a string-keyed JSON [`Store`] (SQLite or in-memory),
//!   settings, history and saved definitions
//!
//! ## Key Components
//!
//! - [`Session`]: pure session state machine, driven by `tick()`
//! - [`SessionRunner`]: session + clock + prompt sink + event stream
//! - [`HistoryLedger`]: capped most-recently-used configurations
//! - [`Library`]: saved sequences and kriyas, `.yogikseq` import/export

pub mod error;
pub mod events;
pub mod history;
pub mod modes;
pub mod prompt;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{CoreError, ImportError, StoreError, ValidationError};
pub use events::Event;
pub use history::{HistoryEntry, HistoryLedger, HISTORY_CAP};
pub use modes::{
    BreathRatio, CustomConfig, KriyaConfig, Mode, Pace, Pose, Practice, PranayamaConfig,
    SavedKriya, SavedSequence, Stage, YogaConfig,
};
pub use prompt::{Cue, Prompt, PromptSink, RecordingSink, SinkCall, ToneId};
pub use session::{
    Effects, Lifecycle, Session, SessionRunner, SessionSettings, SessionSnapshot,
};
pub use storage::{
    ExportedSequence, Library, MemoryStore, Settings, SqliteStore, Store, StoreExt,
};
pub use timer::{
    ClockState, Looping, PassPlan, Phase, PhaseKind, PhaseList, PhaseSequencer, PlanProgress,
    SessionClock, Signal,
};
