//! Repeating session ticker.
//!
//! Every tick delivers exactly the configured interval as its delta. Wall
//! clock drift between ticks is not measured or corrected, so a long hold
//! can drift slightly from true elapsed time under scheduling jitter.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Active -> Paused -> Active -> Idle
//! ```
//!
//! The tick handler runs while the clock's lock is held, so once `stop()`
//! returns no further tick can reach the handler, including one that was
//! already due.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockState {
    Idle,
    Active,
    Paused,
}

/// Receives each tick's delta in seconds. Returning `Break` stops the clock.
pub type TickHandler = Box<dyn FnMut(f64) -> ControlFlow<()> + Send>;

struct ClockInner {
    state: ClockState,
    interval_secs: f64,
    /// Bumped whenever the running ticker task must stand down.
    generation: u64,
    handler: Option<TickHandler>,
    task: Option<JoinHandle<()>>,
}

/// Cancellable repeating ticker with pause/resume.
///
/// Cloning yields another handle to the same clock. The ticker task holds
/// only a weak reference, so dropping every handle ends it.
///
/// `start` and `resume` spawn onto the current tokio runtime and must be
/// called from within one. The handler must not call back into the clock.
#[derive(Clone)]
pub struct SessionClock {
    inner: Arc<Mutex<ClockInner>>,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockInner {
                state: ClockState::Idle,
                interval_secs: 1.0,
                generation: 0,
                handler: None,
                task: None,
            })),
        }
    }

    pub fn state(&self) -> ClockState {
        lock(&self.inner).state
    }

    pub fn interval_secs(&self) -> f64 {
        lock(&self.inner).interval_secs
    }

    /// Begin ticking every `interval_secs`. No-op unless Idle.
    pub fn start<F>(&self, interval_secs: f64, on_tick: F) -> bool
    where
        F: FnMut(f64) -> ControlFlow<()> + Send + 'static,
    {
        let mut inner = lock(&self.inner);
        if inner.state != ClockState::Idle || !(interval_secs > 0.0) {
            return false;
        }
        inner.state = ClockState::Active;
        inner.interval_secs = interval_secs;
        inner.handler = Some(Box::new(on_tick));
        spawn_ticker(Arc::downgrade(&self.inner), &mut inner);
        tracing::debug!(interval_secs, "clock started");
        true
    }

    /// Suspend tick delivery. No-op unless Active.
    pub fn pause(&self) -> bool {
        let mut inner = lock(&self.inner);
        if inner.state != ClockState::Active {
            return false;
        }
        inner.state = ClockState::Paused;
        halt_ticker(&mut inner);
        true
    }

    /// Resume tick delivery; the next tick is a full interval away.
    /// No-op unless Paused.
    pub fn resume(&self) -> bool {
        let mut inner = lock(&self.inner);
        if inner.state != ClockState::Paused {
            return false;
        }
        inner.state = ClockState::Active;
        spawn_ticker(Arc::downgrade(&self.inner), &mut inner);
        true
    }

    /// Stop ticking and drop the handler. No-op when already Idle.
    pub fn stop(&self) -> bool {
        let mut inner = lock(&self.inner);
        if inner.state == ClockState::Idle {
            return false;
        }
        inner.state = ClockState::Idle;
        inner.handler = None;
        halt_ticker(&mut inner);
        tracing::debug!("clock stopped");
        true
    }
}

fn lock(inner: &Mutex<ClockInner>) -> MutexGuard<'_, ClockInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn halt_ticker(inner: &mut ClockInner) {
    inner.generation += 1;
    if let Some(task) = inner.task.take() {
        task.abort();
    }
}

fn spawn_ticker(shared: Weak<Mutex<ClockInner>>, inner: &mut ClockInner) {
    halt_ticker(inner);
    let generation = inner.generation;
    let period = Duration::from_secs_f64(inner.interval_secs);

    inner.task = Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(shared) = shared.upgrade() else {
                break;
            };
            let mut inner = lock(&shared);
            if inner.generation != generation || inner.state != ClockState::Active {
                break;
            }
            let delta = inner.interval_secs;
            let flow = match inner.handler.as_mut() {
                Some(handler) => handler(delta),
                None => break,
            };
            if flow.is_break() {
                inner.state = ClockState::Idle;
                inner.handler = None;
                inner.generation += 1;
                inner.task = None;
                break;
            }
        }
    }));
}
