//! Runtime wiring: session + clock + prompt sink + store + event channel.
//!
//! Lock order is session -> clock, taken together only by the prep task
//! while the clock is idle. The tick path holds clock -> session, so no
//! command may hold the session lock while it calls into the clock.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{Effects, Lifecycle, Session, SessionSnapshot};
use crate::error::ValidationError;
use crate::events::Event;
use crate::prompt::{dispatch, PromptSink};
use crate::storage::Store;
use crate::timer::SessionClock;

/// Drives a [`Session`] in real time on the current tokio runtime.
pub struct SessionRunner {
    session: Arc<Mutex<Session>>,
    clock: SessionClock,
    sink: Arc<dyn PromptSink>,
    store: Arc<dyn Store>,
    events: mpsc::UnboundedSender<Event>,
    prep_cancel: Mutex<Option<CancellationToken>>,
}

impl SessionRunner {
    pub fn new(
        session: Session,
        sink: Arc<dyn PromptSink>,
        store: Arc<dyn Store>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            clock: SessionClock::new(),
            sink,
            store,
            events,
            prep_cancel: Mutex::new(None),
        }
    }

    /// Build a runner together with the receiving end of its event stream.
    pub fn with_channel(
        session: Session,
        sink: Arc<dyn PromptSink>,
        store: Arc<dyn Store>,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(session, sink, store, tx), rx)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        lock(&self.session).lifecycle()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.session).snapshot()
    }

    /// Push the current snapshot onto the event stream.
    pub fn publish_snapshot(&self) {
        let snapshot = self.snapshot();
        let _ = self.events.send(Event::Snapshot {
            snapshot,
            at: chrono::Utc::now(),
        });
    }

    /// Validate and enter Preparing; the clock starts once the prep delay
    /// elapses. No-op while a run is already in progress.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), ValidationError> {
        let mut session = lock(&self.session);
        if session.lifecycle() != Lifecycle::Idle {
            return Ok(());
        }
        let effects = session.begin()?;
        session.practice().on_session_start(self.store.as_ref());
        self.emit(&session, effects);

        let cancel = CancellationToken::new();
        if let Some(previous) = lock(&self.prep_cancel).replace(cancel.clone()) {
            previous.cancel();
        }

        let token = session.prep_token();
        let delay = session.prep_duration();
        drop(session);

        let session = Arc::clone(&self.session);
        let clock = self.clock.clone();
        let sink = Arc::clone(&self.sink);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("prep cancelled");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            let mut guard = lock(&session);
            let Some(effects) = guard.activate(token) else {
                return;
            };
            dispatch(sink.as_ref(), &guard.settings().voice_id, &effects.prompts);
            send(&events, effects.events);
            if guard.lifecycle() != Lifecycle::Active {
                // Completed on entry; nothing to tick.
                return;
            }
            let interval = guard.tick_interval_secs();
            clock.start(interval, tick_handler(Arc::clone(&session), sink, events));
        });
        Ok(())
    }

    /// Suspend an active session. Returns false unless it was Active.
    pub fn pause(&self) -> bool {
        self.clock.pause();
        let mut session = lock(&self.session);
        match session.pause() {
            Some(effects) => {
                self.emit(&session, effects);
                true
            }
            None => false,
        }
    }

    pub fn resume(&self) -> bool {
        {
            let mut session = lock(&self.session);
            let Some(effects) = session.resume() else {
                return false;
            };
            self.emit(&session, effects);
        }
        self.clock.resume();
        true
    }

    /// Tear the run down and commit its outcome. Returns the outcome, or
    /// `None` when nothing was running.
    pub fn stop(&self) -> Option<u32> {
        // (a) pending prep transition
        if let Some(cancel) = lock(&self.prep_cancel).take() {
            cancel.cancel();
        }
        lock(&self.session).cancel_prep();
        // (b) no tick reaches the session after this returns
        self.clock.stop();
        // (c) queued speech
        self.sink.stop_all();
        // (d) reset, (e) commit
        let mut session = lock(&self.session);
        let (outcome, effects) = session.stop()?;
        session
            .practice()
            .on_session_end(self.store.as_ref(), outcome);
        send(&self.events, effects.events);
        Some(outcome)
    }

    fn emit(&self, session: &Session, effects: Effects) {
        dispatch(self.sink.as_ref(), &session.settings().voice_id, &effects.prompts);
        send(&self.events, effects.events);
    }
}

impl Drop for SessionRunner {
    fn drop(&mut self) {
        if let Some(cancel) = lock(&self.prep_cancel).take() {
            cancel.cancel();
        }
        self.clock.stop();
    }
}

fn tick_handler(
    session: Arc<Mutex<Session>>,
    sink: Arc<dyn PromptSink>,
    events: mpsc::UnboundedSender<Event>,
) -> impl FnMut(f64) -> ControlFlow<()> + Send + 'static {
    move |delta| {
        let mut session = lock(&session);
        let effects = session.tick(delta);
        dispatch(sink.as_ref(), &session.settings().voice_id, &effects.prompts);
        send(&events, effects.events);
        if session.lifecycle() == Lifecycle::Complete {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

fn send(events: &mpsc::UnboundedSender<Event>, batch: Vec<Event>) {
    for event in batch {
        // A dropped receiver only means nobody is watching.
        let _ = events.send(event);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::YogaConfig;
    use crate::prompt::{RecordingSink, SinkCall};
    use crate::session::SessionSettings;
    use crate::storage::MemoryStore;
    use std::time::Duration;

    fn runner(config: YogaConfig) -> (SessionRunner, Arc<RecordingSink>, mpsc::UnboundedReceiver<Event>) {
        let sink = Arc::new(RecordingSink::new());
        let settings = SessionSettings {
            prep_time_secs: 2,
            ..SessionSettings::default()
        };
        let (runner, rx) = SessionRunner::with_channel(
            Session::new(config, settings),
            sink.clone(),
            Arc::new(MemoryStore::new()),
        );
        (runner, sink, rx)
    }

    fn silent_yoga(transition: u32, hold: u32) -> YogaConfig {
        YogaConfig {
            transition_secs: transition,
            hold_secs: hold,
            progress_tone: 0,
            laps: None,
        }
    }

    async fn advance(millis: u64) {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn prep_then_ticks() {
        let (runner, sink, _rx) = runner(silent_yoga(0, 5));
        runner.start().unwrap();
        assert_eq!(runner.lifecycle(), Lifecycle::Preparing);
        assert_eq!(
            sink.spoken(),
            vec!["Prepare for the session. Move into first pose"]
        );

        advance(2_100).await;
        assert_eq!(runner.lifecycle(), Lifecycle::Active);
        advance(3_000).await;
        assert_eq!(runner.snapshot().elapsed_secs, 3.0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_prep_never_starts() {
        let (runner, sink, _rx) = runner(silent_yoga(5, 5));
        runner.start().unwrap();
        advance(1_000).await;
        assert_eq!(runner.stop(), Some(0));
        advance(10_000).await;
        assert_eq!(runner.lifecycle(), Lifecycle::Idle);
        assert_eq!(sink.calls().last(), Some(&SinkCall::StopAll));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_requires_active_and_freezes_time() {
        let (runner, _sink, _rx) = runner(silent_yoga(0, 10));
        runner.start().unwrap();
        assert!(!runner.pause());

        advance(4_100).await;
        assert!(runner.pause());
        let frozen = runner.snapshot().elapsed_secs;
        advance(20_000).await;
        assert_eq!(runner.snapshot().elapsed_secs, frozen);

        assert!(runner.resume());
        advance(1_500).await;
        assert_eq!(runner.snapshot().elapsed_secs, frozen + 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_stops_clock_and_stop_commits() {
        let config = YogaConfig {
            laps: Some(1),
            ..silent_yoga(1, 1)
        };
        let (runner, _sink, mut rx) = runner(config);
        runner.start().unwrap();
        advance(5_000).await;
        assert_eq!(runner.lifecycle(), Lifecycle::Complete);

        let mut completed = false;
        while let Ok(event) = rx.try_recv() {
            completed |= matches!(event, Event::SessionCompleted { outcome: 1, .. });
        }
        assert!(completed);
        assert_eq!(runner.stop(), Some(1));
        assert!(matches!(rx.try_recv(), Ok(Event::SessionStopped { outcome: 1, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_running_is_noop() {
        let (runner, sink, _rx) = runner(silent_yoga(5, 5));
        runner.start().unwrap();
        runner.start().unwrap();
        assert_eq!(sink.spoken().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_is_rejected() {
        let (runner, sink, _rx) = runner(silent_yoga(0, 0));
        assert_eq!(runner.start(), Err(ValidationError::AllPhasesZero));
        assert_eq!(runner.lifecycle(), Lifecycle::Idle);
        assert!(sink.calls().is_empty());
    }
}
