//! Real-time behaviour of `SessionRunner` under tokio's paused clock.

use std::sync::Arc;
use std::time::Duration;

use yogik_core::storage::keys;
use yogik_core::{
    CustomConfig, Event, HistoryLedger, Lifecycle, MemoryStore, Pose, PranayamaConfig,
    RecordingSink, Session, SessionRunner, SessionSettings, SinkCall, Store,
};

async fn advance(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

fn settings(prep: u32) -> SessionSettings {
    SessionSettings {
        prep_time_secs: prep,
        ..SessionSettings::default()
    }
}

#[tokio::test(start_paused = true)]
async fn stop_silences_and_commits_rounds() {
    let sink = Arc::new(RecordingSink::new());
    let store = Arc::new(MemoryStore::new());
    let config = PranayamaConfig {
        ratio: "1:0:1:0".parse().unwrap(),
        ..PranayamaConfig::default()
    };
    let (runner, _rx) = SessionRunner::with_channel(
        Session::new(config.clone(), settings(1)),
        sink.clone(),
        store.clone(),
    );
    runner.start().unwrap();

    // 1 s prep, then 2 s per round at 0.1 s ticks.
    advance(7_050).await;
    assert_eq!(runner.snapshot().plan.completed, 3);

    assert_eq!(runner.stop(), Some(3));
    let calls = sink.calls().len();
    advance(10_000).await;
    assert_eq!(sink.calls().len(), calls);
    assert_eq!(sink.calls().last(), Some(&SinkCall::StopAll));

    let ledger = HistoryLedger::<PranayamaConfig>::load(store.as_ref(), keys::PRANAYAMA_HISTORY);
    assert_eq!(ledger.entries()[0].config, config);
    assert_eq!(ledger.entries()[0].outcome, 3);
}

#[tokio::test(start_paused = true)]
async fn custom_sequence_completes_on_its_own() {
    let sink = Arc::new(RecordingSink::new());
    let config = CustomConfig {
        poses: vec![Pose::new("Mountain", 1, "Stand tall", 2, "")],
        rounds: 1,
    };
    let (runner, mut rx) = SessionRunner::with_channel(
        Session::new(config, settings(1)),
        sink.clone(),
        Arc::new(MemoryStore::new()),
    );
    runner.start().unwrap();
    advance(5_000).await;
    assert_eq!(runner.lifecycle(), Lifecycle::Complete);

    let spoken = sink.spoken();
    assert_eq!(
        spoken,
        vec![
            "Prepare for your practice. Take position.",
            "Mountain",
            "Stand tall",
            "Hold the position",
            "Practice complete. Well done.",
        ]
    );
    assert!(sink.calls().contains(&SinkCall::StopAll));

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(event);
    }
    assert!(matches!(kinds.first(), Some(Event::SessionPreparing { .. })));
    assert!(matches!(kinds.last(), Some(Event::SessionCompleted { outcome: 1, .. })));
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop() {
    let sink = Arc::new(RecordingSink::new());
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let config = PranayamaConfig::default();
    let (runner, _rx) = SessionRunner::with_channel(
        Session::new(config, settings(2)),
        sink.clone(),
        store,
    );
    runner.start().unwrap();
    advance(500).await;
    runner.stop();

    runner.start().unwrap();
    assert_eq!(runner.lifecycle(), Lifecycle::Preparing);
    advance(2_100).await;
    assert_eq!(runner.lifecycle(), Lifecycle::Active);
    runner.stop();
    assert_eq!(runner.lifecycle(), Lifecycle::Idle);
}
