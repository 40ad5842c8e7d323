//! Running practice sessions in the terminal.
//!
//! Prompts are printed to stdout as they would be spoken. The session is
//! driven by a [`SessionRunner`] on a current-thread runtime while stdin
//! and Ctrl-C are watched for control input.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgGroup, Args};
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;
use yogik_core::history::HistoryConfig;
use yogik_core::modes::custom::surya_namaskar;
use yogik_core::storage::keys;
use yogik_core::{
    BreathRatio, Event, ExportedSequence, HistoryLedger, KriyaConfig, Library, Mode, Pace,
    PranayamaConfig, PromptSink, Session, SessionRunner, Settings, Stage, Store, ToneId,
    YogaConfig,
};

type CliResult<T = ()> = Result<T, Box<dyn Error>>;

#[derive(Args)]
pub struct YogaArgs {
    /// Seconds to move into each pose
    #[arg(long)]
    transition: Option<u32>,
    /// Seconds to hold each pose
    #[arg(long)]
    hold: Option<u32>,
    /// Stop after this many laps (runs until stopped otherwise)
    #[arg(long)]
    laps: Option<u32>,
    /// Tone played during holds, 0 for silence (defaults to the setting)
    #[arg(long)]
    tone: Option<ToneId>,
    /// Rerun a configuration from history (0 is the most recent)
    #[arg(long, value_name = "INDEX", conflicts_with_all = ["transition", "hold", "laps", "tone"])]
    recent: Option<usize>,
}

#[derive(Args)]
pub struct PranayamaArgs {
    /// Counts for inhale:hold:exhale:hold
    #[arg(long, default_value = "4:4:6:2")]
    ratio: BreathRatio,
    /// Seconds per count: fast (1s), medium (1.5s) or slow (2s)
    #[arg(long, default_value = "fast")]
    pace: Pace,
    /// Stop after this many rounds (runs until stopped otherwise)
    #[arg(long)]
    rounds: Option<u32>,
    /// Rerun a configuration from history (0 is the most recent)
    #[arg(long, value_name = "INDEX", conflicts_with_all = ["ratio", "pace", "rounds"])]
    recent: Option<usize>,
}

#[derive(Args)]
pub struct KriyaArgs {
    /// Stage as breath-in seconds, breath-out seconds and repetitions
    #[arg(long = "stage", value_name = "IN,OUT,COUNTS", value_parser = parse_stage)]
    stages: Vec<Stage>,
    /// Times to run the whole stage list
    #[arg(long, default_value_t = 1)]
    repeat: u32,
    /// Seconds of rest between rounds
    #[arg(long, default_value_t = 0)]
    rest: u32,
    /// Save the kriya under this name when it starts
    #[arg(long)]
    name: Option<String>,
    /// Word spoken on each breath in
    #[arg(long, default_value = "In")]
    in_label: String,
    /// Word spoken on each breath out
    #[arg(long, default_value = "Out")]
    out_label: String,
    /// Run a saved kriya instead
    #[arg(long, value_name = "ID", conflicts_with_all = ["stages", "name"])]
    saved: Option<Uuid>,
}

#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["saved", "preset", "file"])))]
pub struct CustomArgs {
    /// Saved sequence id
    #[arg(long, value_name = "ID")]
    saved: Option<Uuid>,
    /// Built-in Sun Salutation
    #[arg(long)]
    preset: bool,
    /// A .yogikseq file, run without saving it
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
    /// Times to run the sequence
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    rounds: u32,
}

fn parse_stage(s: &str) -> Result<Stage, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [breath_in, breath_out, counts] = parts.as_slice() else {
        return Err("expected IN,OUT,COUNTS".into());
    };
    let seconds = |v: &str| {
        v.parse::<f64>()
            .ok()
            .filter(|x| x.is_finite() && *x >= 0.0)
            .ok_or_else(|| format!("invalid seconds: {v}"))
    };
    let counts = counts
        .parse::<u32>()
        .map_err(|_| format!("invalid counts: {counts}"))?;
    Ok(Stage::new(seconds(breath_in)?, seconds(breath_out)?, counts))
}

pub fn yoga(args: YogaArgs, store: Arc<dyn Store>) -> CliResult {
    let settings = Settings::load(store.as_ref());
    let config = match args.recent {
        Some(index) => recent::<YogaConfig>(store.as_ref(), keys::YOGA_HISTORY, index)?,
        None => {
            let defaults = YogaConfig::default();
            YogaConfig {
                transition_secs: args.transition.unwrap_or(defaults.transition_secs),
                hold_secs: args.hold.unwrap_or(defaults.hold_secs),
                progress_tone: args.tone.unwrap_or(settings.yoga_progress_tone),
                laps: args.laps,
            }
        }
    };
    run_session(Session::new(config, settings.session_settings()), store)
}

pub fn pranayama(args: PranayamaArgs, store: Arc<dyn Store>) -> CliResult {
    let settings = Settings::load(store.as_ref());
    let config = match args.recent {
        Some(index) => recent::<PranayamaConfig>(store.as_ref(), keys::PRANAYAMA_HISTORY, index)?,
        None => PranayamaConfig {
            ratio: args.ratio,
            pace: args.pace,
            rounds: args.rounds,
        },
    };
    run_session(Session::new(config, settings.session_settings()), store)
}

pub fn kriya(args: KriyaArgs, store: Arc<dyn Store>) -> CliResult {
    let settings = Settings::load(store.as_ref());
    let config = match args.saved {
        Some(id) => Library::new(store.as_ref())
            .find_kriya(id)
            .ok_or_else(|| format!("no saved kriya with id {id}"))?
            .to_config(),
        None => {
            let stages = if args.stages.is_empty() {
                vec![Stage::default()]
            } else {
                args.stages
            };
            KriyaConfig {
                name: args.name.unwrap_or_default(),
                stages,
                breath_in_label: args.in_label,
                breath_out_label: args.out_label,
                repeat_count: args.repeat,
                rest_secs: args.rest,
            }
        }
    };
    run_session(Session::new(config, settings.session_settings()), store)
}

pub fn custom(args: CustomArgs, store: Arc<dyn Store>) -> CliResult {
    let settings = Settings::load(store.as_ref());
    let sequence = if args.preset {
        surya_namaskar()
    } else if let Some(id) = args.saved {
        Library::new(store.as_ref())
            .find_sequence(id)
            .ok_or_else(|| format!("no saved sequence with id {id}"))?
    } else if let Some(path) = args.file {
        let json = std::fs::read_to_string(&path)?;
        ExportedSequence::from_json(&json)?.sequence
    } else {
        return Err("one of --saved, --preset or --file is required".into());
    };
    println!("{} ({} poses)", sequence.name, sequence.poses.len());
    let config = sequence.to_config(args.rounds);
    run_session(Session::new(config, settings.session_settings()), store)
}

fn recent<C: HistoryConfig>(store: &dyn Store, key: &'static str, index: usize) -> CliResult<C> {
    HistoryLedger::<C>::load(store, key)
        .get(index)
        .map(|entry| entry.config.clone())
        .ok_or_else(|| format!("no history entry at index {index}").into())
}

/// Prints prompts instead of speaking them.
struct ConsoleSink;

impl PromptSink for ConsoleSink {
    fn speak(&self, text: &str, _voice_id: &str, _rate: f32) {
        println!("  > {text}");
    }

    fn play(&self, tone: ToneId) {
        tracing::trace!(tone, "tone");
    }

    fn stop_all(&self) {
        tracing::debug!("speech flushed");
    }
}

fn run_session(session: Session, store: Arc<dyn Store>) -> CliResult {
    let mode = session.mode();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(drive(session, store));
    // A pending stdin read would otherwise hold shutdown until Enter.
    rt.shutdown_background();

    let outcome = result?;
    let unit = match mode {
        Mode::Yoga => "laps",
        _ => "rounds",
    };
    println!("Finished: {outcome} {unit}");
    Ok(())
}

async fn drive(session: Session, store: Arc<dyn Store>) -> CliResult<u32> {
    let mode = session.mode();
    let (runner, mut events) = SessionRunner::with_channel(session, Arc::new(ConsoleSink), store);
    runner.start()?;
    println!("{mode}: p pauses, r resumes, Enter shows status, q or Ctrl-C stops");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                render(&event);
                if matches!(event, Event::SessionCompleted { .. }) {
                    break;
                }
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match line.trim() {
                    "p" => {
                        if !runner.pause() {
                            println!("(nothing to pause)");
                        }
                    }
                    "r" => {
                        if !runner.resume() {
                            println!("(not paused)");
                        }
                    }
                    "q" => break,
                    "" => runner.publish_snapshot(),
                    other => println!("(unknown command '{other}')"),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
            _ = &mut ctrl_c => break,
        }
    }

    let outcome = runner.stop().unwrap_or(0);
    while let Ok(event) = events.try_recv() {
        render(&event);
    }
    Ok(outcome)
}

fn render(event: &Event) {
    match event {
        Event::SessionPreparing { prep_secs, .. } => println!("Get into position ({prep_secs}s)"),
        Event::SessionStarted { .. } => println!("Started"),
        Event::PhaseEntered {
            label,
            duration_secs,
            ..
        } => println!("[{label}] {duration_secs:.1}s"),
        Event::PassCompleted { passes, .. } => println!("-- {passes} done"),
        Event::SessionPaused { elapsed_secs, .. } => println!("Paused at {elapsed_secs:.1}s"),
        Event::SessionResumed { .. } => println!("Resumed"),
        Event::SessionCompleted { outcome, .. } => println!("Complete after {outcome}"),
        Event::SessionStopped { .. } => {}
        Event::Snapshot { snapshot, .. } => {
            let total = snapshot
                .plan
                .rounds_total
                .map(|t| format!("/{t}"))
                .unwrap_or_default();
            println!(
                "{:?} {} {:.1}/{:.1}s, round {}{}",
                snapshot.lifecycle,
                snapshot.phase_label,
                snapshot.elapsed_secs,
                snapshot.duration_secs,
                snapshot.plan.round,
                total,
            );
        }
    }
}
