//! Spoken prompts, tones, and when to emit them.
//!
//! The core never talks to an audio engine directly. It produces [`Prompt`]
//! values and hands them to a [`PromptSink`], which speaks or plays them
//! asynchronously. Speech is fire-and-forget: the sequencer never waits for
//! an utterance to finish, so overlapping prompts queue inside the sink.
//!
//! Timing of prompts relative to a phase is described by [`Cue`]s attached
//! to the phase and evaluated by [`CueTracker`] on every delivered tick.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::timer::{Phase, EPSILON};

/// Identifier of a short system tone (0 means "no tone").
pub type ToneId = u32;

/// Speech rate used for prep prompts, phase prompts and spoken counts.
pub const DEFAULT_RATE: f32 = 0.5;

/// Slower rate used for the longer instructional text of custom sequences.
pub const INSTRUCTION_RATE: f32 = 0.35;

/// Maps a kriya breath duration to a speech rate.
///
/// These values were tuned by ear; keep the literal table rather than
/// fitting a curve through it.
pub fn kriya_rate_for(duration_secs: f64) -> f32 {
    match duration_secs {
        d if d < 1.0 => 0.5,
        d if d < 1.5 => 0.3,
        _ => 0.05,
    }
}

/// One side effect destined for the prompt sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prompt {
    Speak { text: String, rate: f32 },
    Tone { id: ToneId },
    /// Drop everything still queued in the sink.
    Silence,
}

impl Prompt {
    pub fn speak(text: impl Into<String>, rate: f32) -> Self {
        Prompt::Speak {
            text: text.into(),
            rate,
        }
    }

    pub fn tone(id: ToneId) -> Self {
        Prompt::Tone { id }
    }
}

/// Audio collaborator implemented by the platform layer.
pub trait PromptSink: Send + Sync {
    /// Queue `text` for speech. Must not block on playback.
    fn speak(&self, text: &str, voice_id: &str, rate: f32);
    /// Play a short tone.
    fn play(&self, tone: ToneId);
    /// Cancel pending and in-progress speech.
    fn stop_all(&self);
}

/// Forward `prompts` to `sink` in order.
pub fn dispatch(sink: &dyn PromptSink, voice_id: &str, prompts: &[Prompt]) {
    for prompt in prompts {
        match prompt {
            Prompt::Speak { text, rate } => sink.speak(text, voice_id, *rate),
            Prompt::Tone { id } => {
                if *id != 0 {
                    sink.play(*id);
                }
            }
            Prompt::Silence => sink.stop_all(),
        }
    }
}

/// A prompt scheduled relative to a phase's own clock.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    /// Fires on every tick delivered while the phase is current.
    EveryTick(Prompt),
    /// Speaks the running count at each unit boundary, starting from 2.
    ///
    /// Count 1 is implied by the phase's own enter prompt. The boundary that
    /// ends the phase is not announced.
    Count { unit_secs: f64, rate: f32 },
    /// Fires once when the remaining time first drops to `lead_secs`.
    ///
    /// Ignored for phases shorter than `lead_secs`.
    BeforeEnd { lead_secs: f64, prompt: Prompt },
}

/// Per-phase bookkeeping for cues. Reset on every phase entry.
#[derive(Debug, Clone, Default)]
pub struct CueTracker {
    units_announced: u32,
    lead_fired: bool,
}

impl CueTracker {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Evaluate `phase`'s cues after a tick moved its clock to `elapsed`.
    pub fn on_tick(&mut self, phase: &Phase, elapsed: f64) -> Vec<Prompt> {
        let mut out = Vec::new();
        let remaining = phase.duration_secs - elapsed;

        for cue in &phase.cues {
            match cue {
                Cue::EveryTick(prompt) => out.push(prompt.clone()),
                Cue::Count { unit_secs, rate } => {
                    if *unit_secs <= 0.0 {
                        continue;
                    }
                    let total = (phase.duration_secs / unit_secs).round() as u32;
                    let crossed = ((elapsed + EPSILON) / unit_secs).floor() as u32;
                    while self.units_announced < crossed {
                        self.units_announced += 1;
                        if self.units_announced < total {
                            out.push(Prompt::speak(
                                (self.units_announced + 1).to_string(),
                                *rate,
                            ));
                        }
                    }
                }
                Cue::BeforeEnd { lead_secs, prompt } => {
                    if self.lead_fired || phase.duration_secs + EPSILON < *lead_secs {
                        continue;
                    }
                    if remaining <= lead_secs + EPSILON && remaining > EPSILON {
                        self.lead_fired = true;
                        out.push(prompt.clone());
                    }
                }
            }
        }
        out
    }
}

/// A single call observed by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Speak {
        text: String,
        voice_id: String,
        rate: f32,
    },
    Play(ToneId),
    StopAll,
}

/// Sink that records every call. Useful for headless runs and tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Spoken texts only, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Speak { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: SinkCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl PromptSink for RecordingSink {
    fn speak(&self, text: &str, voice_id: &str, rate: f32) {
        self.push(SinkCall::Speak {
            text: text.to_string(),
            voice_id: voice_id.to_string(),
            rate,
        });
    }

    fn play(&self, tone: ToneId) {
        self.push(SinkCall::Play(tone));
    }

    fn stop_all(&self) {
        self.push(SinkCall::StopAll);
    }
}
