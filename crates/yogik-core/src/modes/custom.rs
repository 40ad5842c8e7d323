//! Custom sequences: user-authored poses, each a transition then a hold.
//!
//! When the first and last poses share a name the sequence is a loop, and
//! rounds after the first start from the second pose so the shared pose is
//! not run twice in a row.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Mode, Practice};
use crate::error::ValidationError;
use crate::prompt::{Prompt, INSTRUCTION_RATE};
use crate::session::SessionSettings;
use crate::timer::{Advance, PassPlan, Phase, PhaseKind, PhaseList, PlanProgress};

pub const TICK_SECS: f64 = 0.1;

pub const PRESET_NAME: &str = "Sun Salutation (Surya Namaskar)";

const PREP_PROMPT: &str = "Prepare for your practice. Take position.";
const HOLD_PROMPT: &str = "Hold the position";
const COMPLETE_PROMPT: &str = "Practice complete. Well done.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    pub id: Uuid,
    pub name: String,
    pub transition_time: u32,
    pub instruction: String,
    pub hold_time: u32,
    pub hold_prompt: String,
}

impl Default for Pose {
    fn default() -> Self {
        Self::new("", 5, "", 10, "")
    }
}

impl Pose {
    pub fn new(
        name: impl Into<String>,
        transition_time: u32,
        instruction: impl Into<String>,
        hold_time: u32,
        hold_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            transition_time,
            instruction: instruction.into(),
            hold_time,
            hold_prompt: hold_prompt.into(),
        }
    }

    fn phases(&self) -> PhaseList {
        let mut transition = Phase::new(
            PhaseKind::Transition,
            self.name.clone(),
            f64::from(self.transition_time),
        )
        .announce(Prompt::speak(self.name.clone(), INSTRUCTION_RATE));
        if !self.instruction.is_empty() {
            transition = transition.announce(Prompt::speak(self.instruction.clone(), INSTRUCTION_RATE));
        }

        let mut hold = Phase::new(PhaseKind::Hold, self.name.clone(), f64::from(self.hold_time))
            .announce(Prompt::speak(HOLD_PROMPT, INSTRUCTION_RATE));
        if !self.hold_prompt.is_empty() {
            hold = hold.announce(Prompt::speak(self.hold_prompt.clone(), INSTRUCTION_RATE));
        }

        vec![transition, hold].into()
    }

    fn normalized_name(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

/// A named pose list as persisted and exchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSequence {
    pub id: Uuid,
    pub name: String,
    pub poses: Vec<Pose>,
    #[serde(default)]
    pub is_preset: bool,
}

impl SavedSequence {
    pub fn new(name: impl Into<String>, poses: Vec<Pose>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            poses,
            is_preset: false,
        }
    }

    pub fn to_config(&self, rounds: u32) -> CustomConfig {
        CustomConfig {
            poses: self.poses.clone(),
            rounds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomConfig {
    pub poses: Vec<Pose>,
    /// At least 1.
    pub rounds: u32,
}

impl CustomConfig {
    /// First and last pose are the same pose (trimmed, case-insensitive).
    pub fn loops_back(&self) -> bool {
        match (self.poses.first(), self.poses.last()) {
            (Some(first), Some(last)) if self.poses.len() > 1 => {
                let name = first.normalized_name();
                !name.is_empty() && name == last.normalized_name()
            }
            _ => false,
        }
    }
}

impl Practice for CustomConfig {
    fn mode(&self) -> Mode {
        Mode::Custom
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.poses.is_empty() {
            return Err(ValidationError::EmptyCollection("poses".into()));
        }
        if self
            .poses
            .iter()
            .all(|p| p.transition_time == 0 && p.hold_time == 0)
        {
            return Err(ValidationError::AllPhasesZero);
        }
        Ok(())
    }

    fn tick_interval_secs(&self) -> f64 {
        TICK_SECS
    }

    fn prep_prompt(&self) -> Prompt {
        Prompt::speak(PREP_PROMPT, INSTRUCTION_RATE)
    }

    fn plan(&self, _settings: &SessionSettings) -> Box<dyn PassPlan> {
        Box::new(CustomPlan::new(self.clone()))
    }
}

/// One pose per pass, rounds over the pose list.
#[derive(Debug, Clone)]
pub struct CustomPlan {
    poses: Vec<Pose>,
    rounds: u32,
    round: u32,
    pose: usize,
    loops_back: bool,
    rounds_completed: u32,
}

impl CustomPlan {
    pub fn new(config: CustomConfig) -> Self {
        let loops_back = config.loops_back();
        Self {
            poses: config.poses,
            rounds: config.rounds.max(1),
            round: 1,
            pose: 0,
            loops_back,
            rounds_completed: 0,
        }
    }

    fn current(&self) -> Advance {
        match self.poses.get(self.pose) {
            Some(pose) => Advance::Pass(pose.phases()),
            None => Advance::Complete(Vec::new()),
        }
    }
}

impl PassPlan for CustomPlan {
    fn first_pass(&mut self) -> Advance {
        self.current()
    }

    fn next_pass(&mut self) -> Advance {
        if self.pose + 1 < self.poses.len() {
            self.pose += 1;
            return self.current();
        }

        self.rounds_completed += 1;
        if self.round >= self.rounds {
            return Advance::Complete(vec![
                Prompt::Silence,
                Prompt::speak(COMPLETE_PROMPT, INSTRUCTION_RATE),
            ]);
        }
        self.round += 1;
        self.pose = usize::from(self.loops_back);
        tracing::debug!(round = self.round, start = self.pose, "custom round started");
        self.current()
    }

    fn is_bounded(&self) -> bool {
        true
    }

    fn progress(&self) -> PlanProgress {
        PlanProgress {
            round: self.round,
            rounds_total: Some(self.rounds),
            unit_index: self.pose,
            unit_count: self.poses.len(),
            unit_label: self.poses.get(self.pose).map(|p| p.name.clone()),
            repetition: 1,
            repetitions_total: 1,
            completed: self.rounds_completed,
        }
    }
}

/// Built-in Sun Salutation sequence. Regenerated on every call and never
/// written to the saved list.
pub fn surya_namaskar() -> SavedSequence {
    const KEEP: &str = "Keep breathing.";
    let poses = [
        ("Prayer Pose", "Stand upright and bring your hands to heart center in prayer position.", "Feel the ground beneath your feet. Center yourself."),
        ("Raised Arms Pose", "Inhale and raise your arms above your head, arching slightly backward.", "Feel the stretch through your entire body."),
        ("Forward Fold", "Exhale and fold forward, letting your head and arms hang heavy.", "Relax your neck and shoulders."),
        ("Low Lunge Right", "Inhale and step your right foot back into a low lunge, dropping your back knee. Stretch and look up.", "Keep your front knee aligned over your ankle."),
        ("Plank", "Step back to a plank position, shoulders over wrists, body in a straight line.", "Engage your core and keep your body aligned."),
        ("Eight Limbed Pose", "Exhale and lower your body so that your hands, feet, knees, chest, and forehead touch the ground.", "This pose combines strength and surrender."),
        ("Cobra Pose", "Inhale and roll forward, pressing your chest up with your hands while keeping hips down. Stretch and look up.", "Open your chest, lengthen your spine."),
        ("Downward Facing Dog", "Exhale and push back into downward dog, forming an inverted V-shape.", "Press firmly through your hands, relax your head."),
        ("Low Lunge Right Forward", "Inhale and step your right foot forward into a low lunge. Stretch and look up.", "Keep your front knee aligned over your ankle."),
        ("Forward Fold", "Exhale, step forward and fold, letting your upper body hang.", "Breathe deeply and let tension melt away."),
        ("Raised Arms Pose", "Inhale and sweep your arms up, arching gently backward.", "Expand your chest and embrace the moment."),
        ("Prayer Pose", "Exhale and return to standing, hands at heart center.", "Complete half of Surya Namaskar."),
        ("Raised Arms Pose", "Inhale and raise your arms above your head, arching slightly backward.", "Feel the stretch through your entire body."),
        ("Forward Fold", "Exhale and fold forward, letting your head and arms hang heavy.", "Relax your neck and shoulders."),
        ("Low Lunge Left", "Inhale and step your left foot back into a low lunge, dropping your back knee. Stretch and look up.", "Keep your front knee aligned over your ankle."),
        ("Plank", "Step back to a plank position, shoulders over wrists, body in a straight line.", "Engage your core and keep your body aligned."),
        ("Eight Limbed Pose", "Exhale and lower your body so that your hands, feet, knees, chest, and forehead touch the ground.", "This pose combines strength and surrender."),
        ("Cobra Pose", "Inhale and roll forward, pressing your chest up with your hands while keeping hips down. Stretch and look up.", "Open your chest, lengthen your spine."),
        ("Downward Facing Dog", "Exhale and push back into downward dog, forming an inverted V-shape.", "Press firmly through your hands, relax your head."),
        ("Low Lunge Left Forward", "Inhale and step your left foot forward into a low lunge. Stretch and look up.", "Keep your front knee aligned over your ankle."),
        ("Forward Fold", "Exhale, step forward and fold, letting your upper body hang.", "Breathe deeply and let tension melt away."),
        ("Raised Arms Pose", "Inhale and sweep your arms up, arching gently backward.", "Expand your chest and embrace the moment."),
        ("Prayer Pose", "Exhale and return to standing, hands at heart center.", "Complete one full cycle of Surya Namaskar."),
    ];

    let poses = poses
        .into_iter()
        .map(|(name, instruction, hold)| Pose::new(name, 5, instruction, 10, format!("{hold} {KEEP}")))
        .collect();
    SavedSequence {
        is_preset: true,
        ..SavedSequence::new(PRESET_NAME, poses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{PhaseSequencer, Signal};

    fn pose(name: &str, transition: u32, hold: u32) -> Pose {
        Pose::new(name, transition, "", hold, "")
    }

    fn sequencer(poses: Vec<Pose>, rounds: u32) -> PhaseSequencer {
        let config = CustomConfig { poses, rounds };
        PhaseSequencer::new(config.plan(&SessionSettings::default()))
    }

    fn entered(signals: &[Signal]) -> Vec<(PhaseKind, String)> {
        signals
            .iter()
            .filter_map(|s| match s {
                Signal::Entered { kind, label, .. } => Some((*kind, label.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn transition_then_hold_with_prompts() {
        let mut seq = sequencer(
            vec![Pose::new("Tree", 1, "Balance on one leg", 1, "Steady gaze")],
            1,
        );
        let signals = seq.begin();
        assert!(signals.contains(&Signal::Prompt(Prompt::speak("Tree", INSTRUCTION_RATE))));
        assert!(signals.contains(&Signal::Prompt(Prompt::speak(
            "Balance on one leg",
            INSTRUCTION_RATE
        ))));

        let signals = seq.tick(1.0);
        let speech: Vec<_> = signals
            .iter()
            .filter_map(|s| match s {
                Signal::Prompt(Prompt::Speak { text, .. }) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(speech, vec!["Hold the position", "Steady gaze"]);
    }

    #[test]
    fn empty_instruction_is_not_spoken() {
        let mut seq = sequencer(vec![pose("Tree", 1, 1)], 1);
        let speech = seq
            .begin()
            .into_iter()
            .filter(|s| matches!(s, Signal::Prompt(Prompt::Speak { .. })))
            .count();
        assert_eq!(speech, 1);
    }

    #[test]
    fn loop_seam_skips_first_pose_after_round_one() {
        let poses = vec![pose("Mountain", 1, 1), pose("Fold", 1, 1), pose(" mountain ", 1, 1)];
        let mut seq = sequencer(poses, 2);
        let mut all = seq.begin();
        for _ in 0..10 {
            all.extend(seq.tick(1.0));
        }
        let holds: Vec<String> = entered(&all)
            .into_iter()
            .filter(|(k, _)| *k == PhaseKind::Hold)
            .map(|(_, l)| l)
            .collect();
        assert_eq!(holds, vec!["Mountain", "Fold", " mountain ", "Fold", " mountain "]);
        assert!(seq.is_finished());
        assert_eq!(seq.plan_progress().completed, 2);
    }

    #[test]
    fn distinct_ends_restart_from_first_pose() {
        let config = CustomConfig {
            poses: vec![pose("A", 1, 1), pose("B", 1, 1)],
            rounds: 2,
        };
        assert!(!config.loops_back());
        let mut seq = sequencer(config.poses, 2);
        seq.begin();
        for _ in 0..4 {
            seq.tick(1.0);
        }
        assert_eq!(seq.plan_progress().unit_index, 0);
        assert_eq!(seq.plan_progress().round, 2);
    }

    #[test]
    fn single_pose_never_loops_back() {
        let config = CustomConfig {
            poses: vec![pose("A", 1, 1)],
            rounds: 3,
        };
        assert!(!config.loops_back());
        let blank = CustomConfig {
            poses: vec![pose(" ", 1, 1), pose("", 1, 1)],
            rounds: 1,
        };
        assert!(!blank.loops_back());
    }

    #[test]
    fn completion_flushes_then_congratulates() {
        let mut seq = sequencer(vec![pose("A", 0, 1)], 1);
        seq.begin();
        let signals = seq.tick(1.0);
        let tail: Vec<_> = signals
            .iter()
            .filter_map(|s| match s {
                Signal::Prompt(p) => Some(p.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            tail,
            vec![Prompt::Silence, Prompt::speak(COMPLETE_PROMPT, INSTRUCTION_RATE)]
        );
        assert_eq!(signals.last(), Some(&Signal::Complete));
    }

    #[test]
    fn validation() {
        let empty = CustomConfig {
            poses: Vec::new(),
            rounds: 1,
        };
        assert!(matches!(
            empty.validate(),
            Err(ValidationError::EmptyCollection(_))
        ));
        let zero = CustomConfig {
            poses: vec![pose("A", 0, 0)],
            rounds: 1,
        };
        assert_eq!(zero.validate(), Err(ValidationError::AllPhasesZero));
    }

    #[test]
    fn preset_shape() {
        let preset = surya_namaskar();
        assert_eq!(preset.name, PRESET_NAME);
        assert!(preset.is_preset);
        assert_eq!(preset.poses.len(), 23);
        assert!(preset.to_config(1).loops_back());
        assert!(preset.poses.iter().all(|p| p.hold_prompt.ends_with("Keep breathing.")));
    }

    #[test]
    fn is_preset_defaults_to_false() {
        let json = r#"{"id":"6f1c1e2a-5b7d-4c59-9a53-0c7e1f0d2a11","name":"Short","poses":[]}"#;
        let seq: SavedSequence = serde_json::from_str(json).unwrap();
        assert!(!seq.is_preset);
    }
}
