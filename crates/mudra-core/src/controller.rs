//! Frame-loop orchestration: pose, pitch and motion glued together with
//! release-edge detection and a one-event-per-episode latch.

use crate::config::MudraConfig;
use crate::landmarks::{hand_indices, Landmark};
use crate::motion::{GestureEvent, MotionClassifier, UpdateContext};
use crate::pitch::{PitchEvaluator, PitchResult};
use crate::pose::{PoseEvaluator, PoseResult};

/// Everything one frame produced. `event` is rare; the rest is steady
/// diagnostic output for UI overlays.
#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    pub pose: PoseResult,
    pub pitch: PitchResult,
    pub event: Option<GestureEvent>,
}

/// Per-hand-stream session driver. Feeds each frame through the three
/// engines and owns the release-episode state machine.
pub struct GestureController {
    pose: PoseEvaluator,
    pitch: PitchEvaluator,
    motion: MotionClassifier,
    fist_engaged: bool,
    action_locked: bool,
    frame_count: u64,
}

impl GestureController {
    /// Controller with default motion settings and no pose requirements;
    /// every frame reads as an open hand until a config arrives.
    pub fn new() -> Self {
        Self {
            pose: PoseEvaluator::new(),
            pitch: PitchEvaluator::default(),
            motion: MotionClassifier::new(),
            fist_engaged: false,
            action_locked: false,
            frame_count: 0,
        }
    }

    pub fn with_config(config: &MudraConfig) -> Self {
        Self {
            pose: PoseEvaluator::with_config(config.mushti.resolve()),
            pitch: PitchEvaluator::new(config.motion.pitch_up_threshold),
            motion: MotionClassifier::with_config(config.motion.resolve()),
            fist_engaged: false,
            action_locked: false,
            frame_count: 0,
        }
    }

    /// Re-resolve all engine configs and drop in-flight episode state.
    pub fn set_config(&mut self, config: &MudraConfig) {
        self.pose.set_config(config.mushti.resolve());
        self.pitch = PitchEvaluator::new(config.motion.pitch_up_threshold);
        self.motion.set_config(config.motion.resolve());
        self.fist_engaged = false;
        self.action_locked = false;
        log::info!(
            "configuration applied: {} fingers, {} required",
            config.mushti.fingers.len(),
            config.mushti.required_curled_fingers
        );
    }

    /// Run one landmark frame through the pipeline. At most one gesture
    /// event comes back per call.
    pub fn process_frame(&mut self, frame: &[Landmark], now_ms: i64) -> FrameOutcome {
        if frame.is_empty() {
            self.handle_no_hand();
            return FrameOutcome::default();
        }
        self.frame_count += 1;

        let pose = self.pose.evaluate(frame);
        let pitch = self.pitch.evaluate(frame);
        let wrist_y = frame[hand_indices::WRIST].y;

        let was_engaged = self.fist_engaged;
        self.fist_engaged = pose.is_fist;

        if was_engaged && !pose.is_fist {
            // Release edge: anchor the grace window at the moment of release.
            self.motion.start_grace(wrist_y, now_ms);
        } else if !was_engaged && pose.is_fist {
            self.motion.cancel_grace();
            self.action_locked = false;
            log::debug!("fist engaged, episode latch cleared");
        }

        let mut event = None;
        if pose.is_fist {
            // No pre-release motion may leak into the window.
            self.motion.reset_samples();
        } else if self.motion.grace_active() && !self.action_locked {
            let ctx = UpdateContext::allowing(pitch.pitch_up);
            event = self.motion.update(wrist_y, now_ms, &ctx);
            if event.is_some() {
                self.action_locked = true;
            }
        } else {
            self.motion.reset_samples();
        }

        FrameOutcome { pose, pitch, event }
    }

    /// A tick with no detected hand resets downstream classifier state
    /// rather than silently skipping.
    pub fn handle_no_hand(&mut self) {
        self.motion.reset();
        self.fist_engaged = false;
        self.action_locked = false;
    }

    /// Full session reset.
    pub fn reset(&mut self) {
        self.motion.reset();
        self.fist_engaged = false;
        self.action_locked = false;
        self.frame_count = 0;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn motion(&self) -> &MotionClassifier {
        &self.motion
    }
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new()
    }
}
