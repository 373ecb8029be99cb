//! Wrist pitch estimation from relative landmark depth.
//!
//! MediaPipe-style z grows away from the camera, so a wrist that is
//! closer than the knuckle plane reads as a positive delta.

use crate::config::MotionConfig;
use crate::landmarks::{frame_is_full, hand_indices, Landmark};

/// The knuckle row used as the depth reference plane.
const KNUCKLES: [usize; 4] = [
    hand_indices::INDEX_MCP,
    hand_indices::MIDDLE_MCP,
    hand_indices::RING_MCP,
    hand_indices::PINKY_MCP,
];

#[derive(Debug, Clone, Default)]
pub struct PitchResult {
    pub pitch_up: bool,
    /// `wrist.z - mean(knuckle z)`; `None` when the frame is short.
    pub delta: Option<f32>,
}

/// Judges whether the wrist is pitched toward the camera relative to the
/// knuckle plane.
#[derive(Debug, Clone)]
pub struct PitchEvaluator {
    threshold: f32,
}

impl PitchEvaluator {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn evaluate(&self, frame: &[Landmark]) -> PitchResult {
        if !frame_is_full(frame) {
            return PitchResult::default();
        }
        let knuckle_z: f32 = KNUCKLES.iter().map(|&i| frame[i].z).sum::<f32>() / 4.0;
        let delta = frame[hand_indices::WRIST].z - knuckle_z;
        PitchResult {
            pitch_up: delta >= self.threshold,
            delta: Some(delta),
        }
    }
}

impl Default for PitchEvaluator {
    fn default() -> Self {
        Self::new(MotionConfig::default().pitch_up_threshold)
    }
}
