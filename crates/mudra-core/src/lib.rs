//! # mudra-core
//!
//! Mushti (fist) pose and wrist-motion gesture classification over
//! 21-point normalized hand landmark frames.
//!
//! The pipeline runs three engines per frame: [`pose::PoseEvaluator`]
//! measures per-finger curl ratios for the static fist verdict,
//! [`pitch::PitchEvaluator`] reads wrist depth against the knuckle plane,
//! and [`motion::MotionClassifier`] turns post-release wrist travel into
//! COURAGE / STEADINESS events. [`controller::GestureController`] wires
//! them together with release-edge detection and a one-event-per-episode
//! latch.
//!
//! All timestamps are caller-supplied milliseconds; the crate never reads
//! a clock, which keeps every path deterministic under test.

pub mod config;
pub mod controller;
pub mod landmarks;
pub mod motion;
pub mod pitch;
pub mod pose;

#[cfg(test)]
pub mod tests_config;
#[cfg(test)]
pub mod tests_pipeline;

// Landmark geometry
pub use landmarks::{point_distance, Landmark, HAND_CONNECTIONS, LANDMARK_COUNT};

// Configuration
pub use config::{
    ConfigError, FingerSpec, LabelPolarity, MotionConfig, MudraConfig, MushtiConfig,
    ResolvedMotion, ResolvedMushti, ThumbSpec,
};

// Static pose evaluation
pub use pose::{FingerMetric, PoseEvaluator, PoseResult, ThumbMetric};

// Wrist pitch
pub use pitch::{PitchEvaluator, PitchResult};

// Temporal motion classification
pub use motion::{
    GestureEvent, GestureLabel, MotionClassifier, MotionDiagnostics, MotionReadiness,
    UpdateContext,
};

// Frame-loop orchestration
pub use controller::{FrameOutcome, GestureController};
