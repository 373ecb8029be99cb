//! Static Mushti (fist) pose evaluation over a single landmark frame.
//!
//! Pure geometry, no temporal state. Finger curl is the ratio of
//! tip-to-wrist over knuckle-to-wrist distance; the thumb is judged by
//! proximity to the nearest configured knuckle instead.

use crate::config::ResolvedMushti;
use crate::landmarks::{frame_is_full, hand_indices, point_distance, Landmark};

/// Per-finger curl measurement.
#[derive(Debug, Clone)]
pub struct FingerMetric {
    pub name: String,
    /// `dist(tip, wrist) / dist(mcp, wrist)`. Non-finite on degenerate
    /// geometry; never treated as curled then.
    pub ratio: f32,
    /// `ratio - threshold`. Negative means curled past the threshold.
    pub delta: f32,
    pub threshold: f32,
    pub curled: bool,
}

impl FingerMetric {
    /// How far the finger is from counting as curled; zero once it does.
    pub fn shortfall(&self) -> f32 {
        self.delta.max(0.0)
    }
}

/// Thumb proximity measurement.
#[derive(Debug, Clone)]
pub struct ThumbMetric {
    /// Minimum distance from thumb tip to a configured knuckle, or to the
    /// wrist when no fingers are configured.
    pub touch_distance: f32,
    /// `touch_distance - threshold`. Negative means touching.
    pub delta: f32,
    pub threshold: f32,
    pub curled: bool,
}

/// Verdict plus per-digit diagnostics for one frame.
#[derive(Debug, Clone, Default)]
pub struct PoseResult {
    pub is_fist: bool,
    pub curled_count: usize,
    pub required_curled: usize,
    pub fingers: Vec<FingerMetric>,
    pub thumb: Option<ThumbMetric>,
}

/// Stateless fist detector. Holds no config until one is supplied and
/// answers neutrally until then.
#[derive(Debug, Clone, Default)]
pub struct PoseEvaluator {
    config: Option<ResolvedMushti>,
}

impl PoseEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ResolvedMushti) -> Self {
        Self {
            config: Some(config),
        }
    }

    pub fn set_config(&mut self, config: ResolvedMushti) {
        self.config = Some(config);
    }

    pub fn config(&self) -> Option<&ResolvedMushti> {
        self.config.as_ref()
    }

    /// Evaluate one frame. Absent config or a short frame yields the
    /// neutral result rather than an error.
    pub fn evaluate(&self, frame: &[Landmark]) -> PoseResult {
        let Some(cfg) = &self.config else {
            return PoseResult::default();
        };
        if !frame_is_full(frame) {
            return PoseResult::default();
        }
        let wrist = &frame[hand_indices::WRIST];

        let mut fingers = Vec::with_capacity(cfg.fingers.len());
        let mut curled_count = 0;
        for finger in &cfg.fingers {
            let ratio = match (frame.get(finger.tip), frame.get(finger.mcp)) {
                (Some(tip), Some(mcp)) => {
                    point_distance(tip, wrist) / point_distance(mcp, wrist)
                }
                _ => f32::NAN,
            };
            if !ratio.is_finite() {
                log::warn!("degenerate curl geometry for finger {}", finger.name);
            }
            let curled = ratio.is_finite() && ratio < finger.threshold;
            if curled {
                curled_count += 1;
            }
            fingers.push(FingerMetric {
                name: finger.name.clone(),
                ratio,
                delta: ratio - finger.threshold,
                threshold: finger.threshold,
                curled,
            });
        }

        let mut thumb = None;
        if let Some(thumb_cfg) = &cfg.thumb {
            let touch_distance = match frame.get(thumb_cfg.tip) {
                Some(tip) if !cfg.fingers.is_empty() => cfg
                    .fingers
                    .iter()
                    .filter_map(|f| frame.get(f.mcp))
                    .map(|mcp| point_distance(tip, mcp))
                    .fold(f32::INFINITY, f32::min),
                Some(tip) => point_distance(tip, wrist),
                None => f32::NAN,
            };
            // NaN and infinity both compare false here.
            let curled = touch_distance <= thumb_cfg.threshold;
            if curled {
                curled_count += 1;
            }
            thumb = Some(ThumbMetric {
                touch_distance,
                delta: touch_distance - thumb_cfg.threshold,
                threshold: thumb_cfg.threshold,
                curled,
            });
        }

        PoseResult {
            is_fist: curled_count >= cfg.required_curled,
            curled_count,
            required_curled: cfg.required_curled,
            fingers,
            thumb,
        }
    }
}
