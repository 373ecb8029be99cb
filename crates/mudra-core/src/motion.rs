//! Temporal Wrist-Motion Classification
//!
//! Two mutually exclusive modes. Buffering (the default) watches slow
//! sustained drift across a rolling multi-sample window. Grace is armed
//! explicitly right after pose release and classifies one decisive
//! displacement against a single anchor, no sample accumulation.
//! Cooldown and a 1.5x hysteresis window keep one motion from firing
//! twice as the buffer slides.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{MotionConfig, ResolvedMotion};

/// Output gesture labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GestureLabel {
    Courage,
    Steadiness,
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Courage => write!(f, "COURAGE"),
            Self::Steadiness => write!(f, "STEADINESS"),
        }
    }
}

/// One emitted classification. Ephemeral; the classifier never stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub label: GestureLabel,
    /// Clamped to [0, 1].
    pub confidence: f32,
}

/// Per-update context supplied by the orchestrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateContext {
    /// External veto for the COURAGE label. Only an explicit `Some(false)`
    /// suppresses; `None` leaves the label allowed.
    pub courage_allowed: Option<bool>,
}

impl UpdateContext {
    pub fn allowing(courage_allowed: bool) -> Self {
        Self {
            courage_allowed: Some(courage_allowed),
        }
    }

    fn vetoes(&self, label: GestureLabel) -> bool {
        label == GestureLabel::Courage && self.courage_allowed == Some(false)
    }
}

#[derive(Debug, Clone, Copy)]
struct MotionSample {
    y: f32,
    t_ms: i64,
}

#[derive(Debug, Clone, Copy)]
struct GraceAnchor {
    y: f32,
    started_at_ms: i64,
}

/// Read-only state snapshot for UI collaborators.
#[derive(Debug, Clone, Default)]
pub struct MotionDiagnostics {
    pub sample_count: usize,
    /// Last minus first buffered sample, once at least two are held.
    pub displacement: Option<f32>,
    pub buffer_ms: i64,
    pub min_samples: usize,
    pub displacement_threshold: f32,
    pub cooldown_remaining_ms: i64,
    /// Remaining anchor lifetime while grace is armed.
    pub grace_remaining_ms: Option<i64>,
}

/// Coarse readiness summary of the buffering path.
#[derive(Debug, Clone, Default)]
pub struct MotionReadiness {
    pub ready: bool,
    pub has_samples: bool,
    pub in_cooldown: bool,
    pub cooldown_remaining_ms: i64,
}

/// Stateful wrist-motion classifier. One instance per hand stream; state
/// is owned, never shared.
pub struct MotionClassifier {
    config: ResolvedMotion,
    samples: Vec<MotionSample>,
    grace: Option<GraceAnchor>,
    last_fired_at_ms: i64,
    last_label: Option<GestureLabel>,
}

impl MotionClassifier {
    pub fn new() -> Self {
        Self::with_config(MotionConfig::default().resolve())
    }

    pub fn with_config(config: ResolvedMotion) -> Self {
        Self {
            config,
            samples: Vec::with_capacity(64),
            grace: None,
            last_fired_at_ms: 0,
            last_label: None,
        }
    }

    /// Replace the configuration and reset state in one step; a half-updated
    /// config must never see a stale sample window.
    pub fn set_config(&mut self, config: ResolvedMotion) {
        self.config = config;
        self.reset();
    }

    pub fn config(&self) -> &ResolvedMotion {
        &self.config
    }

    /// Arm the grace window at the current wrist position, overwriting any
    /// prior anchor. Entering grace discards buffering progress.
    pub fn start_grace(&mut self, anchor_y: f32, now_ms: i64) {
        self.samples.clear();
        self.grace = Some(GraceAnchor {
            y: anchor_y,
            started_at_ms: now_ms,
        });
        log::debug!("grace armed at y={:.3}", anchor_y);
    }

    /// Drop the grace anchor. The sample buffer is left intact.
    pub fn cancel_grace(&mut self) {
        self.grace = None;
    }

    /// Whether an anchor is present. It may already be past its window; the
    /// next `update` observes that and clears it.
    pub fn grace_active(&self) -> bool {
        self.grace.is_some()
    }

    /// Clear buffered samples only.
    pub fn reset_samples(&mut self) {
        self.samples.clear();
    }

    /// Full reset: samples, grace anchor, cooldown bookkeeping.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.grace = None;
        self.last_fired_at_ms = 0;
        self.last_label = None;
    }

    /// Feed one wrist-Y observation. Returns at most one event per call.
    pub fn update(
        &mut self,
        wrist_y: f32,
        now_ms: i64,
        ctx: &UpdateContext,
    ) -> Option<GestureEvent> {
        if let Some(anchor) = self.grace {
            return self.update_grace(anchor, wrist_y, now_ms, ctx);
        }
        self.update_buffered(wrist_y, now_ms, ctx)
    }

    fn update_grace(
        &mut self,
        anchor: GraceAnchor,
        wrist_y: f32,
        now_ms: i64,
        ctx: &UpdateContext,
    ) -> Option<GestureEvent> {
        if now_ms - anchor.started_at_ms > self.config.grace_window_ms {
            // Expired this tick; buffering starts on the next call, not here.
            self.grace = None;
            log::debug!("grace window expired");
            return None;
        }
        let displacement = wrist_y - anchor.y;
        if displacement <= -self.config.upward_threshold {
            let label = self.config.negative_label;
            if ctx.vetoes(label) {
                // Veto leaves the anchor armed; the gate may reopen within
                // the same window.
                log::debug!("{} suppressed by context gate", label);
                return None;
            }
            self.grace = None;
            self.last_fired_at_ms = now_ms;
            self.last_label = Some(label);
            let confidence = (displacement.abs() / self.config.upward_threshold).min(1.0);
            log::info!(
                "{} fired from grace (displacement {:.3})",
                label,
                displacement
            );
            return Some(GestureEvent { label, confidence });
        }
        if displacement >= self.config.downward_threshold {
            let label = self.config.positive_label;
            self.grace = None;
            self.last_fired_at_ms = now_ms;
            self.last_label = Some(label);
            let confidence = (displacement / self.config.downward_threshold).min(1.0);
            log::info!(
                "{} fired from grace (displacement {:.3})",
                label,
                displacement
            );
            return Some(GestureEvent { label, confidence });
        }
        None
    }

    fn update_buffered(
        &mut self,
        wrist_y: f32,
        now_ms: i64,
        ctx: &UpdateContext,
    ) -> Option<GestureEvent> {
        self.samples.push(MotionSample {
            y: wrist_y,
            t_ms: now_ms,
        });
        let cutoff = now_ms - self.config.buffer_ms;
        self.samples.retain(|s| s.t_ms >= cutoff);

        if self.samples.len() < self.config.min_samples {
            return None;
        }
        if now_ms - self.last_fired_at_ms < self.config.cooldown_ms {
            return None;
        }

        let first = self.samples[0];
        let last = self.samples[self.samples.len() - 1];
        let displacement = last.y - first.y;
        if displacement.abs() < self.config.displacement_threshold {
            return None;
        }

        let label = if displacement > 0.0 {
            self.config.positive_label
        } else {
            self.config.negative_label
        };
        if Some(label) == self.last_label
            && now_ms - self.last_fired_at_ms < self.config.hysteresis_ms
        {
            log::debug!("{} suppressed by hysteresis", label);
            return None;
        }
        if ctx.vetoes(label) {
            log::debug!("{} suppressed by context gate", label);
            return None;
        }

        self.last_fired_at_ms = now_ms;
        self.last_label = Some(label);
        let confidence =
            (displacement.abs() / (self.config.displacement_threshold * 2.0)).min(1.0);
        log::info!(
            "{} fired from buffer (displacement {:.3} over {} samples)",
            label,
            displacement,
            self.samples.len()
        );
        Some(GestureEvent { label, confidence })
    }

    /// State snapshot; never mutates, safe every frame.
    pub fn diagnostics(&self, now_ms: i64) -> MotionDiagnostics {
        let displacement = if self.samples.len() >= 2 {
            Some(self.samples[self.samples.len() - 1].y - self.samples[0].y)
        } else {
            None
        };
        MotionDiagnostics {
            sample_count: self.samples.len(),
            displacement,
            buffer_ms: self.config.buffer_ms,
            min_samples: self.config.min_samples,
            displacement_threshold: self.config.displacement_threshold,
            cooldown_remaining_ms: self.cooldown_remaining(now_ms),
            grace_remaining_ms: self
                .grace
                .map(|g| (self.config.grace_window_ms - (now_ms - g.started_at_ms)).max(0)),
        }
    }

    /// Whether the buffering path could classify right now.
    pub fn readiness(&self, now_ms: i64) -> MotionReadiness {
        let has_samples = self.samples.len() >= self.config.min_samples;
        let in_cooldown = now_ms - self.last_fired_at_ms < self.config.cooldown_ms;
        MotionReadiness {
            ready: has_samples && !in_cooldown,
            has_samples,
            in_cooldown,
            cooldown_remaining_ms: self.cooldown_remaining(now_ms),
        }
    }

    fn cooldown_remaining(&self, now_ms: i64) -> i64 {
        (self.config.cooldown_ms - (now_ms - self.last_fired_at_ms)).max(0)
    }
}

impl Default for MotionClassifier {
    fn default() -> Self {
        Self::new()
    }
}
