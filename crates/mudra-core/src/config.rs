//! Configuration for the pose and motion classifiers.
//!
//! All fields are independently overridable: partial TOML or JSON files
//! resolve against the built-in defaults, so a file may carry nothing but
//! the one threshold being tuned.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::landmarks::{hand_indices, LANDMARK_COUNT};
use crate::motion::GestureLabel;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

/// Top-level configuration record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MudraConfig {
    pub mushti: MushtiConfig,
    pub motion: MotionConfig,
}

/// One tracked finger: display name plus its TIP/MCP landmark indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerSpec {
    pub name: String,
    pub tip_index: usize,
    pub mcp_index: usize,
}

/// Thumb requirements. Unlike fingers the thumb is judged by absolute
/// touch distance, not a ratio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbSpec {
    pub tip_index: usize,
    /// Carried for collaborators that render the thumb chain; evaluation
    /// only reads the tip.
    pub mcp_index: usize,
    /// Touch distance threshold in normalized units.
    pub threshold: f32,
}

/// Static pose (closed fist) requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MushtiConfig {
    /// Global curl threshold on the tip-to-wrist over mcp-to-wrist ratio.
    pub finger_threshold: f32,
    /// Curled signals (fingers plus thumb) needed for a fist verdict.
    pub required_curled_fingers: usize,
    /// Per-finger threshold overrides keyed by finger name. Non-finite
    /// entries fall back to the global threshold.
    pub finger_thresholds: HashMap<String, f32>,
    pub fingers: Vec<FingerSpec>,
    pub thumb: Option<ThumbSpec>,
}

/// Maps displacement sign to an output label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelPolarity {
    /// Label for positive displacement (wrist moving down the image).
    pub positive: GestureLabel,
    /// Label for negative displacement (wrist moving up).
    pub negative: GestureLabel,
}

/// Temporal motion classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Rolling buffering window in milliseconds.
    pub buffer_ms: u64,
    /// Samples required before the buffering path may classify.
    pub min_samples: usize,
    /// Minimum absolute wrist displacement across the buffering window.
    pub displacement_threshold: f32,
    /// Minimum time between two emitted events.
    pub cooldown_ms: u64,
    /// Lifetime of a grace anchor after pose release.
    pub grace_window_ms: u64,
    /// Grace-path threshold for upward motion (toward smaller y).
    pub upward_threshold: f32,
    /// Grace-path threshold for downward motion.
    pub downward_threshold: f32,
    /// Wrist-pitch delta at which the courage gate opens.
    pub pitch_up_threshold: f32,
    pub labels: LabelPolarity,
}

impl Default for MudraConfig {
    fn default() -> Self {
        Self {
            mushti: MushtiConfig::default(),
            motion: MotionConfig::default(),
        }
    }
}

impl Default for MushtiConfig {
    fn default() -> Self {
        Self {
            finger_threshold: 0.92,
            required_curled_fingers: 4,
            finger_thresholds: HashMap::new(),
            fingers: default_fingers(),
            thumb: Some(ThumbSpec::default()),
        }
    }
}

impl Default for ThumbSpec {
    fn default() -> Self {
        Self {
            tip_index: hand_indices::THUMB_TIP,
            mcp_index: hand_indices::THUMB_MCP,
            threshold: 0.08,
        }
    }
}

impl Default for LabelPolarity {
    fn default() -> Self {
        Self {
            positive: GestureLabel::Steadiness,
            negative: GestureLabel::Courage,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            buffer_ms: 1000,
            min_samples: 20,
            displacement_threshold: 0.08,
            cooldown_ms: 2000,
            grace_window_ms: 2000,
            upward_threshold: 0.06,
            downward_threshold: 0.06,
            pitch_up_threshold: 0.02,
            labels: LabelPolarity::default(),
        }
    }
}

fn default_fingers() -> Vec<FingerSpec> {
    use hand_indices::*;
    vec![
        FingerSpec {
            name: "index".to_string(),
            tip_index: INDEX_TIP,
            mcp_index: INDEX_MCP,
        },
        FingerSpec {
            name: "middle".to_string(),
            tip_index: MIDDLE_TIP,
            mcp_index: MIDDLE_MCP,
        },
        FingerSpec {
            name: "ring".to_string(),
            tip_index: RING_TIP,
            mcp_index: RING_MCP,
        },
        FingerSpec {
            name: "pinky".to_string(),
            tip_index: PINKY_TIP,
            mcp_index: PINKY_MCP,
        },
    ]
}

/// One finger with its effective threshold baked in.
#[derive(Debug, Clone)]
pub struct ResolvedFinger {
    pub name: String,
    pub tip: usize,
    pub mcp: usize,
    pub threshold: f32,
}

#[derive(Debug, Clone)]
pub struct ResolvedThumb {
    pub tip: usize,
    pub threshold: f32,
}

/// `MushtiConfig` after layered-defaults resolution.
#[derive(Debug, Clone)]
pub struct ResolvedMushti {
    pub fingers: Vec<ResolvedFinger>,
    pub thumb: Option<ResolvedThumb>,
    pub required_curled: usize,
}

/// `MotionConfig` after resolution: signed millisecond arithmetic, the
/// hysteresis window precomputed, polarity baked into direct label fields.
#[derive(Debug, Clone)]
pub struct ResolvedMotion {
    pub buffer_ms: i64,
    pub min_samples: usize,
    pub displacement_threshold: f32,
    pub cooldown_ms: i64,
    /// Cooldown scaled by the 1.5 relabeling guard.
    pub hysteresis_ms: i64,
    pub grace_window_ms: i64,
    pub upward_threshold: f32,
    pub downward_threshold: f32,
    pub positive_label: GestureLabel,
    pub negative_label: GestureLabel,
}

impl Default for ResolvedMotion {
    fn default() -> Self {
        MotionConfig::default().resolve()
    }
}

impl MushtiConfig {
    /// Resolve per-finger overrides once, at load time. Nothing is
    /// re-resolved per frame.
    pub fn resolve(&self) -> ResolvedMushti {
        let fingers = self
            .fingers
            .iter()
            .map(|finger| {
                let threshold = self
                    .finger_thresholds
                    .get(&finger.name)
                    .copied()
                    .filter(|t| t.is_finite())
                    .unwrap_or(self.finger_threshold);
                ResolvedFinger {
                    name: finger.name.clone(),
                    tip: finger.tip_index,
                    mcp: finger.mcp_index,
                    threshold,
                }
            })
            .collect();
        let thumb = self.thumb.as_ref().map(|thumb| ResolvedThumb {
            tip: thumb.tip_index,
            threshold: thumb.threshold,
        });
        ResolvedMushti {
            fingers,
            thumb,
            required_curled: self.required_curled_fingers,
        }
    }
}

impl MotionConfig {
    pub fn resolve(&self) -> ResolvedMotion {
        ResolvedMotion {
            buffer_ms: self.buffer_ms as i64,
            min_samples: self.min_samples,
            displacement_threshold: self.displacement_threshold,
            cooldown_ms: self.cooldown_ms as i64,
            hysteresis_ms: (self.cooldown_ms as f64 * 1.5) as i64,
            grace_window_ms: self.grace_window_ms as i64,
            upward_threshold: self.upward_threshold,
            downward_threshold: self.downward_threshold,
            positive_label: self.labels.positive,
            negative_label: self.labels.negative,
        }
    }
}

impl MudraConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: MudraConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: MudraConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    /// Environment variables should be prefixed with MUDRA_
    /// Example: MUDRA_MOTION_COOLDOWN_MS=1500
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. User config file (if exists)
    /// 3. Default config file
    /// 4. Built-in defaults (lowest priority)
    pub fn load_layered(
        default_path: Option<&Path>,
        user_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut config = MudraConfig::default();

        // Layer 1: Default config file
        if let Some(path) = default_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        }

        // Layer 2: User config file (overrides defaults)
        if let Some(path) = user_path {
            if path.exists() {
                let user_config = Self::from_file(path)?;
                config = config.merge(user_config);
            }
        }

        // Layer 3: Environment variables (highest priority)
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Merge another config into this one (other takes priority).
    /// Missing fields in the other file were already filled from defaults
    /// at deserialization time, so whole-record replacement is the merge.
    fn merge(self, other: MudraConfig) -> Self {
        other
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        use std::env;

        // Mushti overrides
        if let Ok(val) = env::var("MUDRA_MUSHTI_FINGER_THRESHOLD") {
            self.mushti.finger_threshold = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid MUDRA_MUSHTI_FINGER_THRESHOLD".to_string())
            })?;
        }
        if let Ok(val) = env::var("MUDRA_MUSHTI_REQUIRED_CURLED_FINGERS") {
            self.mushti.required_curled_fingers = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid MUDRA_MUSHTI_REQUIRED_CURLED_FINGERS".to_string())
            })?;
        }
        if let Ok(val) = env::var("MUDRA_MUSHTI_THUMB_THRESHOLD") {
            let threshold = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid MUDRA_MUSHTI_THUMB_THRESHOLD".to_string())
            })?;
            if let Some(thumb) = self.mushti.thumb.as_mut() {
                thumb.threshold = threshold;
            }
        }

        // Motion overrides
        if let Ok(val) = env::var("MUDRA_MOTION_BUFFER_MS") {
            self.motion.buffer_ms = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid MUDRA_MOTION_BUFFER_MS".to_string())
            })?;
        }
        if let Ok(val) = env::var("MUDRA_MOTION_MIN_SAMPLES") {
            self.motion.min_samples = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid MUDRA_MOTION_MIN_SAMPLES".to_string())
            })?;
        }
        if let Ok(val) = env::var("MUDRA_MOTION_DISPLACEMENT_THRESHOLD") {
            self.motion.displacement_threshold = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid MUDRA_MOTION_DISPLACEMENT_THRESHOLD".to_string())
            })?;
        }
        if let Ok(val) = env::var("MUDRA_MOTION_COOLDOWN_MS") {
            self.motion.cooldown_ms = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid MUDRA_MOTION_COOLDOWN_MS".to_string())
            })?;
        }
        if let Ok(val) = env::var("MUDRA_MOTION_GRACE_WINDOW_MS") {
            self.motion.grace_window_ms = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid MUDRA_MOTION_GRACE_WINDOW_MS".to_string())
            })?;
        }
        if let Ok(val) = env::var("MUDRA_MOTION_UPWARD_THRESHOLD") {
            self.motion.upward_threshold = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid MUDRA_MOTION_UPWARD_THRESHOLD".to_string())
            })?;
        }
        if let Ok(val) = env::var("MUDRA_MOTION_DOWNWARD_THRESHOLD") {
            self.motion.downward_threshold = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid MUDRA_MOTION_DOWNWARD_THRESHOLD".to_string())
            })?;
        }
        if let Ok(val) = env::var("MUDRA_MOTION_PITCH_UP_THRESHOLD") {
            self.motion.pitch_up_threshold = val.parse().map_err(|_| {
                ConfigError::Validation("Invalid MUDRA_MOTION_PITCH_UP_THRESHOLD".to_string())
            })?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Mushti validation
        if !self.mushti.finger_threshold.is_finite() || self.mushti.finger_threshold <= 0.0 {
            return Err(ConfigError::Validation(
                "mushti.finger_threshold must be positive".to_string(),
            ));
        }
        for (name, threshold) in &self.mushti.finger_thresholds {
            if threshold.is_finite() && *threshold <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "mushti.finger_thresholds[{}] must be positive",
                    name
                )));
            }
        }
        for finger in &self.mushti.fingers {
            if finger.name.is_empty() {
                return Err(ConfigError::Validation(
                    "mushti.fingers entries must be named".to_string(),
                ));
            }
            if finger.tip_index >= LANDMARK_COUNT || finger.mcp_index >= LANDMARK_COUNT {
                return Err(ConfigError::Validation(format!(
                    "mushti.fingers[{}] landmark index out of range",
                    finger.name
                )));
            }
        }
        if let Some(thumb) = &self.mushti.thumb {
            if thumb.tip_index >= LANDMARK_COUNT || thumb.mcp_index >= LANDMARK_COUNT {
                return Err(ConfigError::Validation(
                    "mushti.thumb landmark index out of range".to_string(),
                ));
            }
            if !thumb.threshold.is_finite() || thumb.threshold <= 0.0 {
                return Err(ConfigError::Validation(
                    "mushti.thumb.threshold must be positive".to_string(),
                ));
            }
        }
        if self.mushti.required_curled_fingers == 0 {
            return Err(ConfigError::Validation(
                "mushti.required_curled_fingers must be >= 1".to_string(),
            ));
        }
        let max_signals = self.mushti.fingers.len() + usize::from(self.mushti.thumb.is_some());
        if self.mushti.required_curled_fingers > max_signals {
            return Err(ConfigError::Validation(
                "mushti.required_curled_fingers exceeds configured fingers plus thumb".to_string(),
            ));
        }

        // Motion validation
        if self.motion.buffer_ms == 0 {
            return Err(ConfigError::Validation(
                "motion.buffer_ms must be > 0".to_string(),
            ));
        }
        if self.motion.min_samples == 0 {
            return Err(ConfigError::Validation(
                "motion.min_samples must be > 0".to_string(),
            ));
        }
        if !self.motion.displacement_threshold.is_finite()
            || self.motion.displacement_threshold <= 0.0
        {
            return Err(ConfigError::Validation(
                "motion.displacement_threshold must be positive".to_string(),
            ));
        }
        if self.motion.grace_window_ms == 0 {
            return Err(ConfigError::Validation(
                "motion.grace_window_ms must be > 0".to_string(),
            ));
        }
        if !self.motion.upward_threshold.is_finite() || self.motion.upward_threshold <= 0.0 {
            return Err(ConfigError::Validation(
                "motion.upward_threshold must be positive".to_string(),
            ));
        }
        if !self.motion.downward_threshold.is_finite() || self.motion.downward_threshold <= 0.0 {
            return Err(ConfigError::Validation(
                "motion.downward_threshold must be positive".to_string(),
            ));
        }
        if !self.motion.pitch_up_threshold.is_finite() || self.motion.pitch_up_threshold < 0.0 {
            return Err(ConfigError::Validation(
                "motion.pitch_up_threshold must be >= 0".to_string(),
            ));
        }
        if self.motion.labels.positive == self.motion.labels.negative {
            return Err(ConfigError::Validation(
                "motion.labels must assign distinct labels to the two signs".to_string(),
            ));
        }

        Ok(())
    }

    /// Export configuration to TOML string
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self
            .to_toml_string()
            .map_err(|e| ConfigError::Validation(format!("TOML serialization error: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }
}
