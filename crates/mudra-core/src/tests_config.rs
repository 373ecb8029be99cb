//! Configuration loading, validation and resolution tests.

use crate::config::{ConfigError, LabelPolarity, MotionConfig, MudraConfig};
use crate::motion::GestureLabel;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, OnceLock};
use tempfile::NamedTempFile;

/// Process environment is shared; tests that read or write MUDRA_ vars
/// serialize on this lock.
fn env_guard() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    match LOCK.get_or_init(|| Mutex::new(())).lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn temp_file_with(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_default_config_is_valid() {
    let config = MudraConfig::default();
    assert!(config.validate().is_ok());

    assert!((config.mushti.finger_threshold - 0.92).abs() < 1e-6);
    assert_eq!(config.mushti.required_curled_fingers, 4);
    assert_eq!(config.mushti.fingers.len(), 4);
    let thumb = config.mushti.thumb.as_ref().unwrap();
    assert!((thumb.threshold - 0.08).abs() < 1e-6);

    assert_eq!(config.motion.buffer_ms, 1000);
    assert_eq!(config.motion.min_samples, 20);
    assert!((config.motion.displacement_threshold - 0.08).abs() < 1e-6);
    assert_eq!(config.motion.cooldown_ms, 2000);
    assert_eq!(config.motion.grace_window_ms, 2000);
    assert!((config.motion.pitch_up_threshold - 0.02).abs() < 1e-6);
    assert_eq!(config.motion.labels.positive, GestureLabel::Steadiness);
    assert_eq!(config.motion.labels.negative, GestureLabel::Courage);
}

#[test]
fn test_resolve_bakes_polarity_and_hysteresis() {
    let resolved = MotionConfig::default().resolve();
    assert_eq!(resolved.buffer_ms, 1000);
    assert_eq!(resolved.cooldown_ms, 2000);
    assert_eq!(resolved.hysteresis_ms, 3000);
    assert_eq!(resolved.positive_label, GestureLabel::Steadiness);
    assert_eq!(resolved.negative_label, GestureLabel::Courage);
}

#[test]
fn test_resolve_applies_finger_overrides() {
    let mut config = MudraConfig::default();
    config
        .mushti
        .finger_thresholds
        .insert("index".to_string(), 0.5);
    config
        .mushti
        .finger_thresholds
        .insert("ring".to_string(), f32::NAN);

    let resolved = config.mushti.resolve();
    for finger in &resolved.fingers {
        let expected = if finger.name == "index" { 0.5 } else { 0.92 };
        assert!(
            (finger.threshold - expected).abs() < 1e-6,
            "finger {} resolved to {}",
            finger.name,
            finger.threshold
        );
    }
    assert_eq!(resolved.required_curled, 4);
    assert!(resolved.thumb.is_some());
}

#[test]
fn test_toml_round_trip() {
    let config = MudraConfig::default();
    let toml_str = config.to_toml_string().unwrap();
    assert!(toml_str.contains("[mushti]"));
    assert!(toml_str.contains("[motion]"));
    assert!(toml_str.contains("positive = \"STEADINESS\""));

    let parsed: MudraConfig = toml::from_str(&toml_str).unwrap();
    assert!(parsed.validate().is_ok());
    assert_eq!(parsed.motion.cooldown_ms, config.motion.cooldown_ms);
    assert_eq!(parsed.mushti.fingers.len(), config.mushti.fingers.len());
}

#[test]
fn test_save_and_load_file() {
    let file = NamedTempFile::new().unwrap();
    let mut config = MudraConfig::default();
    config.motion.cooldown_ms = 1234;
    config.save_to_file(file.path()).unwrap();

    let loaded = MudraConfig::from_file(file.path()).unwrap();
    assert_eq!(loaded.motion.cooldown_ms, 1234);
    assert_eq!(loaded.mushti.fingers.len(), 4);
}

#[test]
fn test_partial_toml_fills_defaults() {
    let file = temp_file_with("[motion]\ncooldown_ms = 900\n");
    let config = MudraConfig::from_file(file.path()).unwrap();
    assert_eq!(config.motion.cooldown_ms, 900);
    assert_eq!(config.motion.buffer_ms, 1000);
    assert_eq!(config.mushti.fingers.len(), 4);
    assert!(config.mushti.thumb.is_some());
}

#[test]
fn test_partial_json_fills_defaults() {
    let file = temp_file_with("{\"mushti\": {\"finger_threshold\": 0.85}}");
    let config = MudraConfig::from_json_file(file.path()).unwrap();
    assert!((config.mushti.finger_threshold - 0.85).abs() < 1e-6);
    assert_eq!(config.mushti.required_curled_fingers, 4);
    assert_eq!(config.motion.min_samples, 20);
}

#[test]
fn test_missing_file_is_io_error() {
    let result = MudraConfig::from_file("/nonexistent/path/mudra.toml");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let file = temp_file_with("not = [valid");
    let result = MudraConfig::from_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_malformed_json_is_parse_error() {
    let file = temp_file_with("{\"mushti\": ");
    let result = MudraConfig::from_json_file(file.path());
    assert!(matches!(result, Err(ConfigError::JsonParse(_))));
}

#[test]
fn test_validation_rejects_bad_values() {
    let cases: Vec<(&str, Box<dyn Fn(&mut MudraConfig)>)> = vec![
        ("negative finger threshold", Box::new(|c| c.mushti.finger_threshold = -1.0)),
        ("nan finger threshold", Box::new(|c| c.mushti.finger_threshold = f32::NAN)),
        ("zero required fingers", Box::new(|c| c.mushti.required_curled_fingers = 0)),
        ("required above capacity", Box::new(|c| c.mushti.required_curled_fingers = 6)),
        ("finger index out of range", Box::new(|c| c.mushti.fingers[0].tip_index = 21)),
        ("unnamed finger", Box::new(|c| c.mushti.fingers[0].name.clear())),
        (
            "zero thumb threshold",
            Box::new(|c| c.mushti.thumb.as_mut().unwrap().threshold = 0.0),
        ),
        (
            "negative override",
            Box::new(|c| {
                c.mushti.finger_thresholds.insert("index".to_string(), -0.5);
            }),
        ),
        ("zero buffer", Box::new(|c| c.motion.buffer_ms = 0)),
        ("zero min samples", Box::new(|c| c.motion.min_samples = 0)),
        (
            "negative displacement threshold",
            Box::new(|c| c.motion.displacement_threshold = -0.1),
        ),
        ("zero grace window", Box::new(|c| c.motion.grace_window_ms = 0)),
        ("zero upward threshold", Box::new(|c| c.motion.upward_threshold = 0.0)),
        ("nan downward threshold", Box::new(|c| c.motion.downward_threshold = f32::NAN)),
        (
            "negative pitch threshold",
            Box::new(|c| c.motion.pitch_up_threshold = -0.1),
        ),
        (
            "identical labels",
            Box::new(|c| {
                c.motion.labels = LabelPolarity {
                    positive: GestureLabel::Courage,
                    negative: GestureLabel::Courage,
                }
            }),
        ),
    ];

    for (what, mutate) in cases {
        let mut config = MudraConfig::default();
        mutate(&mut config);
        assert!(config.validate().is_err(), "{} should fail validation", what);
    }
}

#[test]
fn test_validation_error_names_the_field() {
    let mut config = MudraConfig::default();
    config.motion.buffer_ms = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("motion.buffer_ms"));
}

#[test]
fn test_nan_override_entry_passes_validation() {
    // A non-finite override means "no override"; resolve() falls back to
    // the global threshold, so validation accepts it.
    let mut config = MudraConfig::default();
    config
        .mushti
        .finger_thresholds
        .insert("pinky".to_string(), f32::NAN);
    assert!(config.validate().is_ok());
}

#[test]
fn test_env_overrides() {
    let _guard = env_guard();
    let file = NamedTempFile::new().unwrap();
    MudraConfig::default().save_to_file(file.path()).unwrap();

    std::env::set_var("MUDRA_MOTION_COOLDOWN_MS", "1500");
    std::env::set_var("MUDRA_MUSHTI_FINGER_THRESHOLD", "0.9");
    let config = MudraConfig::from_file_with_env(file.path());
    std::env::remove_var("MUDRA_MOTION_COOLDOWN_MS");
    std::env::remove_var("MUDRA_MUSHTI_FINGER_THRESHOLD");

    let config = config.unwrap();
    assert_eq!(config.motion.cooldown_ms, 1500);
    assert!((config.mushti.finger_threshold - 0.9).abs() < 1e-6);
}

#[test]
fn test_invalid_env_value_is_error() {
    let _guard = env_guard();
    let file = NamedTempFile::new().unwrap();
    MudraConfig::default().save_to_file(file.path()).unwrap();

    std::env::set_var("MUDRA_MOTION_MIN_SAMPLES", "not-a-number");
    let result = MudraConfig::from_file_with_env(file.path());
    std::env::remove_var("MUDRA_MOTION_MIN_SAMPLES");

    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn test_layered_loading_priority() {
    let _guard = env_guard();
    let default_file = temp_file_with("[motion]\nbuffer_ms = 500\n");
    let user_file = temp_file_with("[motion]\ncooldown_ms = 900\n");

    // User file replaces the whole record; its unset fields come from the
    // built-in defaults, not from the default file.
    let config =
        MudraConfig::load_layered(Some(default_file.path()), Some(user_file.path())).unwrap();
    assert_eq!(config.motion.cooldown_ms, 900);
    assert_eq!(config.motion.buffer_ms, 1000);

    // Without a user file the default file holds.
    let config = MudraConfig::load_layered(Some(default_file.path()), None).unwrap();
    assert_eq!(config.motion.buffer_ms, 500);

    // Environment outranks both.
    std::env::set_var("MUDRA_MOTION_GRACE_WINDOW_MS", "123");
    let config = MudraConfig::load_layered(Some(default_file.path()), Some(user_file.path()));
    std::env::remove_var("MUDRA_MOTION_GRACE_WINDOW_MS");
    assert_eq!(config.unwrap().motion.grace_window_ms, 123);

    // Missing paths fall through to built-in defaults.
    let config = MudraConfig::load_layered(
        Some(std::path::Path::new("/definitely/missing.toml")),
        None,
    )
    .unwrap();
    assert_eq!(config.motion.buffer_ms, 1000);
}

#[test]
fn test_gesture_label_wire_format() {
    assert_eq!(
        serde_json::to_string(&GestureLabel::Courage).unwrap(),
        "\"COURAGE\""
    );
    assert_eq!(
        serde_json::from_str::<GestureLabel>("\"STEADINESS\"").unwrap(),
        GestureLabel::Steadiness
    );
    assert_eq!(GestureLabel::Courage.to_string(), "COURAGE");
    assert_eq!(GestureLabel::Steadiness.to_string(), "STEADINESS");
}
