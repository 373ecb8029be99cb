//! End-to-end pipeline tests: configs loaded from files driving the full
//! pose, pitch and motion frame loop.

use crate::config::MudraConfig;
use crate::controller::GestureController;
use crate::landmarks::{hand_indices, Landmark, LANDMARK_COUNT};
use crate::motion::GestureLabel;
use std::io::Write;
use tempfile::NamedTempFile;

fn temp_file_with(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Synthetic hand frame, same construction as the controller unit tests:
/// four splayed fingers at one curl ratio, knuckle row at z 0.
fn hand_frame(curl_ratio: f32, wrist_y: f32, wrist_z: f32) -> Vec<Landmark> {
    let wrist = Landmark::new(0.5, wrist_y, wrist_z);
    let mut frame = vec![wrist; LANDMARK_COUNT];
    let dirs = [(1.0_f32, 0.0_f32), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];
    let mcps = [
        hand_indices::INDEX_MCP,
        hand_indices::MIDDLE_MCP,
        hand_indices::RING_MCP,
        hand_indices::PINKY_MCP,
    ];
    let tips = [
        hand_indices::INDEX_TIP,
        hand_indices::MIDDLE_TIP,
        hand_indices::RING_TIP,
        hand_indices::PINKY_TIP,
    ];
    for i in 0..4 {
        let (dx, dy) = dirs[i];
        frame[mcps[i]] = Landmark::new(wrist.x + 0.2 * dx, wrist.y + 0.2 * dy, 0.0);
        frame[tips[i]] = Landmark::new(
            wrist.x + 0.2 * curl_ratio * dx,
            wrist.y + 0.2 * curl_ratio * dy,
            0.0,
        );
    }
    frame[hand_indices::THUMB_TIP] = Landmark::new(wrist.x - 0.3, wrist.y - 0.3, 0.0);
    frame
}

#[test]
fn test_toml_config_drives_episode() {
    let file = temp_file_with(
        "[mushti]\n\
         required_curled_fingers = 3\n\
         \n\
         [motion]\n\
         upward_threshold = 0.03\n\
         grace_window_ms = 5000\n",
    );
    let config = MudraConfig::from_file(file.path()).unwrap();
    let mut ctl = GestureController::with_config(&config);

    for i in 0..5 {
        let out = ctl.process_frame(&hand_frame(0.5, 0.5, 0.05), 1000 + i * 50);
        assert!(out.pose.is_fist);
    }
    ctl.process_frame(&hand_frame(2.0, 0.5, 0.05), 1300);
    // 0.04 of travel is below the built-in 0.06 threshold but above the
    // file's 0.03.
    let out = ctl.process_frame(&hand_frame(2.0, 0.46, 0.05), 1400);
    let event = out.event.expect("loosened threshold fires");
    assert_eq!(event.label, GestureLabel::Courage);
    assert!((event.confidence - 1.0).abs() < 1e-6, "confidence clamps at 1");
}

#[test]
fn test_json_config_tightens_steadiness() {
    let file = temp_file_with("{\"motion\": {\"downward_threshold\": 0.2}}");
    let config = MudraConfig::from_json_file(file.path()).unwrap();
    let mut ctl = GestureController::with_config(&config);

    ctl.process_frame(&hand_frame(0.5, 0.5, 0.0), 1000);
    ctl.process_frame(&hand_frame(2.0, 0.5, 0.0), 1100);
    let out = ctl.process_frame(&hand_frame(2.0, 0.57, 0.0), 1200);
    assert!(out.event.is_none(), "0.07 is below the tightened threshold");
    let out = ctl.process_frame(&hand_frame(2.0, 0.75, 0.0), 1300);
    let event = out.event.expect("0.25 clears the tightened threshold");
    assert_eq!(event.label, GestureLabel::Steadiness);
}

#[test]
fn test_inverted_polarity_bypasses_pitch_gate() {
    let file = temp_file_with(
        "[motion.labels]\n\
         positive = \"COURAGE\"\n\
         negative = \"STEADINESS\"\n",
    );
    let config = MudraConfig::from_file(file.path()).unwrap();
    assert!(config.validate().is_ok());
    let mut ctl = GestureController::with_config(&config);

    // Flat pitch would veto COURAGE, but upward now resolves to
    // STEADINESS, which the gate never touches.
    ctl.process_frame(&hand_frame(0.5, 0.5, 0.0), 1000);
    ctl.process_frame(&hand_frame(2.0, 0.5, 0.0), 1100);
    let out = ctl.process_frame(&hand_frame(2.0, 0.43, 0.0), 1200);
    let event = out.event.expect("remapped label is not gated");
    assert_eq!(event.label, GestureLabel::Steadiness);
}

#[test]
fn test_no_hand_mid_episode_cancels_pending_motion() {
    let mut ctl = GestureController::with_config(&MudraConfig::default());
    ctl.process_frame(&hand_frame(0.5, 0.5, 0.05), 1000);
    ctl.process_frame(&hand_frame(2.0, 0.5, 0.05), 1100);
    assert!(ctl.motion().grace_active());

    ctl.process_frame(&[], 1150);

    // Motion that would have fired no longer has an anchor to fire from.
    let out = ctl.process_frame(&hand_frame(2.0, 0.4, 0.05), 1200);
    assert!(out.event.is_none());
    assert!(!ctl.motion().grace_active());
}
