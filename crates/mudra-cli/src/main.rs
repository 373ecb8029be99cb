//! Command-line front end: print effective configuration, run a scripted
//! demo episode, or replay a recorded landmark capture.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use mudra_core::landmarks::hand_indices;
use mudra_core::{
    ConfigError, GestureController, Landmark, MotionClassifier, MudraConfig, UpdateContext,
    LANDMARK_COUNT,
};

#[derive(Parser)]
#[command(name = "mudra", about = "Mushti gesture classification toolkit", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration as TOML
    Config {
        /// TOML or JSON config file to load first
        #[arg(long)]
        path: Option<String>,
    },
    /// Run a scripted classification episode on synthetic frames
    Demo,
    /// Replay a JSONL landmark capture through the pipeline
    Replay {
        /// Capture file: one JSON object per line, `{"t_ms": .., "landmarks": [[x,y,z] x21] | null}`
        path: String,
        /// TOML or JSON config file
        #[arg(long)]
        config: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Config { path } => run_config(path.as_deref()),
        Commands::Demo => {
            run_demo();
            Ok(())
        }
        Commands::Replay { path, config } => run_replay(&path, config.as_deref()),
    }
}

fn load_config(path: &str) -> Result<MudraConfig, ConfigError> {
    if Path::new(path).extension().and_then(|e| e.to_str()) == Some("json") {
        MudraConfig::from_json_file(path)
    } else {
        MudraConfig::from_file(path)
    }
}

fn run_config(path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => load_config(p)?,
        None => MudraConfig::default(),
    };
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn run_demo() {
    println!("=== Release episode (grace path) ===");
    let mut controller = GestureController::with_config(&MudraConfig::default());
    let mut last_t = 0;
    for i in 0..10 {
        last_t = 1000 + i * 33;
        let out = controller.process_frame(&fist_frame(0.5), last_t);
        if i == 9 {
            println!(
                "[{} ms] fist engaged ({}/{} curled)",
                last_t, out.pose.curled_count, out.pose.required_curled
            );
        }
    }
    println!("[{} ms] releasing with upward wrist travel", last_t + 30);
    let release_script: [(i64, f32); 5] =
        [(1330, 0.5), (1360, 0.48), (1390, 0.46), (1420, 0.44), (1450, 0.42)];
    for (t, y) in release_script {
        let out = controller.process_frame(&open_frame(y), t);
        if let Some(event) = out.event {
            println!("[{} ms] {} (confidence {:.2})", t, event.label, event.confidence);
        }
    }

    println!("=== Sustained drift (buffering path) ===");
    let mut classifier = MotionClassifier::new();
    let ctx = UpdateContext::default();
    let mut last_t = 0;
    for i in 0..30 {
        last_t = 10_000 + i * 50;
        let y = 0.5 + i as f32 * 0.005;
        if let Some(event) = classifier.update(y, last_t, &ctx) {
            println!(
                "[{} ms] {} (confidence {:.2})",
                last_t, event.label, event.confidence
            );
        }
    }
    let readiness = classifier.readiness(last_t);
    println!(
        "ready={} in_cooldown={} cooldown_remaining_ms={}",
        readiness.ready, readiness.in_cooldown, readiness.cooldown_remaining_ms
    );
}

/// One captured frame. `landmarks: null` marks a tick where no hand was
/// detected.
#[derive(Debug, Deserialize)]
struct ReplayFrame {
    t_ms: i64,
    landmarks: Option<Vec<[f32; 3]>>,
}

fn run_replay(path: &str, config_path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(p) => load_config(p)?,
        None => MudraConfig::default(),
    };
    let mut controller = GestureController::with_config(&config);

    let reader = BufReader::new(File::open(path)?);
    let mut events = 0usize;
    let mut last_ms = 0i64;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: ReplayFrame = serde_json::from_str(&line)
            .map_err(|e| format!("{}:{}: {}", path, line_no + 1, e))?;
        last_ms = frame.t_ms;
        let landmarks: Vec<Landmark> = frame
            .landmarks
            .map(|points| {
                points
                    .iter()
                    .map(|p| Landmark::new(p[0], p[1], p[2]))
                    .collect()
            })
            .unwrap_or_default();
        let outcome = controller.process_frame(&landmarks, frame.t_ms);
        if let Some(event) = outcome.event {
            events += 1;
            println!(
                "[{} ms] {} (confidence {:.2})",
                frame.t_ms, event.label, event.confidence
            );
        }
    }

    let diagnostics = controller.motion().diagnostics(last_ms);
    println!("{} frames, {} events", controller.frame_count(), events);
    println!(
        "buffered samples: {} (window {} ms, min {})",
        diagnostics.sample_count, diagnostics.buffer_ms, diagnostics.min_samples
    );
    Ok(())
}

/// Synthetic hand with four fingers splayed at the given curl ratio; the
/// knuckle row sits at z 0 so the wrist z doubles as the pitch delta.
fn synthetic_hand(curl_ratio: f32, wrist_y: f32, wrist_z: f32) -> Vec<Landmark> {
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

fn fist_frame(wrist_y: f32) -> Vec<Landmark> {
    synthetic_hand(0.5, wrist_y, 0.05)
}

fn open_frame(wrist_y: f32) -> Vec<Landmark> {
    synthetic_hand(2.0, wrist_y, 0.05)
}
