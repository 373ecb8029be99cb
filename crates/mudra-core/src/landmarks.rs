//! Hand Landmark Model
//!
//! Canonical 21-point hand topology: wrist at index 0, then four joints
//! per digit. Coordinates are detector-normalized: x/y in [0, 1]
//! image-relative, z a relative depth with detector-defined scale.

use serde::{Deserialize, Serialize};

/// Points in a full hand frame.
pub const LANDMARK_COUNT: usize = 21;

/// Canonical 21-point hand landmark indices
pub mod hand_indices {
    /// Wrist (frame origin for curl ratios)
    pub const WRIST: usize = 0;

    // === Thumb chain ===
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;

    // === Index finger ===
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;

    // === Middle finger ===
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;

    // === Ring finger ===
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;

    // === Pinky ===
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// Skeleton edge list for rendering collaborators.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (5, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (9, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (13, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    (0, 17),
];

/// One normalized landmark point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth; detectors that omit it leave 0.0.
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Euclidean distance between two landmarks over x, y, z.
pub fn point_distance(a: &Landmark, b: &Landmark) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Whether the frame carries a full hand.
pub fn frame_is_full(frame: &[Landmark]) -> bool {
    frame.len() >= LANDMARK_COUNT
}
