//! Hand detection types
//!
//! What the hand-pose model hands back for one image, and how it is configured.

use serde::{Deserialize, Serialize};

/// Keypoints per detected hand
pub const LANDMARKS_PER_HAND: usize = 21;

/// A landmark in model-normalized image space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const ZERO: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Same value on every axis
    pub fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }
}

/// Handedness label reported by the model.
///
/// The label is relative to the camera image, so it need not match the
/// signer's anatomical hand. It is used as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Parse a model label ("Left" / "Right", any case)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Handedness::Left),
            "right" => Some(Handedness::Right),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
        }
    }
}

/// One detected hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedHand {
    pub handedness: Handedness,
    pub landmarks: [Point3; LANDMARKS_PER_HAND],
}

impl DetectedHand {
    pub fn new(handedness: Handedness, landmarks: [Point3; LANDMARKS_PER_HAND]) -> Self {
        Self {
            handedness,
            landmarks,
        }
    }
}

/// Output of one detector run; zero or more hands
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandDetectionResult {
    pub hands: Vec<DetectedHand>,
}

impl HandDetectionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_hands(hands: Vec<DetectedHand>) -> Self {
        Self { hands }
    }
}

/// Detector settings fixed for the whole session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorConfig {
    pub max_num_hands: u32,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    /// Width and height of the images sent to the model
    pub image_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_num_hands: 2,
            min_detection_confidence: 0.4,
            min_tracking_confidence: 0.4,
            image_size: crate::utils::config::DETECTOR_FRAME_SIZE,
        }
    }
}
