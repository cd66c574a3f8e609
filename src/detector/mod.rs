//! Hand-pose detector boundary
//!
//! The model itself is external. This module defines what it returns, how it
//! is configured, and how its callback-style results are correlated with
//! submissions.

pub mod channel;
pub mod types;

pub use channel::{DetectorError, DetectorFactory, HandDetector, LockstepDetector, ResultsCallback};
pub use types::{
    DetectedHand, DetectorConfig, HandDetectionResult, Handedness, Point3, LANDMARKS_PER_HAND,
};
