//! Frame encoding
//!
//! Turns one detection result into a fixed two-slot landmark record.

use crate::detector::{HandDetectionResult, Handedness, Point3, LANDMARKS_PER_HAND};

/// Flattened values per frame: 2 hands x 21 points x 3 coordinates
pub const VALUES_PER_FRAME: usize = 2 * LANDMARKS_PER_HAND * 3;

/// Value filling every coordinate of a padding frame. Real coordinates are
/// normalized and never reach it.
pub const PAD_VALUE: f32 = -10.0;

/// Landmarks of one frame, left slot then right slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRecord {
    left: [Point3; LANDMARKS_PER_HAND],
    right: [Point3; LANDMARKS_PER_HAND],
}

impl Default for FrameRecord {
    fn default() -> Self {
        Self::empty()
    }
}

impl FrameRecord {
    /// No hands: every point is (0, 0, 0)
    pub fn empty() -> Self {
        Self {
            left: [Point3::ZERO; LANDMARKS_PER_HAND],
            right: [Point3::ZERO; LANDMARKS_PER_HAND],
        }
    }

    /// Sentinel used to pad short sequences
    pub fn pad() -> Self {
        Self {
            left: [Point3::splat(PAD_VALUE); LANDMARKS_PER_HAND],
            right: [Point3::splat(PAD_VALUE); LANDMARKS_PER_HAND],
        }
    }

    pub fn slot(&self, hand: Handedness) -> &[Point3; LANDMARKS_PER_HAND] {
        match hand {
            Handedness::Left => &self.left,
            Handedness::Right => &self.right,
        }
    }

    fn slot_mut(&mut self, hand: Handedness) -> &mut [Point3; LANDMARKS_PER_HAND] {
        match hand {
            Handedness::Left => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }

    pub fn is_pad(&self) -> bool {
        self.flatten().iter().all(|&v| v == PAD_VALUE)
    }

    /// 126 values: left x,y,z for points 0..21, then right
    pub fn flatten(&self) -> [f32; VALUES_PER_FRAME] {
        let mut out = [0.0f32; VALUES_PER_FRAME];
        for (i, p) in self.left.iter().chain(self.right.iter()).enumerate() {
            out[i * 3] = p.x;
            out[i * 3 + 1] = p.y;
            out[i * 3 + 2] = p.z;
        }
        out
    }

    pub fn to_row(&self) -> Vec<f32> {
        self.flatten().to_vec()
    }
}

/// Encode a detection result.
///
/// Each hand fills the slot named by its label. When a label repeats, the
/// later hand wins. Slots without a hand stay zero.
pub fn encode(result: &HandDetectionResult) -> FrameRecord {
    let mut record = FrameRecord::empty();
    for hand in &result.hands {
        *record.slot_mut(hand.handedness) = hand.landmarks;
    }
    record
}
