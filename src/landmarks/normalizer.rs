//! Sequence normalization
//!
//! Resamples a variable-length frame list to the exact length the model
//! expects. Longer input is sampled uniformly (no interpolation), shorter
//! input is padded at the end with sentinel frames.

use super::encoder::FrameRecord;

/// Fixed-length landmark sequence ready to submit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedSequence {
    frames: Vec<FrameRecord>,
}

impl NormalizedSequence {
    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of sentinel frames at the tail
    pub fn pad_count(&self) -> usize {
        self.frames.iter().rev().take_while(|f| f.is_pad()).count()
    }

    /// One 126-wide row per frame
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.frames.iter().map(FrameRecord::to_row).collect()
    }

    pub fn into_frames(self) -> Vec<FrameRecord> {
        self.frames
    }
}

/// Source index picked for output position `i` when shrinking `n` frames to
/// `target`: `floor(i * (n - 1) / max(target - 1, 1))`
fn sample_index(i: usize, n: usize, target: usize) -> usize {
    let denom = target.saturating_sub(1).max(1) as u64;
    ((i as u64 * (n as u64 - 1)) / denom) as usize
}

/// Resample `raw` to exactly `target_len` frames
pub fn normalize(raw: &[FrameRecord], target_len: usize) -> NormalizedSequence {
    let n = raw.len();

    let frames = if target_len == 0 {
        Vec::new()
    } else if n == target_len {
        raw.to_vec()
    } else if n > target_len {
        (0..target_len)
            .map(|i| raw[sample_index(i, n, target_len)])
            .collect()
    } else {
        let mut frames = Vec::with_capacity(target_len);
        frames.extend_from_slice(raw);
        frames.resize(target_len, FrameRecord::pad());
        frames
    };

    NormalizedSequence { frames }
}
