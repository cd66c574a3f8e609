//! Landmark sequences
//!
//! Per-frame encoding of detected hands and fixed-length resampling.

pub mod encoder;
pub mod normalizer;

pub use encoder::{encode, FrameRecord, PAD_VALUE, VALUES_PER_FRAME};
pub use normalizer::{normalize, NormalizedSequence};

/// Frames in sampling order, as produced by either extraction path
pub type RawSequence = Vec<FrameRecord>;
