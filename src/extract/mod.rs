//! Landmark extraction
//!
//! Two mutually exclusive paths produce a raw frame sequence:
//! - `BatchExtractor` seeks through a finished clip in lock-step
//! - `LiveExtractor` samples the camera on a timer while recording

pub mod batch;
pub mod ffmpeg;
pub mod live;
pub mod types;

pub use batch::BatchExtractor;
pub use ffmpeg::{FfmpegSourceFactory, FfmpegVideoSource};
pub use live::LiveExtractor;
pub use types::{
    ExtractionError, ExtractionOutput, VideoMetadata, VideoSource, VideoSourceFactory,
};
