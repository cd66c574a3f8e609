//! Extraction types
//!
//! Errors, video source boundary and the output shared by both paths.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::{CaptureError, VideoFrame};
use crate::detector::DetectorError;
use crate::landmarks::FrameRecord;
use crate::recorder::SourceClip;

/// Extraction errors
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("Video metadata not available: {0}")]
    Metadata(String),

    #[error("Seek to {timestamp_secs:.3}s failed: {message}")]
    Seek { timestamp_secs: f64, message: String },

    #[error(transparent)]
    Detector(#[from] DetectorError),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Loaded-video metadata
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
}

/// A seekable video, the batch path's equivalent of a loaded video element
#[async_trait]
pub trait VideoSource: Send {
    /// Resolves once the duration is known
    async fn wait_for_metadata(&mut self) -> Result<VideoMetadata, ExtractionError>;

    /// Seek and resolve when the frame at `timestamp_secs` is current
    async fn seek(&mut self, timestamp_secs: f64) -> Result<(), ExtractionError>;

    /// The frame currently shown
    fn snapshot(&self) -> Result<VideoFrame, ExtractionError>;
}

/// Opens a `VideoSource` for a selected clip
#[async_trait]
pub trait VideoSourceFactory: Send + Sync {
    async fn open(&self, clip: &SourceClip) -> Result<Box<dyn VideoSource>, ExtractionError>;
}

/// Frames produced by an extraction run plus its step log
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutput {
    pub frames: Vec<FrameRecord>,
    /// Informational only
    pub log: Vec<String>,
}
