//! Capture session module
//!
//! This module implements the session lifecycle:
//! - SessionController owning camera, recorder and timers
//! - MediaRecorder trait for clip encoders
//! - FFmpeg-backed recorder for native builds

pub mod controller;
pub mod ffmpeg;
pub mod media;
pub mod state;

pub use controller::{
    SessionBackends, SessionConfig, SessionController, SessionError, SessionEvent, TranslationClaim,
};
pub use ffmpeg::{FfmpegClipRecorder, FfmpegRecorderFactory};
pub use media::{MediaRecorder, RecorderError, RecorderFactory};
pub use state::{
    CaptureMode, ClipPreview, MediaClip, RecordingArtifact, SessionState, SourceClip, StopReason,
};
