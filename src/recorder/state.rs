//! Session state management
//!
//! Defines the session state machine states, input modes and the clips a
//! session produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::landmarks::FrameRecord;

/// Current state of the capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// No camera held
    Idle,
    /// Waiting for camera access
    CameraStarting,
    /// Camera live, not recording
    CameraActive,
    /// Recording and sampling landmarks
    Recording,
    /// Finalizing a recording
    Stopping,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl SessionState {
    /// States in which a camera stream is held
    pub fn holds_camera(&self) -> bool {
        matches!(
            self,
            SessionState::CameraActive | SessionState::Recording | SessionState::Stopping
        )
    }
}

/// Input mode; the two are mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Record from the camera
    Live,
    /// Translate an uploaded file
    Upload,
}

impl Default for CaptureMode {
    fn default() -> Self {
        Self::Upload
    }
}

/// A finished recording held in memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaClip {
    pub id: Uuid,
    pub mime_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl MediaClip {
    /// Concatenate recorder chunks into one clip
    pub fn from_chunks(chunks: Vec<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mime_type: mime_type.into(),
            data: chunks.concat(),
            created_at: Utc::now(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// File extension matching the container
    pub fn file_extension(&self) -> &'static str {
        let container = self.mime_type.split(';').next().unwrap_or("").trim();
        match container {
            "video/mp4" => "mp4",
            "video/quicktime" => "mov",
            "video/x-matroska" => "mkv",
            _ => "webm",
        }
    }

    pub fn preview(&self) -> ClipPreview {
        ClipPreview {
            clip_id: self.id,
            url: format!("clip://{}", self.id),
        }
    }
}

/// Reference a player can load the finished clip from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipPreview {
    pub clip_id: Uuid,
    pub url: String,
}

/// The clip a translation runs on
#[derive(Debug, Clone, PartialEq)]
pub enum SourceClip {
    /// Produced by a live recording
    Recorded(MediaClip),
    /// Picked by the user in upload mode
    Uploaded(PathBuf),
}

impl SourceClip {
    pub fn is_recorded(&self) -> bool {
        matches!(self, SourceClip::Recorded(_))
    }
}

/// Clip and the landmarks sampled over the same recording window
#[derive(Debug, Clone)]
pub struct RecordingArtifact {
    pub clip: MediaClip,
    pub frames: Vec<FrameRecord>,
    pub preview: ClipPreview,
}

/// Why a recording ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    User,
    Timeout,
}
