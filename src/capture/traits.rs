//! Capture trait definitions
//!
//! Platform-agnostic camera types. The session controller is the only owner
//! of a `CameraStream`; everything else reads frames from a shared handle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Camera acquisition and frame access errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

/// Information about a camera/webcam
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    /// Unique device ID
    pub id: String,

    /// Device name
    pub name: String,

    /// Supported resolutions
    pub supported_resolutions: Vec<Resolution>,
}

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Requested camera settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraConstraints {
    /// Device ID, `None` for the default camera
    pub device_id: Option<String>,

    /// Preferred capture resolution
    pub resolution: Resolution,

    /// Preferred frame rate
    pub fps: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            device_id: None,
            resolution: Resolution {
                width: 640,
                height: 480,
            },
            fps: 30,
        }
    }
}

/// A single RGB8 image, row-major, 3 bytes per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize * 3;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(CaptureError::InvalidFrame(format!(
                "expected {}x{}x3 = {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Frame filled with a single colour
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }
}

/// Source of camera streams
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Request camera access. Resolves once the stream delivers frames or
    /// access is refused.
    async fn acquire(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Arc<dyn CameraStream>, CaptureError>;
}

/// An acquired live camera stream
pub trait CameraStream: Send + Sync {
    /// Stable identifier for logging
    fn id(&self) -> &str;

    fn resolution(&self) -> Resolution;

    /// True once the stream holds a decodable current frame
    fn has_current_frame(&self) -> bool;

    /// Latest frame, if any
    fn current_frame(&self) -> Option<VideoFrame>;

    /// Number of tracks still delivering data
    fn live_track_count(&self) -> usize;

    /// Stop every track. Must be idempotent.
    fn stop_all_tracks(&self);
}
