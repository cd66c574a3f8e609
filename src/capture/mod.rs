//! Camera capture
//!
//! Camera device/stream traits, the detector input canvas and, behind the
//! `native-camera` feature, a nokhwa-backed webcam.

pub mod canvas;
pub mod traits;

#[cfg(feature = "native-camera")]
pub mod native;

pub use canvas::FrameCanvas;
pub use traits::{
    CameraConstraints, CameraDevice, CameraInfo, CameraStream, CaptureError, Resolution,
    VideoFrame,
};
