//! Media recorder boundary
//!
//! A recorder is bound to a camera stream, buffers encoded chunks while
//! running and hands them all back when stopped.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::capture::CameraStream;

/// Recording errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecorderError {
    #[error("Recorder could not be created: {0}")]
    Create(String),

    #[error("Recorder failed to start: {0}")]
    Start(String),

    #[error("Recorder failed to finalize: {0}")]
    Finalize(String),

    #[error("Recorder is not running")]
    NotRunning,
}

#[async_trait]
pub trait MediaRecorder: Send {
    /// Container/codec of the produced chunks, e.g. `video/webm`
    fn mime_type(&self) -> &str;

    async fn start(&mut self) -> Result<(), RecorderError>;

    /// Stop and return every buffered chunk in order
    async fn stop(&mut self) -> Result<Vec<Vec<u8>>, RecorderError>;
}

/// Creates recorders bound to a stream
pub trait RecorderFactory: Send + Sync {
    fn create(&self, stream: Arc<dyn CameraStream>) -> Result<Box<dyn MediaRecorder>, RecorderError>;
}
