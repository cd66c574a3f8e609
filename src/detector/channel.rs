//! Detector boundary and result correlation
//!
//! Hand-pose models deliver results through a registered callback instead of
//! returning them from `send`. `LockstepDetector` turns that into a
//! request/response pair: one submission, then wait for exactly one result.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use super::types::{DetectorConfig, HandDetectionResult};
use crate::capture::VideoFrame;

/// Detector errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    #[error("Detector initialization failed: {0}")]
    Initialization(String),

    #[error("Detector rejected frame: {0}")]
    Send(String),

    #[error("Detector closed")]
    Closed,

    #[error("No detection result within {0:?}")]
    Timeout(Duration),
}

/// Callback invoked once per processed image
pub type ResultsCallback = Box<dyn Fn(HandDetectionResult) + Send + Sync>;

/// External hand-pose model
#[async_trait]
pub trait HandDetector: Send + Sync {
    /// Load the model. Safe to call more than once.
    async fn initialize(&self) -> Result<(), DetectorError>;

    /// Register the results callback, replacing any previous one
    fn on_results(&self, callback: ResultsCallback);

    /// Submit an image. Its result, if any, is delivered through the
    /// callback before this resolves.
    async fn send(&self, image: &VideoFrame) -> Result<(), DetectorError>;

    /// Release the model
    async fn close(&self) -> Result<(), DetectorError>;
}

/// Creates detector instances
pub trait DetectorFactory: Send + Sync {
    fn create(&self, config: &DetectorConfig) -> Result<Arc<dyn HandDetector>, DetectorError>;
}

/// Strict one-in-flight wrapper used by the batch path
pub struct LockstepDetector {
    detector: Arc<dyn HandDetector>,
    results: mpsc::UnboundedReceiver<HandDetectionResult>,
    timeout: Duration,
}

impl LockstepDetector {
    /// Take over the detector's callback slot
    pub fn attach(detector: Arc<dyn HandDetector>, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        detector.on_results(Box::new(move |result| {
            let _ = tx.send(result);
        }));
        Self {
            detector,
            results: rx,
            timeout,
        }
    }

    /// Send one image and wait for its result
    pub async fn detect(&mut self, image: &VideoFrame) -> Result<HandDetectionResult, DetectorError> {
        // Anything queued now belongs to an earlier submission
        let mut stale = 0usize;
        while self.results.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            tracing::warn!("Dropped {} stale detection results", stale);
        }

        self.detector.send(image).await?;

        match tokio::time::timeout(self.timeout, self.results.recv()).await {
            Ok(Some(result)) => Ok(result),
            Ok(None) => Err(DetectorError::Closed),
            Err(_) => Err(DetectorError::Timeout(self.timeout)),
        }
    }

    pub fn detector(&self) -> &Arc<dyn HandDetector> {
        &self.detector
    }
}
