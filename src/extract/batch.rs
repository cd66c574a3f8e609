//! Batch landmark extraction
//!
//! Walks an already-loaded video frame by frame: seek, snapshot, detect,
//! encode. Exactly one detection is in flight at any time, so results line up
//! with the frames that produced them.

use std::sync::Arc;
use std::time::Duration;

use super::types::{ExtractionError, ExtractionOutput, VideoSource};
use crate::capture::FrameCanvas;
use crate::detector::{DetectorConfig, DetectorFactory, HandDetector, LockstepDetector};
use crate::landmarks::encode;
use crate::utils::PipelineConfig;

/// Frames between two progress lines in the step log
const LOG_EVERY_FRAMES: usize = 25;

/// Upper bound on the up-front frame buffer
const PREALLOC_FRAMES: usize = 1024;

pub struct BatchExtractor {
    detectors: Arc<dyn DetectorFactory>,
    detector_config: DetectorConfig,
    target_fps: u32,
    max_clip_secs: u32,
    canvas: FrameCanvas,
    metadata_timeout: Duration,
    detection_timeout: Duration,
}

impl BatchExtractor {
    pub fn new(
        detectors: Arc<dyn DetectorFactory>,
        detector_config: DetectorConfig,
        pipeline: &PipelineConfig,
    ) -> Self {
        Self {
            canvas: FrameCanvas::square(detector_config.image_size),
            detectors,
            detector_config,
            target_fps: pipeline.target_fps.max(1),
            max_clip_secs: pipeline.max_clip_secs,
            metadata_timeout: Duration::from_secs(pipeline.metadata_timeout_secs),
            detection_timeout: Duration::from_secs(pipeline.detection_timeout_secs),
        }
    }

    /// Number of frames sampled from a clip of `duration_secs`
    pub fn frame_count_for(&self, duration_secs: f64) -> usize {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return 0;
        }
        (duration_secs * f64::from(self.target_fps)).floor() as usize
    }

    pub async fn extract(
        &self,
        source: &mut dyn VideoSource,
    ) -> Result<ExtractionOutput, ExtractionError> {
        self.extract_with_progress(source, |_, _| {}).await
    }

    /// Run the extraction. `on_frame(done, total)` fires after every frame.
    ///
    /// The detector instance is created for this run and closed on every
    /// exit path.
    pub async fn extract_with_progress<F>(
        &self,
        source: &mut dyn VideoSource,
        on_frame: F,
    ) -> Result<ExtractionOutput, ExtractionError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let mut log = Vec::new();

        log.push("Waiting for video metadata".to_string());
        let metadata = tokio::time::timeout(self.metadata_timeout, source.wait_for_metadata())
            .await
            .map_err(|_| {
                ExtractionError::Metadata(format!(
                    "not loaded within {}s",
                    self.metadata_timeout.as_secs()
                ))
            })??;
        log.push(format!(
            "Video loaded: {}x{}, {:.2}s",
            metadata.width, metadata.height, metadata.duration_secs
        ));
        if metadata.duration_secs > f64::from(self.max_clip_secs) {
            return Err(ExtractionError::Metadata(format!(
                "clip is {:.0}s long, limit is {}s",
                metadata.duration_secs, self.max_clip_secs
            )));
        }

        let detector = self.detectors.create(&self.detector_config)?;
        let result = self
            .run(source, detector.clone(), metadata.duration_secs, &mut log, on_frame)
            .await;

        if let Err(e) = detector.close().await {
            tracing::warn!("Failed to close batch detector: {}", e);
        }
        log.push("Detector released".to_string());

        let frames = result?;
        tracing::info!("Batch extraction produced {} frames", frames.len());
        Ok(ExtractionOutput { frames, log })
    }

    async fn run<F>(
        &self,
        source: &mut dyn VideoSource,
        detector: Arc<dyn HandDetector>,
        duration_secs: f64,
        log: &mut Vec<String>,
        mut on_frame: F,
    ) -> Result<Vec<crate::landmarks::FrameRecord>, ExtractionError>
    where
        F: FnMut(usize, usize) + Send,
    {
        detector.initialize().await?;
        log.push("Hand detector initialized".to_string());

        let total = self.frame_count_for(duration_secs);
        log.push(format!("Extracting {} frames at {} fps", total, self.target_fps));

        let mut lockstep = LockstepDetector::attach(detector, self.detection_timeout);
        let mut frames = Vec::with_capacity(total.min(PREALLOC_FRAMES));

        for i in 0..total {
            let timestamp = i as f64 / f64::from(self.target_fps);
            source.seek(timestamp).await?;

            let snapshot = source.snapshot()?;
            let image = self.canvas.draw(&snapshot)?;
            let result = lockstep.detect(&image).await?;
            frames.push(encode(&result));

            let done = i + 1;
            on_frame(done, total);
            if done % LOG_EVERY_FRAMES == 0 || done == total {
                log.push(format!("Processed {}/{} frames", done, total));
            }
        }

        Ok(frames)
    }
}
