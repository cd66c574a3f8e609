//! Offscreen canvas feeding the hand detector
//!
//! Every sampled frame, live or seeked, is redrawn at the detector's fixed
//! input size before it is submitted.

use image::imageops::{self, FilterType};
use image::RgbImage;

use super::traits::{CaptureError, VideoFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCanvas {
    width: u32,
    height: u32,
}

impl FrameCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square canvas, the shape the detector expects
    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Draw `frame` stretched to the canvas size
    pub fn draw(&self, frame: &VideoFrame) -> Result<VideoFrame, CaptureError> {
        if frame.width == self.width && frame.height == self.height {
            return Ok(frame.clone());
        }

        let source = RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| {
                CaptureError::InvalidFrame(format!(
                    "{} bytes do not fit {}x{} RGB",
                    frame.data.len(),
                    frame.width,
                    frame.height
                ))
            })?;

        let resized = imageops::resize(&source, self.width, self.height, FilterType::Triangle);

        Ok(VideoFrame {
            width: self.width,
            height: self.height,
            data: resized.into_raw(),
        })
    }
}
