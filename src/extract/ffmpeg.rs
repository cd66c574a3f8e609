//! FFmpeg-backed video source
//!
//! Probes clips with ffprobe and decodes single frames on seek, giving the
//! batch extractor the same seek/snapshot protocol a video element offers.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;

use super::types::{ExtractionError, VideoMetadata, VideoSource, VideoSourceFactory};
use crate::capture::VideoFrame;
use crate::recorder::SourceClip;

pub struct FfmpegVideoSource {
    path: PathBuf,
    metadata: Option<VideoMetadata>,
    current: Option<VideoFrame>,
    // Recorded clips are spilled to disk for ffmpeg; removed on drop
    _spill: Option<NamedTempFile>,
}

impl FfmpegVideoSource {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            metadata: None,
            current: None,
            _spill: None,
        }
    }

    /// Write in-memory clip bytes to a temporary file and open it
    pub fn from_bytes(data: &[u8], extension: &str) -> Result<Self, ExtractionError> {
        let mut file = tempfile::Builder::new()
            .prefix("signlens-clip-")
            .suffix(&format!(".{}", extension))
            .tempfile()?;
        file.write_all(data)?;
        file.flush()?;

        let mut source = Self::open(file.path());
        source._spill = Some(file);
        Ok(source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse `ffprobe -print_format json` output
fn parse_probe_output(json_str: &str) -> Result<VideoMetadata, ExtractionError> {
    let json: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractionError::Metadata(format!("Failed to parse ffprobe output: {}", e)))?;

    let video_stream = json
        .get("streams")
        .and_then(|s| s.as_array())
        .and_then(|s| s.first())
        .ok_or_else(|| ExtractionError::Metadata("No video stream found".to_string()))?;

    let width = video_stream.get("width").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
    let height = video_stream.get("height").and_then(|v| v.as_u64()).unwrap_or(0) as u32;

    // Container duration first, then the stream's
    let duration_secs = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .or_else(|| video_stream.get("duration"))
        .and_then(|d| d.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ExtractionError::Metadata("Duration unknown".to_string()))?;

    if width == 0 || height == 0 {
        return Err(ExtractionError::Metadata(format!(
            "Invalid dimensions {}x{}",
            width, height
        )));
    }

    Ok(VideoMetadata {
        width,
        height,
        duration_secs,
    })
}

#[async_trait]
impl VideoSource for FfmpegVideoSource {
    async fn wait_for_metadata(&mut self) -> Result<VideoMetadata, ExtractionError> {
        if let Some(metadata) = self.metadata {
            return Ok(metadata);
        }

        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
                "-select_streams",
                "v:0",
            ])
            .arg(&self.path)
            .output()
            .await
            .map_err(|e| ExtractionError::Ffmpeg(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(ExtractionError::Ffmpeg(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let metadata = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
        tracing::info!(
            "Probed {:?}: {}x{}, {:.2}s",
            self.path,
            metadata.width,
            metadata.height,
            metadata.duration_secs
        );
        self.metadata = Some(metadata);
        Ok(metadata)
    }

    async fn seek(&mut self, timestamp_secs: f64) -> Result<(), ExtractionError> {
        let metadata = self.wait_for_metadata().await?;

        let output = Command::new("ffmpeg")
            .args(["-v", "error", "-ss", &format!("{:.3}", timestamp_secs), "-i"])
            .arg(&self.path)
            .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ExtractionError::Ffmpeg(format!("Failed to start FFmpeg: {}", e)))?;

        if !output.status.success() {
            return Err(ExtractionError::Seek {
                timestamp_secs,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if output.stdout.is_empty() {
            // Past the last decodable frame the previous frame stays current
            if self.current.is_some() {
                tracing::debug!("No frame at {:.3}s, keeping previous frame", timestamp_secs);
                return Ok(());
            }
            return Err(ExtractionError::Seek {
                timestamp_secs,
                message: "no frame decoded".to_string(),
            });
        }

        let frame = VideoFrame::new(metadata.width, metadata.height, output.stdout)?;
        self.current = Some(frame);
        Ok(())
    }

    fn snapshot(&self) -> Result<VideoFrame, ExtractionError> {
        self.current
            .clone()
            .ok_or_else(|| ExtractionError::Metadata("No frame decoded yet".to_string()))
    }
}

/// Opens uploaded files in place and spills recorded clips to disk
#[derive(Debug, Default)]
pub struct FfmpegSourceFactory;

#[async_trait]
impl VideoSourceFactory for FfmpegSourceFactory {
    async fn open(&self, clip: &SourceClip) -> Result<Box<dyn VideoSource>, ExtractionError> {
        match clip {
            SourceClip::Uploaded(path) => {
                if !path.exists() {
                    return Err(ExtractionError::Metadata(format!(
                        "Video file not found: {:?}",
                        path
                    )));
                }
                Ok(Box::new(FfmpegVideoSource::open(path.clone())))
            }
            SourceClip::Recorded(clip) => Ok(Box::new(FfmpegVideoSource::from_bytes(
                &clip.data,
                clip.file_extension(),
            )?)),
        }
    }
}
