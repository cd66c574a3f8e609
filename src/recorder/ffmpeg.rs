//! FFmpeg clip recorder
//!
//! Pumps frames from the camera stream into an H.264 encoder process at a
//! fixed rate. On stop the encoder is flushed and the finished file becomes
//! the single chunk of the clip.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::media::{MediaRecorder, RecorderError, RecorderFactory};
use crate::capture::{CameraStream, Resolution};

pub struct FfmpegClipRecorder {
    stream: Arc<dyn CameraStream>,
    fps: u32,
    workdir: Option<TempDir>,
    process: Option<Child>,
    pump: Option<(oneshot::Sender<()>, JoinHandle<u64>)>,
}

impl FfmpegClipRecorder {
    pub fn new(stream: Arc<dyn CameraStream>, fps: u32) -> Self {
        Self {
            stream,
            fps: fps.max(1),
            workdir: None,
            process: None,
            pump: None,
        }
    }

    fn output_path(&self) -> Option<PathBuf> {
        self.workdir.as_ref().map(|dir| dir.path().join("clip.mp4"))
    }
}

/// Encoder arguments up to the output path. stderr is only read once the
/// encoder exits, so FFmpeg logs errors only.
fn encoder_args(resolution: Resolution, fps: u32) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-nostats", "-loglevel", "error", "-y"]
        .into_iter()
        .map(String::from)
        .collect();
    args.extend([
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pixel_format".to_string(),
        "rgb24".to_string(),
        "-video_size".to_string(),
        format!("{}x{}", resolution.width, resolution.height),
        "-framerate".to_string(),
        fps.to_string(),
        "-i".to_string(),
        "-".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]);
    args
}

#[async_trait]
impl MediaRecorder for FfmpegClipRecorder {
    fn mime_type(&self) -> &str {
        "video/mp4"
    }

    async fn start(&mut self) -> Result<(), RecorderError> {
        if self.process.is_some() {
            return Err(RecorderError::Start("already recording".to_string()));
        }

        let resolution = self.stream.resolution();
        let workdir = tempfile::Builder::new()
            .prefix("signlens-rec-")
            .tempdir()
            .map_err(|e| RecorderError::Start(e.to_string()))?;
        let output_file = workdir.path().join("clip.mp4");

        let mut process = Command::new("ffmpeg")
            .args(encoder_args(resolution, self.fps))
            .arg(&output_file)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RecorderError::Start(format!("Failed to start FFmpeg: {}", e)))?;

        let mut stdin = process
            .stdin
            .take()
            .ok_or_else(|| RecorderError::Start("Failed to capture FFmpeg stdin".to_string()))?;

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let stream = self.stream.clone();
        let period = Duration::from_millis(1000 / u64::from(self.fps));

        let pump = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            let mut written = 0u64;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        let Some(frame) = stream.current_frame() else { continue };
                        if frame.width != resolution.width || frame.height != resolution.height {
                            continue;
                        }
                        if let Err(e) = stdin.write_all(&frame.data).await {
                            tracing::warn!("FFmpeg recorder input closed: {}", e);
                            break;
                        }
                        written += 1;
                    }
                }
            }
            // Closing stdin signals EOF to the encoder
            drop(stdin);
            written
        });

        tracing::info!(
            "Started FFmpeg recorder: {}x{} @ {}fps, output: {:?}",
            resolution.width,
            resolution.height,
            self.fps,
            output_file
        );

        self.workdir = Some(workdir);
        self.process = Some(process);
        self.pump = Some((stop_tx, pump));
        Ok(())
    }

    async fn stop(&mut self) -> Result<Vec<Vec<u8>>, RecorderError> {
        let (stop_tx, pump) = self.pump.take().ok_or(RecorderError::NotRunning)?;
        let _ = stop_tx.send(());
        let frames = pump
            .await
            .map_err(|e| RecorderError::Finalize(format!("frame pump failed: {}", e)))?;

        let process = self.process.take().ok_or(RecorderError::NotRunning)?;
        let output = process
            .wait_with_output()
            .await
            .map_err(|e| RecorderError::Finalize(e.to_string()))?;
        if !output.status.success() {
            return Err(RecorderError::Finalize(format!(
                "FFmpeg exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let path = self
            .output_path()
            .ok_or_else(|| RecorderError::Finalize("output directory missing".to_string()))?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| RecorderError::Finalize(format!("Failed to read {:?}: {}", path, e)))?;
        self.workdir = None;

        tracing::info!("FFmpeg recorder finished: {} frames, {} bytes", frames, data.len());
        Ok(vec![data])
    }
}

/// Builds FFmpeg recorders at a fixed frame rate
#[derive(Debug, Clone)]
pub struct FfmpegRecorderFactory {
    fps: u32,
}

impl FfmpegRecorderFactory {
    pub fn new(fps: u32) -> Self {
        Self { fps }
    }
}

impl RecorderFactory for FfmpegRecorderFactory {
    fn create(&self, stream: Arc<dyn CameraStream>) -> Result<Box<dyn MediaRecorder>, RecorderError> {
        if !stream.has_current_frame() && stream.live_track_count() == 0 {
            return Err(RecorderError::Create(format!(
                "stream {} has no live tracks",
                stream.id()
            )));
        }
        Ok(Box::new(FfmpegClipRecorder::new(stream, self.fps)))
    }
}
