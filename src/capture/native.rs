//! Native webcam capture using nokhwa
//!
//! The camera lives on a dedicated thread that keeps the latest decoded
//! frame in a shared slot. Stopping the tracks ends the thread and closes the
//! device.

use crate::capture::traits::{
    CameraConstraints, CameraDevice, CameraInfo, CameraStream, CaptureError, Resolution,
    VideoFrame,
};
use async_trait::async_trait;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use parking_lot::Mutex as ParkingMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Get list of available cameras
pub fn get_cameras() -> Vec<CameraInfo> {
    match nokhwa::query(ApiBackend::Auto) {
        Ok(cameras) => cameras
            .into_iter()
            .map(|info| {
                let id = match info.index() {
                    CameraIndex::Index(i) => i.to_string(),
                    CameraIndex::String(s) => s.to_string(),
                };
                CameraInfo {
                    id,
                    name: info.human_name().to_string(),
                    supported_resolutions: vec![
                        Resolution {
                            width: 1280,
                            height: 720,
                        },
                        Resolution {
                            width: 640,
                            height: 480,
                        },
                    ],
                }
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate cameras: {:?}", e);
            Vec::new()
        }
    }
}

fn camera_index(device_id: &Option<String>) -> CameraIndex {
    match device_id {
        Some(id) => match id.parse::<u32>() {
            Ok(idx) => CameraIndex::Index(idx),
            Err(_) => CameraIndex::String(id.clone()),
        },
        None => CameraIndex::Index(0),
    }
}

/// Camera device backed by the platform's native capture API
#[derive(Debug, Default)]
pub struct NativeCamera;

impl NativeCamera {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CameraDevice for NativeCamera {
    async fn acquire(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Arc<dyn CameraStream>, CaptureError> {
        let index = camera_index(&constraints.device_id);
        let latest = Arc::new(ParkingMutex::new(None::<VideoFrame>));
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = oneshot::channel::<Result<Resolution, CaptureError>>();

        let thread_latest = latest.clone();
        let thread_running = running.clone();
        let handle = std::thread::spawn(move || {
            let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

            let mut camera = match Camera::new(index.clone(), format) {
                Ok(c) => c,
                Err(e) => {
                    let _ = ready_tx.send(Err(CaptureError::DeviceUnavailable(format!(
                        "{:?}: {}",
                        index, e
                    ))));
                    return;
                }
            };

            if let Err(e) = camera.open_stream() {
                let _ = ready_tx.send(Err(CaptureError::PermissionDenied(e.to_string())));
                return;
            }

            let resolution = camera.camera_format().resolution();
            let _ = ready_tx.send(Ok(Resolution {
                width: resolution.width(),
                height: resolution.height(),
            }));

            while thread_running.load(Ordering::SeqCst) {
                // Blocks until the camera delivers the next frame
                match camera.frame().and_then(|buffer| buffer.decode_image::<RgbFormat>()) {
                    Ok(image) => {
                        let (width, height) = (image.width(), image.height());
                        *thread_latest.lock() = Some(VideoFrame {
                            width,
                            height,
                            data: image.into_raw(),
                        });
                    }
                    Err(e) => {
                        tracing::debug!("Failed to capture frame: {:?}", e);
                    }
                }
            }

            if let Err(e) = camera.stop_stream() {
                tracing::warn!("Error stopping camera stream: {:?}", e);
            }
            tracing::info!("Camera capture thread stopped");
        });

        let resolution = match ready_rx.await {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                return Err(CaptureError::DeviceUnavailable(
                    "capture thread exited before opening the camera".to_string(),
                ))
            }
        };

        tracing::info!(
            "Camera {:?} opened at {}x{}",
            constraints.device_id,
            resolution.width,
            resolution.height
        );

        Ok(Arc::new(NativeCameraStream {
            id: format!("native-{}", constraints.device_id.as_deref().unwrap_or("0")),
            resolution,
            latest,
            running,
            thread: ParkingMutex::new(Some(handle)),
        }))
    }
}

struct NativeCameraStream {
    id: String,
    resolution: Resolution,
    latest: Arc<ParkingMutex<Option<VideoFrame>>>,
    running: Arc<AtomicBool>,
    thread: ParkingMutex<Option<std::thread::JoinHandle<()>>>,
}

impl CameraStream for NativeCameraStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn has_current_frame(&self) -> bool {
        self.running.load(Ordering::SeqCst) && self.latest.lock().is_some()
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if !self.running.load(Ordering::SeqCst) {
            return None;
        }
        self.latest.lock().clone()
    }

    fn live_track_count(&self) -> usize {
        usize::from(self.running.load(Ordering::SeqCst))
    }

    fn stop_all_tracks(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        // The capture thread notices the flag after its current frame
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
        self.latest.lock().take();
        tracing::info!("Camera stream {} released", self.id);
    }
}

impl Drop for NativeCameraStream {
    fn drop(&mut self) {
        self.stop_all_tracks();
    }
}
