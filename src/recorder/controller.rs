//! Session lifecycle controller
//!
//! Owns the camera stream, the media recorder, the live extractor and the
//! recording timers, and is the only writer of `SessionState`.
//!
//! ```text
//! Idle -> CameraStarting -> CameraActive <-> Recording (-> Stopping -> CameraActive)
//!            |                   |              |
//!            +-> Idle (denied)   +--------------+-> Idle (leave live mode / teardown)
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::media::{MediaRecorder, RecorderError, RecorderFactory};
use super::state::{
    CaptureMode, ClipPreview, MediaClip, RecordingArtifact, SessionState, SourceClip, StopReason,
};
use crate::capture::{CameraConstraints, CameraDevice, CameraStream, CaptureError, FrameCanvas};
use crate::detector::{DetectorConfig, DetectorError, DetectorFactory, HandDetector};
use crate::extract::LiveExtractor;
use crate::landmarks::FrameRecord;
use crate::utils::PipelineConfig;

/// Session errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Could not access the camera: {0}")]
    Acquisition(#[from] CaptureError),

    #[error("Hand detector unavailable: {0}")]
    Detector(#[from] DetectorError),

    #[error("Recording failed: {0}")]
    Recording(#[from] RecorderError),

    #[error("Cannot {action} while {state:?}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },

    #[error("Not available in {0:?} mode")]
    WrongMode(CaptureMode),

    #[error("A translation is in progress")]
    TranslationInProgress,
}

/// Events emitted by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    ModeChanged(CaptureMode),
    /// Seconds left before auto-stop
    CountdownTick(u32),
    RecordingFinished {
        preview: ClipPreview,
        reason: StopReason,
    },
    /// User-facing error message
    Error(String),
}

/// Collaborators the controller drives
#[derive(Clone)]
pub struct SessionBackends {
    pub camera: Arc<dyn CameraDevice>,
    pub recorders: Arc<dyn RecorderFactory>,
    pub detectors: Arc<dyn DetectorFactory>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub camera: CameraConstraints,
}

#[derive(Default)]
struct SessionInner {
    stream: Option<Arc<dyn CameraStream>>,
    /// Created with the first camera start, kept until shutdown
    live: Option<LiveExtractor>,
    recorder: Option<Box<dyn MediaRecorder>>,
    countdown_task: Option<JoinHandle<()>>,
    auto_stop_task: Option<JoinHandle<()>>,
    recording_generation: u64,
    recording_started: Option<Instant>,
    selected: Option<SourceClip>,
    preview: Option<ClipPreview>,
}

impl SessionInner {
    /// Cancel countdown and auto-stop. A timeout-triggered stop runs inside
    /// the auto-stop task itself, so that handle is only detached.
    fn cancel_timers(&mut self, reason: StopReason) {
        if let Some(task) = self.countdown_task.take() {
            task.abort();
        }
        if let Some(task) = self.auto_stop_task.take() {
            if reason == StopReason::User {
                task.abort();
            }
        }
        self.recording_started = None;
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.preview = None;
        if let Some(live) = self.live.as_mut() {
            live.reset();
        }
    }
}

/// Held for the length of one translation. Recording cannot start while a
/// claim is alive; dropping it releases the session.
pub struct TranslationClaim<'a> {
    translating: &'a AtomicBool,
}

impl Drop for TranslationClaim<'_> {
    fn drop(&mut self) {
        self.translating.store(false, Ordering::SeqCst);
    }
}

pub struct SessionController {
    state: Arc<RwLock<SessionState>>,
    mode: RwLock<CaptureMode>,
    inner: Mutex<SessionInner>,
    backends: SessionBackends,
    config: SessionConfig,
    countdown: Arc<AtomicU32>,
    translating: AtomicBool,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(backends: SessionBackends, config: SessionConfig) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(100);
        Arc::new(Self {
            state: Arc::new(RwLock::new(SessionState::Idle)),
            mode: RwLock::new(CaptureMode::default()),
            inner: Mutex::new(SessionInner::default()),
            backends,
            config,
            countdown: Arc::new(AtomicU32::new(0)),
            translating: AtomicBool::new(false),
            event_tx,
        })
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    pub fn mode(&self) -> CaptureMode {
        *self.mode.read()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    fn set_state(&self, state: SessionState) {
        let previous = std::mem::replace(&mut *self.state.write(), state);
        if previous != state {
            tracing::debug!("Session state {:?} -> {:?}", previous, state);
            let _ = self.event_tx.send(SessionEvent::StateChanged(state));
        }
    }

    fn report(&self, message: String) {
        tracing::error!("{}", message);
        let _ = self.event_tx.send(SessionEvent::Error(message));
    }

    /// Switch input mode. Any selected clip is discarded; leaving live mode
    /// releases the camera, entering it starts the camera.
    pub async fn set_mode(&self, mode: CaptureMode) -> Result<(), SessionError> {
        let previous = std::mem::replace(&mut *self.mode.write(), mode);
        if previous != mode {
            tracing::info!("Capture mode {:?} -> {:?}", previous, mode);
            let _ = self.event_tx.send(SessionEvent::ModeChanged(mode));
            self.inner.lock().await.clear_selection();
        }

        match mode {
            CaptureMode::Upload => {
                self.release_camera().await;
                Ok(())
            }
            CaptureMode::Live => self.enter_live_capture().await,
        }
    }

    /// Acquire the camera and prepare the live detector. No-op unless Idle.
    pub async fn enter_live_capture(&self) -> Result<(), SessionError> {
        if self.mode() != CaptureMode::Live {
            return Err(SessionError::WrongMode(self.mode()));
        }

        let mut inner = self.inner.lock().await;
        if self.state() != SessionState::Idle {
            return Ok(());
        }

        self.set_state(SessionState::CameraStarting);
        let stream = match self.backends.camera.acquire(&self.config.camera).await {
            Ok(stream) => stream,
            Err(e) => {
                self.set_state(SessionState::Idle);
                self.report(format!("Could not access the camera: {}", e));
                return Err(SessionError::Acquisition(e));
            }
        };

        if inner.live.is_none() {
            match self.init_detector().await {
                Ok(detector) => {
                    inner.live = Some(LiveExtractor::new(
                        detector,
                        FrameCanvas::square(self.config.detector.image_size),
                        &self.config.pipeline,
                    ));
                }
                Err(e) => {
                    stream.stop_all_tracks();
                    self.set_state(SessionState::Idle);
                    self.report(format!("Hand detector unavailable: {}", e));
                    return Err(SessionError::Detector(e));
                }
            }
        }

        // The user may have switched away while the camera was starting
        if self.mode() != CaptureMode::Live {
            tracing::info!("Mode changed during camera start, releasing {}", stream.id());
            stream.stop_all_tracks();
            self.set_state(SessionState::Idle);
            return Ok(());
        }

        tracing::info!("Camera stream {} active", stream.id());
        inner.stream = Some(stream);
        self.set_state(SessionState::CameraActive);
        Ok(())
    }

    async fn init_detector(&self) -> Result<Arc<dyn HandDetector>, DetectorError> {
        let detector = self.backends.detectors.create(&self.config.detector)?;
        if let Err(e) = detector.initialize().await {
            let _ = detector.close().await;
            return Err(e);
        }
        tracing::info!("Live hand detector initialized");
        Ok(detector)
    }

    /// Start recording: recorder, live sampling, countdown and auto-stop
    pub async fn start_recording(self: &Arc<Self>) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        let state = self.state();
        let stream = match (&inner.stream, state) {
            (Some(stream), SessionState::CameraActive) => stream.clone(),
            _ => {
                return Err(SessionError::InvalidState {
                    action: "start recording",
                    state,
                })
            }
        };
        if self.is_translating() {
            return Err(SessionError::TranslationInProgress);
        }

        let mut recorder = self.backends.recorders.create(stream.clone()).map_err(|e| {
            self.report(format!("Recording failed: {}", e));
            SessionError::Recording(e)
        })?;
        if let Err(e) = recorder.start().await {
            self.report(format!("Recording failed: {}", e));
            return Err(SessionError::Recording(e));
        }

        inner.clear_selection();
        if let Some(live) = inner.live.as_mut() {
            live.start(stream);
        }
        inner.recorder = Some(recorder);
        inner.recording_generation += 1;
        inner.recording_started = Some(Instant::now());

        let limit = self.config.pipeline.max_recording_secs;
        self.countdown.store(limit, Ordering::SeqCst);
        inner.countdown_task = Some(self.spawn_countdown());
        inner.auto_stop_task = Some(self.spawn_auto_stop(inner.recording_generation, limit));

        self.set_state(SessionState::Recording);
        tracing::info!("Recording started (auto-stop after {}s)", limit);
        Ok(())
    }

    fn spawn_countdown(&self) -> JoinHandle<()> {
        let countdown = self.countdown.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let second = Duration::from_secs(1);
            let mut interval = tokio::time::interval_at(Instant::now() + second, second);
            loop {
                interval.tick().await;
                let remaining = countdown.load(Ordering::SeqCst).saturating_sub(1);
                countdown.store(remaining, Ordering::SeqCst);
                let _ = event_tx.send(SessionEvent::CountdownTick(remaining));
                if remaining == 0 {
                    break;
                }
            }
        })
    }

    fn spawn_auto_stop(self: &Arc<Self>, generation: u64, limit_secs: u32) -> JoinHandle<()> {
        let controller = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(u64::from(limit_secs))).await;
            let Some(controller) = controller.upgrade() else {
                return;
            };
            tracing::info!("Recording reached {}s limit", limit_secs);
            if let Err(e) = controller
                .finish_recording(Some(generation), StopReason::Timeout)
                .await
            {
                tracing::debug!("Auto-stop skipped: {}", e);
            }
        })
    }

    /// Stop recording on user request
    pub async fn stop_recording(&self) -> Result<RecordingArtifact, SessionError> {
        self.finish_recording(None, StopReason::User).await
    }

    async fn finish_recording(
        &self,
        generation: Option<u64>,
        reason: StopReason,
    ) -> Result<RecordingArtifact, SessionError> {
        let mut inner = self.inner.lock().await;
        let state = self.state();
        let stale = generation.is_some_and(|g| g != inner.recording_generation);
        if state != SessionState::Recording || stale {
            return Err(SessionError::InvalidState {
                action: "stop recording",
                state,
            });
        }

        self.set_state(SessionState::Stopping);

        // Timers go before the recorder so a pending timeout cannot stop twice
        inner.cancel_timers(reason);
        if reason == StopReason::Timeout && self.countdown.swap(0, Ordering::SeqCst) != 0 {
            let _ = self.event_tx.send(SessionEvent::CountdownTick(0));
        }
        if let Some(live) = inner.live.as_mut() {
            live.stop();
        }
        let frames = inner.live.as_ref().map(LiveExtractor::frames).unwrap_or_default();

        let Some(mut recorder) = inner.recorder.take() else {
            self.set_state(SessionState::CameraActive);
            return Err(SessionError::Recording(RecorderError::NotRunning));
        };
        let mime_type = recorder.mime_type().to_string();
        let chunks = match recorder.stop().await {
            Ok(chunks) => chunks,
            Err(e) => {
                self.set_state(SessionState::CameraActive);
                self.report(format!("Recording failed: {}", e));
                return Err(SessionError::Recording(e));
            }
        };

        let clip = MediaClip::from_chunks(chunks, mime_type);
        let preview = clip.preview();
        tracing::info!(
            "Recording stopped ({:?}): {} bytes, {} landmark frames",
            reason,
            clip.size(),
            frames.len()
        );

        inner.selected = Some(SourceClip::Recorded(clip.clone()));
        inner.preview = Some(preview.clone());
        self.set_state(SessionState::CameraActive);
        let _ = self.event_tx.send(SessionEvent::RecordingFinished {
            preview: preview.clone(),
            reason,
        });

        Ok(RecordingArtifact {
            clip,
            frames,
            preview,
        })
    }

    /// Release the camera and abandon any recording in progress
    pub async fn release_camera(&self) {
        let mut inner = self.inner.lock().await;
        self.release_locked(&mut inner).await;
    }

    async fn release_locked(&self, inner: &mut SessionInner) {
        if let Some(mut recorder) = inner.recorder.take() {
            inner.cancel_timers(StopReason::User);
            if let Some(live) = inner.live.as_mut() {
                live.stop();
                live.reset();
            }
            if let Err(e) = recorder.stop().await {
                tracing::warn!("Discarding unfinished recording failed: {}", e);
            }
            tracing::info!("Unfinished recording discarded");
        }

        if let Some(stream) = inner.stream.take() {
            stream.stop_all_tracks();
            tracing::info!("Camera stream {} released", stream.id());
        }

        self.set_state(SessionState::Idle);
    }

    /// Teardown: release the camera and close the live detector
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        self.release_locked(&mut inner).await;

        if let Some(live) = inner.live.take() {
            let detector = live.detector().clone();
            drop(live);
            if let Err(e) = detector.close().await {
                tracing::warn!("Failed to close live detector: {}", e);
            }
        }
        tracing::info!("Session shut down");
    }

    /// Return to CameraActive after a translation, unless the user left live
    /// mode in the meantime
    pub async fn resume_live_capture(&self) -> Result<(), SessionError> {
        if self.mode() != CaptureMode::Live {
            return Ok(());
        }
        self.enter_live_capture().await
    }

    /// Reserve the session for one translation. Fails while a recording is
    /// running or stopping, or while another claim is alive.
    pub async fn begin_translation(&self) -> Result<TranslationClaim<'_>, SessionError> {
        // Serialized with start_recording through the inner lock
        let _inner = self.inner.lock().await;
        let state = self.state();
        if matches!(state, SessionState::Recording | SessionState::Stopping) {
            return Err(SessionError::InvalidState {
                action: "translate",
                state,
            });
        }
        if self
            .translating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SessionError::TranslationInProgress);
        }
        Ok(TranslationClaim {
            translating: &self.translating,
        })
    }

    pub fn is_translating(&self) -> bool {
        self.translating.load(Ordering::SeqCst)
    }

    /// Pick a file to translate (upload mode only)
    pub async fn select_upload(&self, path: impl Into<PathBuf>) -> Result<(), SessionError> {
        let mode = self.mode();
        if mode != CaptureMode::Upload {
            return Err(SessionError::WrongMode(mode));
        }
        let path = path.into();
        tracing::info!("Selected upload {:?}", path);
        self.inner.lock().await.selected = Some(SourceClip::Uploaded(path));
        Ok(())
    }

    pub async fn selected_clip(&self) -> Option<SourceClip> {
        self.inner.lock().await.selected.clone()
    }

    pub async fn preview(&self) -> Option<ClipPreview> {
        self.inner.lock().await.preview.clone()
    }

    /// Landmarks sampled while the selected clip was recorded, if any
    pub async fn live_sequence(&self) -> Option<Vec<FrameRecord>> {
        let inner = self.inner.lock().await;
        match (&inner.selected, &inner.live) {
            (Some(SourceClip::Recorded(_)), Some(live)) if live.frame_count() > 0 => {
                Some(live.frames())
            }
            _ => None,
        }
    }

    pub async fn live_frame_count(&self) -> usize {
        self.inner
            .lock()
            .await
            .live
            .as_ref()
            .map(LiveExtractor::frame_count)
            .unwrap_or(0)
    }

    /// Seconds left before auto-stop
    pub fn countdown_remaining(&self) -> u32 {
        self.countdown.load(Ordering::SeqCst)
    }

    pub async fn recording_elapsed(&self) -> Option<Duration> {
        self.inner
            .lock()
            .await
            .recording_started
            .map(|started| started.elapsed())
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if let Some(task) = inner.countdown_task.take() {
            task.abort();
        }
        if let Some(task) = inner.auto_stop_task.take() {
            task.abort();
        }
        if let Some(live) = inner.live.as_mut() {
            live.stop();
        }
        if let Some(stream) = inner.stream.take() {
            stream.stop_all_tracks();
            tracing::info!("Camera stream {} released on teardown", stream.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockCamera, MockDetectorFactory, MockRecorderFactory};

    struct Harness {
        camera: Arc<MockCamera>,
        recorders: Arc<MockRecorderFactory>,
        detectors: Arc<MockDetectorFactory>,
        controller: Arc<SessionController>,
    }

    fn harness() -> Harness {
        let camera = Arc::new(MockCamera::new());
        let recorders = Arc::new(MockRecorderFactory::new());
        let detectors = Arc::new(MockDetectorFactory::new());
        let controller = SessionController::new(
            SessionBackends {
                camera: camera.clone(),
                recorders: recorders.clone(),
                detectors: detectors.clone(),
            },
            SessionConfig::default(),
        );
        Harness {
            camera,
            recorders,
            detectors,
            controller,
        }
    }

    fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_enter_live_capture() {
        let h = harness();
        let mut rx = h.controller.subscribe();

        h.controller.set_mode(CaptureMode::Live).await.unwrap();

        assert_eq!(h.controller.state(), SessionState::CameraActive);
        assert_eq!(h.camera.active_tracks(), 1);
        let states: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::StateChanged(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![SessionState::CameraStarting, SessionState::CameraActive]
        );

        // Already active: no second camera, no second detector
        h.controller.enter_live_capture().await.unwrap();
        assert_eq!(h.camera.acquire_count(), 1);
        assert_eq!(h.detectors.created_count(), 1);
    }

    #[tokio::test]
    async fn test_camera_denied_returns_to_idle() {
        let h = harness();
        h.camera.deny("NotAllowedError");
        let mut rx = h.controller.subscribe();

        let err = h.controller.set_mode(CaptureMode::Live).await.unwrap_err();

        assert!(matches!(err, SessionError::Acquisition(CaptureError::PermissionDenied(_))));
        assert_eq!(h.controller.state(), SessionState::Idle);
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, SessionEvent::Error(m) if m.contains("NotAllowedError"))));
    }

    #[tokio::test]
    async fn test_detector_failure_releases_camera() {
        let h = harness();
        h.detectors.fail_initialize("model download failed");

        let err = h.controller.set_mode(CaptureMode::Live).await.unwrap_err();

        assert!(matches!(err, SessionError::Detector(_)));
        assert_eq!(h.controller.state(), SessionState::Idle);
        assert_eq!(h.camera.active_tracks(), 0);
    }

    #[tokio::test]
    async fn test_live_then_upload_leaves_no_tracks() {
        let h = harness();
        h.controller.set_mode(CaptureMode::Live).await.unwrap();
        h.controller.set_mode(CaptureMode::Upload).await.unwrap();

        assert_eq!(h.controller.state(), SessionState::Idle);
        assert_eq!(h.camera.active_tracks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_to_upload_while_camera_starting() {
        let h = harness();
        h.camera.set_acquire_delay(Duration::from_millis(300));

        let controller = h.controller.clone();
        let entering = tokio::spawn(async move { controller.set_mode(CaptureMode::Live).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(h.controller.state(), SessionState::CameraStarting);

        h.controller.set_mode(CaptureMode::Upload).await.unwrap();
        entering.await.unwrap().unwrap();

        assert_eq!(h.controller.state(), SessionState::Idle);
        assert_eq!(h.camera.acquire_count(), 1);
        assert_eq!(h.camera.active_tracks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_stop_cancels_auto_stop() {
        let h = harness();
        h.controller.set_mode(CaptureMode::Live).await.unwrap();
        h.controller.start_recording().await.unwrap();
        assert_eq!(h.controller.state(), SessionState::Recording);
        assert_eq!(h.controller.countdown_remaining(), 8);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(h.controller.countdown_remaining(), 6);

        let artifact = h.controller.stop_recording().await.unwrap();
        assert_eq!(h.controller.state(), SessionState::CameraActive);
        assert_eq!(artifact.clip.data, b"chunk-1chunk-2".to_vec());
        assert!(!artifact.frames.is_empty());

        // Well past the original deadline: still one stop, countdown frozen
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(h.recorders.stop_count(), 1);
        assert_eq!(h.controller.state(), SessionState::CameraActive);
        assert_eq!(h.controller.countdown_remaining(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_stop_after_limit() {
        let h = harness();
        let mut rx = h.controller.subscribe();
        h.controller.set_mode(CaptureMode::Live).await.unwrap();
        h.controller.start_recording().await.unwrap();

        tokio::time::sleep(Duration::from_secs(9)).await;

        assert_eq!(h.controller.state(), SessionState::CameraActive);
        assert_eq!(h.recorders.stop_count(), 1);
        assert_eq!(h.controller.countdown_remaining(), 0);
        assert!(matches!(
            h.controller.selected_clip().await,
            Some(SourceClip::Recorded(_))
        ));

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::RecordingFinished {
                reason: StopReason::Timeout,
                ..
            }
        )));
        assert!(events.contains(&SessionEvent::CountdownTick(0)));

        // A late user stop is rejected, not run twice
        assert!(h.controller.stop_recording().await.is_err());
        assert_eq!(h.recorders.stop_count(), 1);
    }

    #[tokio::test]
    async fn test_recorder_start_failure_keeps_camera_active() {
        let h = harness();
        h.recorders.fail_start("codec not supported");
        h.controller.set_mode(CaptureMode::Live).await.unwrap();

        let err = h.controller.start_recording().await.unwrap_err();

        assert!(matches!(err, SessionError::Recording(RecorderError::Start(_))));
        assert_eq!(h.recorders.created_count(), 1);
        assert_eq!(h.controller.state(), SessionState::CameraActive);
        assert_eq!(h.controller.live_frame_count().await, 0);
    }

    #[tokio::test]
    async fn test_start_recording_requires_camera() {
        let h = harness();
        let err = h.controller.start_recording().await.unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidState {
                action: "start recording",
                state: SessionState::Idle
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_recording_blocked_while_translating() {
        let h = harness();
        h.controller.set_mode(CaptureMode::Live).await.unwrap();

        let claim = h.controller.begin_translation().await.unwrap();
        assert!(h.controller.is_translating());
        assert_eq!(
            h.controller.start_recording().await,
            Err(SessionError::TranslationInProgress)
        );
        assert_eq!(h.recorders.created_count(), 0);
        assert_eq!(h.controller.live_frame_count().await, 0);
        assert_eq!(h.controller.state(), SessionState::CameraActive);

        // Only one claim at a time
        assert!(matches!(
            h.controller.begin_translation().await,
            Err(SessionError::TranslationInProgress)
        ));

        drop(claim);
        assert!(!h.controller.is_translating());
        h.controller.start_recording().await.unwrap();
        assert_eq!(h.controller.state(), SessionState::Recording);

        // And no translation while recording
        assert!(matches!(
            h.controller.begin_translation().await,
            Err(SessionError::InvalidState {
                action: "translate",
                state: SessionState::Recording
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_live_mode_while_recording() {
        let h = harness();
        h.controller.set_mode(CaptureMode::Live).await.unwrap();
        h.controller.start_recording().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        h.controller.set_mode(CaptureMode::Upload).await.unwrap();

        assert_eq!(h.controller.state(), SessionState::Idle);
        assert_eq!(h.camera.active_tracks(), 0);
        assert_eq!(h.recorders.stop_count(), 1);
        assert!(h.controller.selected_clip().await.is_none());

        // The cancelled auto-stop never fires
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(h.recorders.stop_count(), 1);
        assert_eq!(h.controller.state(), SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_camera() {
        let h = harness();
        h.controller.set_mode(CaptureMode::Live).await.unwrap();
        h.controller.start_recording().await.unwrap();
        assert_eq!(h.camera.active_tracks(), 1);

        drop(h.controller);
        assert_eq!(h.camera.active_tracks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detector_persists_across_recordings() {
        let h = harness();
        h.controller.set_mode(CaptureMode::Live).await.unwrap();

        for _ in 0..2 {
            h.controller.start_recording().await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            h.controller.stop_recording().await.unwrap();
        }
        h.controller.set_mode(CaptureMode::Upload).await.unwrap();
        h.controller.set_mode(CaptureMode::Live).await.unwrap();

        assert_eq!(h.detectors.created_count(), 1);
        let detector = h.detectors.last_created().unwrap();
        assert!(!detector.is_closed());

        h.controller.shutdown().await;
        assert!(detector.is_closed());
        assert_eq!(h.camera.active_tracks(), 0);
        assert_eq!(h.controller.state(), SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_sequence_follows_recorded_selection() {
        let h = harness();
        h.controller.set_mode(CaptureMode::Live).await.unwrap();
        assert!(h.controller.live_sequence().await.is_none());

        h.controller.start_recording().await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        h.controller.stop_recording().await.unwrap();

        let frames = h.controller.live_sequence().await.unwrap();
        assert!(!frames.is_empty());
        assert!(h.controller.preview().await.is_some());

        h.controller.set_mode(CaptureMode::Upload).await.unwrap();
        assert!(h.controller.live_sequence().await.is_none());
        assert!(h.controller.preview().await.is_none());
    }

    #[tokio::test]
    async fn test_select_upload_only_in_upload_mode() {
        let h = harness();
        h.controller.select_upload("/tmp/clip.mp4").await.unwrap();
        assert_eq!(
            h.controller.selected_clip().await,
            Some(SourceClip::Uploaded(PathBuf::from("/tmp/clip.mp4")))
        );
        assert_eq!(h.camera.acquire_count(), 0);

        h.controller.set_mode(CaptureMode::Live).await.unwrap();
        assert!(h.controller.selected_clip().await.is_none());
        assert_eq!(
            h.controller.select_upload("/tmp/other.mp4").await,
            Err(SessionError::WrongMode(CaptureMode::Live))
        );
    }

    #[tokio::test]
    async fn test_resume_live_capture_respects_mode() {
        let h = harness();
        h.controller.resume_live_capture().await.unwrap();
        assert_eq!(h.controller.state(), SessionState::Idle);

        h.controller.set_mode(CaptureMode::Live).await.unwrap();
        h.controller.release_camera().await;
        assert_eq!(h.controller.state(), SessionState::Idle);

        h.controller.resume_live_capture().await.unwrap();
        assert_eq!(h.controller.state(), SessionState::CameraActive);
    }
}
