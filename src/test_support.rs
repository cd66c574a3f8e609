//! Hand-written collaborators for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::capture::{
    CameraConstraints, CameraDevice, CameraStream, CaptureError, Resolution, VideoFrame,
};
use crate::detector::{
    DetectedHand, DetectorConfig, DetectorError, DetectorFactory, HandDetectionResult,
    HandDetector, Handedness, Point3, ResultsCallback, LANDMARKS_PER_HAND,
};
use crate::extract::{ExtractionError, VideoMetadata, VideoSource, VideoSourceFactory};
use crate::recorder::{MediaRecorder, RecorderError, RecorderFactory, SourceClip};
use crate::translate::{TranslateError, TranslationRequest, TranslationResult, TranslationService};
use crate::ui::{Clipboard, ClipboardError, Locale, SpeechError, SpeechSynthesizer};

const FRAME_WIDTH: u32 = 64;
const FRAME_HEIGHT: u32 = 48;

fn test_frame() -> VideoFrame {
    VideoFrame::solid(FRAME_WIDTH, FRAME_HEIGHT, [90, 120, 150])
}

/// A hand whose landmarks all sit at `(v, v, v)`
pub fn hand(handedness: Handedness, v: f32) -> DetectedHand {
    DetectedHand::new(handedness, [Point3::splat(v); LANDMARKS_PER_HAND])
}

// =============================================================================
// Detector
// =============================================================================

type SharedCallback = Arc<dyn Fn(HandDetectionResult) + Send + Sync>;

/// Detector answering from a script, then with empty results
#[derive(Default)]
pub struct MockDetector {
    callback: Mutex<Option<SharedCallback>>,
    script: Mutex<VecDeque<HandDetectionResult>>,
    init_failure: Mutex<Option<String>>,
    send_failure: Mutex<Option<String>>,
    latency: Mutex<Duration>,
    silent: AtomicBool,
    closed: AtomicBool,
    sent: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, results: Vec<HandDetectionResult>) {
        *self.script.lock() = results.into();
    }

    /// Accept frames but never call back
    pub fn set_silent(&self, silent: bool) {
        self.silent.store(silent, Ordering::SeqCst);
    }

    pub fn fail_sends(&self, message: &str) {
        *self.send_failure.lock() = Some(message.to_string());
    }

    pub fn clear_send_failure(&self) {
        *self.send_failure.lock() = None;
    }

    pub fn fail_initialize(&self, message: &str) {
        *self.init_failure.lock() = Some(message.to_string());
    }

    /// Delay between `send` and the callback
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HandDetector for MockDetector {
    async fn initialize(&self) -> Result<(), DetectorError> {
        match self.init_failure.lock().clone() {
            Some(message) => Err(DetectorError::Initialization(message)),
            None => Ok(()),
        }
    }

    fn on_results(&self, callback: ResultsCallback) {
        *self.callback.lock() = Some(Arc::from(callback));
    }

    async fn send(&self, _image: &VideoFrame) -> Result<(), DetectorError> {
        if self.is_closed() {
            return Err(DetectorError::Closed);
        }
        if let Some(message) = self.send_failure.lock().clone() {
            return Err(DetectorError::Send(message));
        }
        self.sent.fetch_add(1, Ordering::SeqCst);

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let result = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(HandDetectionResult::empty);
        if !self.silent.load(Ordering::SeqCst) {
            let callback = self.callback.lock().clone();
            if let Some(callback) = callback {
                callback(result);
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), DetectorError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockDetectorFactory {
    script: Mutex<Vec<HandDetectionResult>>,
    init_failure: Mutex<Option<String>>,
    created: Mutex<Vec<Arc<MockDetector>>>,
}

impl MockDetectorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script handed to every detector created from now on
    pub fn script(&self, results: Vec<HandDetectionResult>) {
        *self.script.lock() = results;
    }

    pub fn fail_initialize(&self, message: &str) {
        *self.init_failure.lock() = Some(message.to_string());
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }

    pub fn last_created(&self) -> Option<Arc<MockDetector>> {
        self.created.lock().last().cloned()
    }
}

impl DetectorFactory for MockDetectorFactory {
    fn create(&self, _config: &DetectorConfig) -> Result<Arc<dyn HandDetector>, DetectorError> {
        let detector = Arc::new(MockDetector::new());
        detector.script(self.script.lock().clone());
        if let Some(message) = self.init_failure.lock().as_deref() {
            detector.fail_initialize(message);
        }
        self.created.lock().push(detector.clone());
        Ok(detector)
    }
}

// =============================================================================
// Camera
// =============================================================================

#[derive(Default)]
struct CameraShared {
    active_tracks: AtomicUsize,
    frames_not_ready: AtomicBool,
}

/// Camera handing out single-track streams of a solid test frame
#[derive(Default)]
pub struct MockCamera {
    shared: Arc<CameraShared>,
    denial: Mutex<Option<String>>,
    acquire_delay: Mutex<Duration>,
    acquired: AtomicUsize,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse access with `message`
    pub fn deny(&self, message: &str) {
        *self.denial.lock() = Some(message.to_string());
    }

    pub fn set_acquire_delay(&self, delay: Duration) {
        *self.acquire_delay.lock() = delay;
    }

    /// Whether streams have decodable frame data
    pub fn set_frames_ready(&self, ready: bool) {
        self.shared.frames_not_ready.store(!ready, Ordering::SeqCst);
    }

    pub fn acquire_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Tracks not yet stopped across every stream handed out
    pub fn active_tracks(&self) -> usize {
        self.shared.active_tracks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraDevice for MockCamera {
    async fn acquire(
        &self,
        _constraints: &CameraConstraints,
    ) -> Result<Arc<dyn CameraStream>, CaptureError> {
        let delay = *self.acquire_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.denial.lock().clone() {
            return Err(CaptureError::PermissionDenied(message));
        }

        let n = self.acquired.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.active_tracks.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockStream {
            id: format!("mock-camera-{}", n),
            shared: self.shared.clone(),
            stopped: AtomicBool::new(false),
        }))
    }
}

pub struct MockStream {
    id: String,
    shared: Arc<CameraShared>,
    stopped: AtomicBool,
}

impl CameraStream for MockStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn resolution(&self) -> Resolution {
        Resolution {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
        }
    }

    fn has_current_frame(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst) && !self.shared.frames_not_ready.load(Ordering::SeqCst)
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        self.has_current_frame().then(test_frame)
    }

    fn live_track_count(&self) -> usize {
        if self.stopped.load(Ordering::SeqCst) {
            0
        } else {
            1
        }
    }

    fn stop_all_tracks(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.shared.active_tracks.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

// =============================================================================
// Recorder
// =============================================================================

#[derive(Default)]
struct RecorderShared {
    start_failure: Mutex<Option<String>>,
    stops: AtomicUsize,
}

#[derive(Default)]
pub struct MockRecorderFactory {
    shared: Arc<RecorderShared>,
    created: AtomicUsize,
}

impl MockRecorderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_start(&self, message: &str) {
        *self.shared.start_failure.lock() = Some(message.to_string());
    }

    /// `stop` calls across every recorder created
    pub fn stop_count(&self) -> usize {
        self.shared.stops.load(Ordering::SeqCst)
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl RecorderFactory for MockRecorderFactory {
    fn create(&self, stream: Arc<dyn CameraStream>) -> Result<Box<dyn MediaRecorder>, RecorderError> {
        if stream.live_track_count() == 0 {
            return Err(RecorderError::Create("stream has no live tracks".to_string()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockRecorder {
            shared: self.shared.clone(),
            running: false,
        }))
    }
}

pub struct MockRecorder {
    shared: Arc<RecorderShared>,
    running: bool,
}

#[async_trait]
impl MediaRecorder for MockRecorder {
    fn mime_type(&self) -> &str {
        "video/webm"
    }

    async fn start(&mut self) -> Result<(), RecorderError> {
        if let Some(message) = self.shared.start_failure.lock().clone() {
            return Err(RecorderError::Start(message));
        }
        self.running = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<Vec<Vec<u8>>, RecorderError> {
        self.shared.stops.fetch_add(1, Ordering::SeqCst);
        if !self.running {
            return Err(RecorderError::NotRunning);
        }
        self.running = false;
        Ok(vec![b"chunk-1".to_vec(), b"chunk-2".to_vec()])
    }
}

// =============================================================================
// Video source
// =============================================================================

pub struct MockVideoSource {
    duration_secs: Option<f64>,
    seeks: Vec<f64>,
    fail_after: Option<usize>,
}

impl MockVideoSource {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs: Some(duration_secs),
            seeks: Vec::new(),
            fail_after: None,
        }
    }

    /// Metadata never arrives
    pub fn never_loads() -> Self {
        Self {
            duration_secs: None,
            seeks: Vec::new(),
            fail_after: None,
        }
    }

    /// Fail every seek after the first `n`
    pub fn fail_seek_after(&mut self, n: usize) {
        self.fail_after = Some(n);
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.seeks.clone()
    }
}

#[async_trait]
impl VideoSource for MockVideoSource {
    async fn wait_for_metadata(&mut self) -> Result<VideoMetadata, ExtractionError> {
        match self.duration_secs {
            Some(duration_secs) => Ok(VideoMetadata {
                width: FRAME_WIDTH,
                height: FRAME_HEIGHT,
                duration_secs,
            }),
            None => std::future::pending().await,
        }
    }

    async fn seek(&mut self, timestamp_secs: f64) -> Result<(), ExtractionError> {
        if self.fail_after.is_some_and(|n| self.seeks.len() >= n) {
            return Err(ExtractionError::Seek {
                timestamp_secs,
                message: "decoder error".to_string(),
            });
        }
        self.seeks.push(timestamp_secs);
        Ok(())
    }

    fn snapshot(&self) -> Result<VideoFrame, ExtractionError> {
        Ok(test_frame())
    }
}

/// Opens a fixed-length `MockVideoSource` for any clip
pub struct MockSourceFactory {
    duration_secs: f64,
    opened: Mutex<Vec<SourceClip>>,
}

impl MockSourceFactory {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn opened_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn opened_paths(&self) -> Vec<PathBuf> {
        self.opened
            .lock()
            .iter()
            .filter_map(|clip| match clip {
                SourceClip::Uploaded(path) => Some(path.clone()),
                SourceClip::Recorded(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl VideoSourceFactory for MockSourceFactory {
    async fn open(&self, clip: &SourceClip) -> Result<Box<dyn VideoSource>, ExtractionError> {
        self.opened.lock().push(clip.clone());
        Ok(Box::new(MockVideoSource::new(self.duration_secs)))
    }
}

// =============================================================================
// Translation service
// =============================================================================

#[derive(Default)]
pub struct MockTranslationService {
    requests: Mutex<Vec<TranslationRequest>>,
    failure: Mutex<Option<(u16, String)>>,
    latency: Mutex<Duration>,
}

impl MockTranslationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with a service error
    pub fn fail(&self, status: u16, message: &str) {
        *self.failure.lock() = Some((status, message.to_string()));
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    pub fn requests(&self) -> Vec<TranslationRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl TranslationService for MockTranslationService {
    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, TranslateError> {
        self.requests.lock().push(request.clone());

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let Some((status, message)) = self.failure.lock().clone() {
            return Err(TranslateError::Service { status, message });
        }
        Ok(TranslationResult {
            gloss: "HELLO".to_string(),
            translation: "Hello".to_string(),
            confidence: 0.9,
            round_trip_ms: latency.as_millis() as u64,
            server_ms: Some(5.0),
            landmarks_shape: vec![request.landmarks.len(), 126],
        })
    }
}

// =============================================================================
// Speech and clipboard
// =============================================================================

#[derive(Default)]
pub struct MockSpeech {
    spoken: Mutex<Vec<(String, Locale)>>,
    duration: Mutex<Duration>,
    failure: Mutex<Option<String>>,
    cancels: AtomicUsize,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long each utterance takes
    pub fn set_duration(&self, duration: Duration) {
        *self.duration.lock() = duration;
    }

    pub fn fail(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    pub fn spoken(&self) -> Vec<(String, Locale)> {
        self.spoken.lock().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    async fn speak(&self, text: &str, locale: Locale) -> Result<(), SpeechError> {
        if let Some(message) = self.failure.lock().clone() {
            return Err(SpeechError::Unavailable(message));
        }
        self.spoken.lock().push((text.to_string(), locale));

        let duration = *self.duration.lock();
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockClipboard {
    contents: Mutex<Option<String>>,
    failure: Mutex<Option<String>>,
}

impl MockClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl Clipboard for MockClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if let Some(message) = self.failure.lock().clone() {
            return Err(ClipboardError(message));
        }
        *self.contents.lock() = Some(text.to_string());
        Ok(())
    }
}
