//! Live landmark extraction
//!
//! Samples the camera on a fixed timer while recording. Each tick submits the
//! current frame without waiting for the previous detection, so submissions
//! can overlap and results arrive whenever the detector delivers them. The
//! accumulator therefore holds roughly, not exactly, one frame per tick.
//!
//! Results are matched to submissions in submission order. A result whose
//! submission belongs to an earlier recording is dropped, so a detection
//! still in flight at `start` never lands in the next clip.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::capture::{CameraStream, FrameCanvas};
use crate::detector::HandDetector;
use crate::landmarks::{encode, FrameRecord};
use crate::utils::PipelineConfig;

#[derive(Debug, Default)]
struct LiveCounters {
    ticks: AtomicU64,
    submitted: AtomicU64,
    skipped: AtomicU64,
}

/// Submissions still waiting for a result, oldest first
#[derive(Debug, Default)]
struct Pending {
    next_seq: u64,
    /// (submission sequence number, recording generation)
    queue: VecDeque<(u64, u64)>,
}

impl Pending {
    fn push(&mut self, generation: u64) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push_back((seq, generation));
        seq
    }

    /// Once `send` resolves its result has either arrived or never will
    fn forget(&mut self, seq: u64) {
        self.queue.retain(|&(s, _)| s != seq);
    }
}

pub struct LiveExtractor {
    detector: Arc<dyn HandDetector>,
    accumulator: Arc<Mutex<Vec<FrameRecord>>>,
    generation: Arc<AtomicU64>,
    pending: Arc<Mutex<Pending>>,
    canvas: FrameCanvas,
    period: Duration,
    counters: Arc<LiveCounters>,
    ticker: Option<JoinHandle<()>>,
}

impl LiveExtractor {
    /// Attach to an initialized detector. The extractor owns the detector's
    /// results callback from here on.
    pub fn new(
        detector: Arc<dyn HandDetector>,
        canvas: FrameCanvas,
        pipeline: &PipelineConfig,
    ) -> Self {
        let accumulator = Arc::new(Mutex::new(Vec::new()));
        let generation = Arc::new(AtomicU64::new(0));
        let pending = Arc::new(Mutex::new(Pending::default()));

        let sink = accumulator.clone();
        let current = generation.clone();
        let submissions = pending.clone();
        detector.on_results(Box::new(move |result| {
            let submitted_in = submissions.lock().queue.pop_front().map(|(_, g)| g);
            // Generation is bumped under the accumulator lock in `start`
            let mut frames = sink.lock();
            let current = current.load(Ordering::SeqCst);
            match submitted_in {
                Some(g) if g != current => {
                    tracing::debug!("Dropped late detection from recording {}", g);
                }
                _ => frames.push(encode(&result)),
            }
        }));

        Self {
            detector,
            accumulator,
            generation,
            pending,
            canvas,
            period: Duration::from_millis(pipeline.sample_period_ms()),
            counters: Arc::new(LiveCounters::default()),
            ticker: None,
        }
    }

    pub fn detector(&self) -> &Arc<dyn HandDetector> {
        &self.detector
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_active(&self) -> bool {
        self.ticker.is_some()
    }

    /// Clear the accumulator and begin sampling `stream`
    pub fn start(&mut self, stream: Arc<dyn CameraStream>) {
        self.stop();
        let generation = {
            let mut frames = self.accumulator.lock();
            frames.clear();
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };
        self.counters.ticks.store(0, Ordering::Relaxed);
        self.counters.submitted.store(0, Ordering::Relaxed);
        self.counters.skipped.store(0, Ordering::Relaxed);

        let detector = self.detector.clone();
        let pending = self.pending.clone();
        let canvas = self.canvas;
        let counters = self.counters.clone();
        let period = self.period;

        tracing::info!(
            "Live extraction started on {} every {}ms",
            stream.id(),
            period.as_millis()
        );

        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                counters.ticks.fetch_add(1, Ordering::Relaxed);

                let frame = match stream.current_frame() {
                    Some(frame) if stream.has_current_frame() => frame,
                    _ => {
                        counters.skipped.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                };

                let image = match canvas.draw(&frame) {
                    Ok(image) => image,
                    Err(e) => {
                        tracing::debug!("Skipping live frame: {}", e);
                        counters.skipped.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                };

                // Fire and forget: the next tick does not wait for this one
                counters.submitted.fetch_add(1, Ordering::Relaxed);
                let seq = pending.lock().push(generation);
                let detector = detector.clone();
                let pending = pending.clone();
                tokio::spawn(async move {
                    let sent = detector.send(&image).await;
                    pending.lock().forget(seq);
                    if let Err(e) = sent {
                        tracing::warn!("Live detection failed: {}", e);
                    }
                });
            }
        }));
    }

    /// Stop the timer. A detection already in flight may still append.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            tracing::info!(
                "Live extraction stopped: {} ticks, {} submitted, {} frames",
                self.counters.ticks.load(Ordering::Relaxed),
                self.counters.submitted.load(Ordering::Relaxed),
                self.frame_count()
            );
        }
    }

    /// Drop accumulated frames without touching the timer
    pub fn reset(&mut self) {
        self.accumulator.lock().clear();
    }

    /// Frames accumulated so far
    pub fn frame_count(&self) -> usize {
        self.accumulator.lock().len()
    }

    pub fn tick_count(&self) -> u64 {
        self.counters.ticks.load(Ordering::Relaxed)
    }

    pub fn submitted_count(&self) -> u64 {
        self.counters.submitted.load(Ordering::Relaxed)
    }

    /// Copy of the accumulator in arrival order
    pub fn frames(&self) -> Vec<FrameRecord> {
        self.accumulator.lock().clone()
    }
}

impl Drop for LiveExtractor {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}
