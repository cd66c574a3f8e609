//! Translation orchestrator
//!
//! Runs one translation end to end:
//! 1. Extracting (0-50%): reuse the live landmarks of a just-recorded clip,
//!    or run batch extraction over the selected clip, then normalize
//! 2. Translating (50-100%): post the sequence to the service
//! 3. On success: keep the result, speak it, prepend it to history
//!
//! Whatever happens, the processing flag and stage clear afterwards and a
//! live session returns to an active camera.

use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

use super::types::{
    TranslateError, TranslationProgress, TranslationRequest, TranslationResult,
    TranslationService, TranslationStage,
};
use crate::detector::DetectorFactory;
use crate::extract::{BatchExtractor, VideoSourceFactory};
use crate::history::{History, HistoryEntry, KeyValueStore, Preferences, StoreError};
use crate::landmarks::{normalize, FrameRecord};
use crate::recorder::{CaptureMode, SessionController, SourceClip};
use crate::ui::{
    copy_translation, speak_in_section, stop_speaking, Clipboard, ClipboardError, Locale,
    SectionId, SpeechSynthesizer, TransitionToken, UiStateRegistry,
};
use crate::utils::{AppConfig, DiagnosticLog};

/// Collaborators the orchestrator drives
#[derive(Clone)]
pub struct OrchestratorDeps {
    pub session: Arc<SessionController>,
    pub sources: Arc<dyn VideoSourceFactory>,
    pub detectors: Arc<dyn DetectorFactory>,
    pub service: Arc<dyn TranslationService>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub store: Arc<dyn KeyValueStore>,
}

pub struct TranslationOrchestrator {
    session: Arc<SessionController>,
    sources: Arc<dyn VideoSourceFactory>,
    batch: BatchExtractor,
    service: Arc<dyn TranslationService>,
    speech: Arc<dyn SpeechSynthesizer>,
    ui: Arc<UiStateRegistry>,
    history: History,
    preferences: Preferences,
    log: Arc<DiagnosticLog>,
    method: RwLock<String>,
    live_method: String,
    max_seq_len: usize,
    stage: RwLock<Option<TranslationStage>>,
    last_result: RwLock<Option<TranslationResult>>,
}

impl TranslationOrchestrator {
    pub fn new(deps: OrchestratorDeps, config: &AppConfig) -> Self {
        Self {
            batch: BatchExtractor::new(deps.detectors, config.detector.clone(), &config.pipeline),
            history: History::load(deps.store.clone()),
            preferences: Preferences::load(deps.store),
            session: deps.session,
            sources: deps.sources,
            service: deps.service,
            speech: deps.speech,
            ui: Arc::new(UiStateRegistry::new()),
            log: Arc::new(DiagnosticLog::new()),
            method: RwLock::new(config.method.clone()),
            live_method: config.live_method.clone(),
            max_seq_len: config.pipeline.max_seq_len,
            stage: RwLock::new(None),
            last_result: RwLock::new(None),
        }
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    pub fn log(&self) -> &Arc<DiagnosticLog> {
        &self.log
    }

    pub fn ui(&self) -> &Arc<UiStateRegistry> {
        &self.ui
    }

    pub fn is_processing(&self) -> bool {
        self.session.is_translating()
    }

    pub fn stage(&self) -> Option<TranslationStage> {
        *self.stage.read()
    }

    pub fn last_result(&self) -> Option<TranslationResult> {
        self.last_result.read().clone()
    }

    /// Method sent with uploaded clips
    pub fn method(&self) -> String {
        self.method.read().clone()
    }

    pub fn set_method(&self, method: impl Into<String>) {
        *self.method.write() = method.into();
    }

    pub fn language(&self) -> Locale {
        self.preferences.language()
    }

    pub fn set_language(&self, locale: Locale) -> Result<(), StoreError> {
        self.preferences.set_language(locale)
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.entries()
    }

    pub fn remove_history_entry(&self, id: Uuid) -> Result<bool, StoreError> {
        self.history.remove(id)
    }

    pub fn clear_history(&self) -> Result<(), StoreError> {
        self.history.clear()
    }

    fn set_stage(&self, stage: Option<TranslationStage>) {
        *self.stage.write() = stage;
    }

    /// Translate the selected clip. `on_progress` receives every progress
    /// update.
    pub async fn translate<F>(&self, mut on_progress: F) -> Result<TranslationResult, TranslateError>
    where
        F: FnMut(TranslationProgress) + Send,
    {
        let Some(clip) = self.session.selected_clip().await else {
            self.log.error(TranslateError::NoInput.to_string());
            return Err(TranslateError::NoInput);
        };

        let claim = match self.session.begin_translation().await {
            Ok(claim) => claim,
            Err(e) => {
                tracing::debug!("Translation refused: {}", e);
                self.log.warn(TranslateError::Busy.to_string());
                return Err(TranslateError::Busy);
            }
        };

        let mode = self.session.mode();
        self.log.info("Translation started");

        let outcome = self
            .run(&clip, SectionId::for_mode(mode), &mut on_progress)
            .await;

        drop(claim);
        self.set_stage(None);
        if let Err(e) = &outcome {
            self.log.error(format!("Translation failed: {}", e));
        }

        if mode == CaptureMode::Live {
            if let Err(e) = self.session.resume_live_capture().await {
                self.log.warn(format!("Could not restart the camera: {}", e));
            }
        }

        outcome
    }

    async fn run<F>(
        &self,
        clip: &SourceClip,
        section: SectionId,
        on_progress: &mut F,
    ) -> Result<TranslationResult, TranslateError>
    where
        F: FnMut(TranslationProgress) + Send,
    {
        self.set_stage(Some(TranslationStage::Extracting));
        on_progress(TranslationProgress::new(0, TranslationStage::Extracting));

        let raw = self.extract(clip, on_progress).await?;
        let sequence = normalize(&raw, self.max_seq_len);
        self.log.info(format!(
            "Normalized {} frames to {} ({} padding)",
            raw.len(),
            sequence.len(),
            sequence.pad_count()
        ));

        // Recorded clips always go out with the fixed live method
        let method = if clip.is_recorded() {
            self.live_method.clone()
        } else {
            self.method()
        };

        self.set_stage(Some(TranslationStage::Translating));
        on_progress(TranslationProgress::new(50, TranslationStage::Translating));

        let request = TranslationRequest {
            landmarks: sequence.to_rows(),
            method: method.clone(),
        };
        let result = self.service.translate(&request).await?;

        on_progress(TranslationProgress::new(100, TranslationStage::Translating));
        self.log.info(format!(
            "Translation complete in {}ms: {:?} ({:.0}% confidence)",
            result.round_trip_ms,
            result.translation,
            result.confidence * 100.0
        ));

        *self.last_result.write() = Some(result.clone());
        self.speak_in_background(section, result.translation.clone());
        if let Err(e) = self.history.record(HistoryEntry::new(
            result.translation.clone(),
            result.confidence,
            method,
        )) {
            self.log.warn(format!("Failed to save history: {}", e));
        }

        Ok(result)
    }

    async fn extract<F>(
        &self,
        clip: &SourceClip,
        on_progress: &mut F,
    ) -> Result<Vec<FrameRecord>, TranslateError>
    where
        F: FnMut(TranslationProgress) + Send,
    {
        if clip.is_recorded() {
            if let Some(frames) = self.session.live_sequence().await {
                self.log
                    .info(format!("Using {} landmark frames from live capture", frames.len()));
                on_progress(TranslationProgress::new(50, TranslationStage::Extracting));
                return Ok(frames);
            }
            self.log
                .warn("No live landmarks for this recording, extracting from the clip");
        }

        let mut source = self.sources.open(clip).await?;
        let output = self
            .batch
            .extract_with_progress(source.as_mut(), |done, total| {
                on_progress(TranslationProgress::extracting(done, total));
            })
            .await?;
        for line in output.log {
            self.log.info(line);
        }
        Ok(output.frames)
    }

    fn speak_in_background(&self, section: SectionId, text: String) {
        let ui = self.ui.clone();
        let speech = self.speech.clone();
        let log = self.log.clone();
        let locale = self.preferences.language();

        tokio::spawn(async move {
            if let Err(e) = speak_in_section(&ui, speech.as_ref(), section, &text, locale).await {
                log.warn(format!("Speech failed: {}", e));
            }
        });
    }

    /// Speak the last result again
    pub fn replay_last_result(&self, section: SectionId) -> bool {
        match self.last_result() {
            Some(result) => {
                self.speak_in_background(section, result.translation);
                true
            }
            None => false,
        }
    }

    pub fn stop_speaking(&self) {
        stop_speaking(&self.ui, self.speech.as_ref());
    }

    /// Copy the last translation to the clipboard
    pub fn copy_last_result(
        &self,
        clipboard: &dyn Clipboard,
        section: SectionId,
    ) -> Result<Option<TransitionToken>, ClipboardError> {
        match self.last_result() {
            Some(result) => copy_translation(&self.ui, clipboard, section, &result.translation)
                .map(Some),
            None => Ok(None),
        }
    }
}
