//! Translation types
//!
//! Request/response shapes of the translation service, progress reporting
//! and the error taxonomy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::ExtractionError;

/// Translation errors
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("No video selected. Record or upload a clip first.")]
    NoInput,

    #[error("A translation is already in progress")]
    Busy,

    #[error("Landmark extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Non-2xx response
    #[error("{message}")]
    Service { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed service response: {0}")]
    Malformed(String),
}

/// Body posted to the translation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// One 126-wide row per frame
    pub landmarks: Vec<Vec<f32>>,
    pub method: String,
}

/// A successful translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub gloss: String,
    pub translation: String,
    /// Overall confidence in `[0, 1]`
    pub confidence: f64,
    /// Measured client-side
    pub round_trip_ms: u64,
    /// Reported by the service, if present
    pub server_ms: Option<f64>,
    pub landmarks_shape: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TranslationStage {
    Extracting,
    Translating,
}

impl TranslationStage {
    pub fn label(&self) -> &'static str {
        match self {
            TranslationStage::Extracting => "Extracting landmarks",
            TranslationStage::Translating => "Translating",
        }
    }
}

/// Progress of one translation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationProgress {
    /// 0-50 while extracting, 50-100 while translating
    pub percent: u8,
    pub stage: TranslationStage,
}

impl TranslationProgress {
    pub fn new(percent: u8, stage: TranslationStage) -> Self {
        Self {
            percent: percent.min(100),
            stage,
        }
    }

    /// Extraction progress mapped onto 0-50
    pub fn extracting(done: usize, total: usize) -> Self {
        let percent = if total == 0 { 50 } else { done.min(total) * 50 / total };
        Self::new(percent as u8, TranslationStage::Extracting)
    }
}

/// Remote translator
#[async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, TranslateError>;
}
