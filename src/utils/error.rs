//! Error types and handling
//!
//! Application-wide error wrapping the subsystem errors, plus the flat
//! response shape handed to front ends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::CaptureError;
use crate::detector::DetectorError;
use crate::extract::ExtractionError;
use crate::history::StoreError;
use crate::recorder::{RecorderError, SessionError};
use crate::translate::TranslateError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Detector(#[from] DetectorError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Translation(#[from] TranslateError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error response for frontend
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Capture(CaptureError::PermissionDenied(_)) => "PERMISSION_DENIED",
            AppError::Capture(_) => "CAPTURE_ERROR",
            AppError::Detector(_) => "DETECTOR_ERROR",
            AppError::Extraction(_) => "EXTRACTION_ERROR",
            AppError::Recorder(_) => "RECORDING_ERROR",
            AppError::Session(_) => "SESSION_ERROR",
            AppError::Translation(TranslateError::NoInput) => "NO_INPUT",
            AppError::Translation(_) => "TRANSLATION_ERROR",
            AppError::Store(_) => "STORE_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
