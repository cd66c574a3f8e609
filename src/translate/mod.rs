//! Translation
//!
//! The remote translation service boundary and the orchestrator that turns a
//! selected clip into a spoken, recorded translation.

pub mod client;
pub mod orchestrator;
pub mod types;

pub use client::{classify_failure, parse_success, HttpTranslationService, ERROR_BODY_LIMIT};
pub use orchestrator::{OrchestratorDeps, TranslationOrchestrator};
pub use types::{
    TranslateError, TranslationProgress, TranslationRequest, TranslationResult,
    TranslationService, TranslationStage,
};
