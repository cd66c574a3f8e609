//! Shared utilities: configuration, errors, diagnostic log

pub mod config;
pub mod diagnostics;
pub mod error;

pub use config::{AppConfig, PipelineConfig};
pub use diagnostics::{DiagnosticLog, LogEntry, LogLevel};
pub use error::{AppError, AppResult, ErrorResponse};
