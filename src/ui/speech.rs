//! Speech output and clipboard
//!
//! Platform text-to-speech and clipboard access sit behind traits; the
//! helpers here keep the per-section flags in step with them.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::locale::Locale;
use super::sections::{SectionId, TransitionToken, UiStateRegistry};

/// How long the copied indicator stays on
pub const COPIED_RESET: Duration = Duration::from_secs(2);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpeechError {
    #[error("Speech synthesis unavailable: {0}")]
    Unavailable(String),

    #[error("Speech interrupted")]
    Interrupted,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text`, resolving when the utterance ends
    async fn speak(&self, text: &str, locale: Locale) -> Result<(), SpeechError>;

    /// Stop any utterance in progress
    fn cancel(&self);
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Speak `text` for `section`, interrupting whatever else is speaking
pub async fn speak_in_section(
    ui: &UiStateRegistry,
    speech: &dyn SpeechSynthesizer,
    section: SectionId,
    text: &str,
    locale: Locale,
) -> Result<(), SpeechError> {
    if text.trim().is_empty() {
        return Ok(());
    }

    speech.cancel();
    let token = ui.begin_speaking(section);
    tracing::debug!("Speaking {} chars in {:?} ({})", text.len(), section, locale.code());

    let result = speech.speak(text, locale).await;
    ui.finish_speaking(section, token);
    result
}

/// Stop speech everywhere
pub fn stop_speaking(ui: &UiStateRegistry, speech: &dyn SpeechSynthesizer) {
    speech.cancel();
    ui.stop_all_speaking();
}

/// Copy `text` and show the copied indicator for `COPIED_RESET`
pub fn copy_translation(
    ui: &Arc<UiStateRegistry>,
    clipboard: &dyn Clipboard,
    section: SectionId,
    text: &str,
) -> Result<TransitionToken, ClipboardError> {
    clipboard.write_text(text)?;
    let token = ui.mark_copied(section);

    let ui = ui.clone();
    tokio::spawn(async move {
        tokio::time::sleep(COPIED_RESET).await;
        ui.clear_copied(section, token);
    });
    Ok(token)
}
