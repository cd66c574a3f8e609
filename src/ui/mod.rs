//! Front-end facing state
//!
//! Section flags, locales and the speech/clipboard boundaries.

pub mod locale;
pub mod sections;
pub mod speech;

pub use locale::{lookup, Locale, MessageKey};
pub use sections::{SectionId, SectionState, TransitionToken, UiStateRegistry};
pub use speech::{
    copy_translation, speak_in_section, stop_speaking, Clipboard, ClipboardError, SpeechError,
    SpeechSynthesizer, COPIED_RESET,
};
