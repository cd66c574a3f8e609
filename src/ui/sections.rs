//! Per-section UI state
//!
//! Each result panel has a speaking flag and a copied flag. Only one section
//! speaks at a time: starting speech in one section clears the others.
//! Transitions carry a token so a late completion from an earlier request
//! cannot clear the flag of a newer one.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::recorder::CaptureMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Live,
    Upload,
}

impl SectionId {
    pub const ALL: [SectionId; 2] = [SectionId::Live, SectionId::Upload];

    pub fn for_mode(mode: CaptureMode) -> Self {
        match mode {
            CaptureMode::Live => SectionId::Live,
            CaptureMode::Upload => SectionId::Upload,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionState {
    pub speaking: bool,
    pub copied: bool,
}

#[derive(Debug, Default)]
struct SectionRecord {
    state: SectionState,
    speech_token: u64,
    copy_token: u64,
}

/// Token identifying one speech or copy request
pub type TransitionToken = u64;

#[derive(Debug, Default)]
pub struct UiStateRegistry {
    sections: RwLock<HashMap<SectionId, SectionRecord>>,
    next_token: AtomicU64,
}

impl UiStateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn token(&self) -> TransitionToken {
        self.next_token.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn state(&self, section: SectionId) -> SectionState {
        self.sections
            .read()
            .get(&section)
            .map(|record| record.state)
            .unwrap_or_default()
    }

    /// Section currently speaking, if any
    pub fn speaking_section(&self) -> Option<SectionId> {
        self.sections
            .read()
            .iter()
            .find(|(_, record)| record.state.speaking)
            .map(|(id, _)| *id)
    }

    /// Mark `section` speaking and every other section silent
    pub fn begin_speaking(&self, section: SectionId) -> TransitionToken {
        let token = self.token();
        let mut sections = self.sections.write();
        for (id, record) in sections.iter_mut() {
            if *id != section {
                record.state.speaking = false;
            }
        }
        let record = sections.entry(section).or_default();
        record.state.speaking = true;
        record.speech_token = token;
        token
    }

    /// Clear the speaking flag if `token` is still the current request.
    /// Returns whether anything changed.
    pub fn finish_speaking(&self, section: SectionId, token: TransitionToken) -> bool {
        let mut sections = self.sections.write();
        match sections.get_mut(&section) {
            Some(record) if record.speech_token == token && record.state.speaking => {
                record.state.speaking = false;
                true
            }
            _ => false,
        }
    }

    /// Silence every section
    pub fn stop_all_speaking(&self) {
        for record in self.sections.write().values_mut() {
            record.state.speaking = false;
        }
    }

    pub fn mark_copied(&self, section: SectionId) -> TransitionToken {
        let token = self.token();
        let mut sections = self.sections.write();
        let record = sections.entry(section).or_default();
        record.state.copied = true;
        record.copy_token = token;
        token
    }

    pub fn clear_copied(&self, section: SectionId, token: TransitionToken) -> bool {
        let mut sections = self.sections.write();
        match sections.get_mut(&section) {
            Some(record) if record.copy_token == token && record.state.copied => {
                record.state.copied = false;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&self, section: SectionId) {
        self.sections.write().remove(&section);
    }
}
