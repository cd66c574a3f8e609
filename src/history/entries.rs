//! Translation history
//!
//! Most-recent-first list of finished translations, capped and persisted
//! through a `KeyValueStore` after every change.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::store::{KeyValueStore, StoreError};

/// Maximum number of entries kept
pub const HISTORY_LIMIT: usize = 10;

/// Store key of the serialized list
pub const HISTORY_KEY: &str = "history";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub time: DateTime<Utc>,
    pub translation: String,
    pub confidence: f64,
    pub method: String,
}

impl HistoryEntry {
    pub fn new(translation: impl Into<String>, confidence: f64, method: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            time: Utc::now(),
            translation: translation.into(),
            confidence,
            method: method.into(),
        }
    }
}

pub struct History {
    store: Arc<dyn KeyValueStore>,
    entries: RwLock<Vec<HistoryEntry>>,
}

impl History {
    /// Load persisted entries. Unreadable data starts an empty history.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let entries = match Self::read(store.as_ref()) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Discarding unreadable history: {}", e);
                Vec::new()
            }
        };

        Self {
            store,
            entries: RwLock::new(entries),
        }
    }

    fn read(store: &dyn KeyValueStore) -> Result<Vec<HistoryEntry>, StoreError> {
        let Some(raw) = store.get(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        let mut entries: Vec<HistoryEntry> = serde_json::from_str(&raw)?;
        entries.truncate(HISTORY_LIMIT);
        Ok(entries)
    }

    fn persist(&self, entries: &[HistoryEntry]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(entries)?;
        self.store.set(HISTORY_KEY, raw)
    }

    /// Prepend an entry, dropping the oldest beyond the limit
    pub fn record(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        entries.insert(0, entry);
        entries.truncate(HISTORY_LIMIT);
        self.persist(&entries)
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove one entry. Returns whether it existed.
    pub fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.persist(&entries)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.entries.write().clear();
        self.store.remove(HISTORY_KEY)
    }
}
