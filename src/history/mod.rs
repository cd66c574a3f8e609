//! Persisted state
//!
//! Translation history and the preferred language, stored as key-value
//! entries.

pub mod entries;
pub mod preferences;
pub mod store;

pub use entries::{History, HistoryEntry, HISTORY_KEY, HISTORY_LIMIT};
pub use preferences::{Preferences, LANGUAGE_KEY};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
