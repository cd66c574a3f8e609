//! User preferences

use parking_lot::RwLock;
use std::sync::Arc;

use super::store::{KeyValueStore, StoreError};
use crate::ui::Locale;

/// Store key of the preferred language code
pub const LANGUAGE_KEY: &str = "language";

pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    language: RwLock<Locale>,
}

impl Preferences {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let language = match store.get(LANGUAGE_KEY) {
            Ok(Some(code)) => Locale::from_code(&code),
            Ok(None) => Locale::default(),
            Err(e) => {
                tracing::warn!("Failed to read language preference: {}", e);
                Locale::default()
            }
        };

        Self {
            store,
            language: RwLock::new(language),
        }
    }

    pub fn language(&self) -> Locale {
        *self.language.read()
    }

    pub fn set_language(&self, locale: Locale) -> Result<(), StoreError> {
        *self.language.write() = locale;
        self.store.set(LANGUAGE_KEY, locale.code().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryStore;

    #[test]
    fn test_language_round_trips_through_store() {
        let store = Arc::new(MemoryStore::new());
        let prefs = Preferences::load(store.clone());
        assert_eq!(prefs.language(), Locale::En);

        prefs.set_language(Locale::Ar).unwrap();
        assert_eq!(store.get(LANGUAGE_KEY).unwrap().as_deref(), Some("ar"));
        assert_eq!(Preferences::load(store).language(), Locale::Ar);
    }

    #[test]
    fn test_unknown_code_falls_back() {
        let store = Arc::new(MemoryStore::new());
        store.set(LANGUAGE_KEY, "xx".to_string()).unwrap();
        assert_eq!(Preferences::load(store).language(), Locale::En);
    }
}
