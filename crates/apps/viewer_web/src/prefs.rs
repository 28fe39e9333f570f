use catalog::{CatalogError, InMemoryPreferenceStore, LocalStoragePreferenceStore, PreferenceStore};
use tracing::warn;

/// `localStorage` when the browser allows it, otherwise a per-session map.
#[derive(Debug)]
pub enum BrowserPrefs {
    Local(LocalStoragePreferenceStore),
    Session(InMemoryPreferenceStore),
}

impl BrowserPrefs {
    pub fn open() -> Self {
        match LocalStoragePreferenceStore::new() {
            Ok(store) => Self::Local(store),
            Err(err) => {
                warn!(%err, "localStorage unavailable, preferences last for this session only");
                Self::Session(InMemoryPreferenceStore::new())
            }
        }
    }

    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl PreferenceStore for BrowserPrefs {
    fn get(&self, key: &str) -> Result<Option<String>, CatalogError> {
        match self {
            Self::Local(s) => s.get(key),
            Self::Session(s) => s.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CatalogError> {
        match self {
            Self::Local(s) => s.set(key, value),
            Self::Session(s) => s.set(key, value),
        }
    }
}
