use std::collections::BTreeMap;

use crate::CatalogError;

/// Storage key of the empty base layer's background colour.
pub const BACKGROUND_COLOR_KEY: &str = "emptyLayerBgColor";

/// Durable key/value preferences. The app keeps exactly one entry
/// ([`BACKGROUND_COLOR_KEY`]); there is no schema versioning.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, CatalogError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), CatalogError>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryPreferenceStore {
    values: BTreeMap<String, String>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.values.insert(key.to_string(), value.to_string());
        store
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, CatalogError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CatalogError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::PreferenceStore;
    use crate::CatalogError;

    /// `window.localStorage`-backed preferences.
    #[derive(Debug, Default)]
    pub struct LocalStoragePreferenceStore;

    impl LocalStoragePreferenceStore {
        pub fn new() -> Result<Self, CatalogError> {
            // Fail early when storage is disabled (private mode, sandboxed iframe).
            window_local_storage()?;
            Ok(Self)
        }
    }

    impl PreferenceStore for LocalStoragePreferenceStore {
        fn get(&self, key: &str) -> Result<Option<String>, CatalogError> {
            let storage = window_local_storage()?;
            storage
                .get_item(key)
                .map_err(|e| CatalogError::Io(format!("get_item({key}) failed: {:?}", e)))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), CatalogError> {
            let storage = window_local_storage()?;
            storage
                .set_item(key, value)
                .map_err(|e| CatalogError::Io(format!("set_item({key}) failed: {:?}", e)))
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, CatalogError> {
        let win = web_sys::window().ok_or(CatalogError::StorageUnavailable)?;
        win.local_storage()
            .map_err(|e| CatalogError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(CatalogError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStoragePreferenceStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStoragePreferenceStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStoragePreferenceStore {
    pub fn new() -> Result<Self, CatalogError> {
        Err(CatalogError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PreferenceStore for LocalStoragePreferenceStore {
    fn get(&self, _key: &str) -> Result<Option<String>, CatalogError> {
        Err(CatalogError::StorageUnavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), CatalogError> {
        Err(CatalogError::StorageUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::{BACKGROUND_COLOR_KEY, InMemoryPreferenceStore, LocalStoragePreferenceStore, PreferenceStore};
    use crate::CatalogError;

    #[test]
    fn in_memory_store_overwrites() {
        let mut s = InMemoryPreferenceStore::new();
        assert_eq!(s.get(BACKGROUND_COLOR_KEY).unwrap(), None);
        s.set(BACKGROUND_COLOR_KEY, "#ffffff").unwrap();
        s.set(BACKGROUND_COLOR_KEY, "#112233").unwrap();
        assert_eq!(s.get(BACKGROUND_COLOR_KEY).unwrap().as_deref(), Some("#112233"));
    }

    #[test]
    fn local_storage_is_unavailable_off_wasm() {
        assert!(matches!(
            LocalStoragePreferenceStore::new(),
            Err(CatalogError::StorageUnavailable)
        ));
    }
}
