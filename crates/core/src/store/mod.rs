//! Key-value persistence for calculator settings.

/// File-backed key-value storage.
pub mod file;
/// In-memory key-value storage.
pub mod memory;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::models::Settings;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "inputs";

/// Minimal string key-value interface the settings store persists through.
pub trait KeyValueStorage {
    /// Return the value stored under `key`, or `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Loads and saves the whole [`Settings`] record under a single key.
pub struct SettingsStore<S> {
    storage: S,
    key: String,
}

impl<S: KeyValueStorage> SettingsStore<S> {
    /// Create a store writing under [`DEFAULT_STORAGE_KEY`].
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    /// Create a store writing under a custom key.
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Key the record is persisted under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Borrow the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load the persisted record, falling back to defaults when it is
    /// missing or cannot be read or parsed.
    pub fn load(&self) -> Settings {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "No stored settings; using defaults");
                return Settings::default();
            }
            Err(err) => {
                warn!(key = %self.key, "Failed to read stored settings: {err:#}");
                return Settings::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(key = %self.key, "Stored settings are unreadable, using defaults: {err}");
                Settings::default()
            }
        }
    }

    /// Serialize the full record and overwrite the stored value.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let serialised =
            serde_json::to_string(settings).context("failed to serialize settings")?;
        self.storage
            .set(&self.key, &serialised)
            .with_context(|| format!("failed to store settings under {:?}", self.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("disk on fire"))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("disk on fire"))
        }
    }

    #[test]
    fn load_without_record_returns_defaults() {
        let store = SettingsStore::new(MemoryStorage::default());
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn save_then_load_round_trips() -> Result<()> {
        let store = SettingsStore::new(MemoryStorage::default());
        let settings = Settings {
            target_quantity: 250.5,
            ratio_a: 3.0,
            ratio_b: 0.0,
            debug_enabled: true,
            ..Settings::default()
        };
        store.save(&settings)?;
        assert_eq!(store.load(), settings);
        Ok(())
    }

    #[test]
    fn save_overwrites_previous_record() -> Result<()> {
        let store = SettingsStore::new(MemoryStorage::default());
        store.save(&Settings {
            ratio_a: 1.0,
            ..Settings::default()
        })?;
        store.save(&Settings {
            ratio_a: 2.0,
            ..Settings::default()
        })?;
        assert_eq!(store.load().ratio_a, 2.0);
        Ok(())
    }

    #[test]
    fn unparsable_record_falls_back_to_defaults() -> Result<()> {
        let storage = MemoryStorage::default();
        storage.set(DEFAULT_STORAGE_KEY, "{not json")?;
        let store = SettingsStore::new(&storage);
        assert_eq!(store.load(), Settings::default());
        Ok(())
    }

    #[test]
    fn incomplete_record_is_defaulted_as_a_whole() -> Result<()> {
        let storage = MemoryStorage::default();
        storage.set(DEFAULT_STORAGE_KEY, r#"{"targetQuantity": 99}"#)?;
        let store = SettingsStore::new(&storage);
        assert_eq!(store.load(), Settings::default());
        Ok(())
    }

    #[test]
    fn extra_keys_are_ignored() -> Result<()> {
        let storage = MemoryStorage::default();
        let mut value = serde_json::to_value(Settings::default())?;
        value["legacy"] = serde_json::json!("x");
        value["ratioA"] = serde_json::json!(12);
        storage.set(DEFAULT_STORAGE_KEY, &value.to_string())?;
        let store = SettingsStore::new(&storage);
        assert_eq!(store.load().ratio_a, 12.0);
        Ok(())
    }

    #[test]
    fn read_errors_fail_soft_and_write_errors_surface() {
        let store = SettingsStore::new(BrokenStorage);
        assert_eq!(store.load(), Settings::default());
        assert!(store.save(&Settings::default()).is_err());
    }

    #[test]
    fn custom_key_is_used() -> Result<()> {
        let storage = MemoryStorage::default();
        let store = SettingsStore::with_key(&storage, "other");
        store.save(&Settings::default())?;
        assert!(storage.get(DEFAULT_STORAGE_KEY)?.is_none());
        assert!(storage.get("other")?.is_some());
        Ok(())
    }
}
