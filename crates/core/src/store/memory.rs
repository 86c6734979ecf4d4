use std::collections::HashMap;

use anyhow::Result;
use parking_lot::Mutex;

use super::KeyValueStorage;

/// Process-local storage, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Remove every stored value.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_clears_values() -> Result<()> {
        let storage = MemoryStorage::default();
        assert_eq!(storage.get("a")?, None);
        storage.set("a", "1")?;
        storage.set("a", "2")?;
        assert_eq!(storage.get("a")?.as_deref(), Some("2"));
        storage.clear();
        assert_eq!(storage.get("a")?, None);
        Ok(())
    }
}
