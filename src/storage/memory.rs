//! In-memory storage

use rustc_hash::FxHashMap;

use crate::storage::{KeyValueStore, StorageError};

/// Hash map backed store, optionally limited to a byte quota like browser storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: FxHashMap<String, Vec<u8>>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Create an empty, unlimited store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store holding at most `quota` bytes of keys and values.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            quota: Some(quota),
        }
    }

    /// Bytes used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if a value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let replaced = self
                .entries
                .get(key)
                .map_or(0, |existing| key.len() + existing.len());
            let needed = self.used_bytes() - replaced + key.len() + value.len();

            if needed > quota {
                return Err(StorageError::Rejected(format!(
                    "quota of {quota} bytes exceeded ({needed} bytes needed)"
                )));
            }
        }

        self.entries.insert(key.to_string(), value.to_vec());

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn set_get_remove() -> TestResult {
        let mut store = MemoryStore::new();

        assert_eq!(store.get("a")?, None);

        store.set("a", b"one")?;
        assert_eq!(store.get("a")?, Some(b"one".to_vec()));

        store.remove("a")?;
        store.remove("a")?;
        assert!(store.is_empty());

        Ok(())
    }

    #[test]
    fn quota_rejects_oversized_writes() -> TestResult {
        let mut store = MemoryStore::with_quota(8);

        store.set("k", b"1234")?;

        let result = store.set("j", b"1234");
        assert!(matches!(result, Err(StorageError::Rejected(_))));
        assert!(!store.contains_key("j"));

        // Overwriting an existing key only counts the difference.
        store.set("k", b"123456")?;
        assert_eq!(store.used_bytes(), 7);

        Ok(())
    }
}
