//! File storage

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::storage::{KeyValueStore, StorageError};

/// Directory backed store with one file per key.
///
/// Keys must be non-empty and consist of ASCII alphanumerics, `_`, `-` and
/// `.` (not starting with `.`). Values are written to a temporary sibling
/// file first and renamed into place.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();

        fs::create_dir_all(&root)?;

        Ok(Self { root })
    }

    /// Directory holding the store's files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

        if valid {
            Ok(self.root.join(key))
        } else {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let staging = self.root.join(format!(".{key}.tmp"));

        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn round_trips_values_through_files() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path().join("carts"))?;

        assert_eq!(store.get("cart_alice")?, None);

        store.set("cart_alice", b"[]")?;
        assert_eq!(store.get("cart_alice")?, Some(b"[]".to_vec()));
        assert!(store.root().join("cart_alice").exists());

        let reopened = FileStore::open(store.root())?;
        assert_eq!(reopened.get("cart_alice")?, Some(b"[]".to_vec()));

        store.remove("cart_alice")?;
        store.remove("cart_alice")?;
        assert_eq!(store.get("cart_alice")?, None);

        Ok(())
    }

    #[test]
    fn rejects_keys_that_escape_the_root() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path())?;

        for key in ["", "../cart", "a/b", ".hidden", "cart guest"] {
            let result = store.set(key, b"x");
            assert!(
                matches!(result, Err(StorageError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }

        Ok(())
    }
}
