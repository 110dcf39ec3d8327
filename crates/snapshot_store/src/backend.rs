use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::SnapshotStoreError;

/// Key/value storage holding whole string documents.
pub trait StorageBackend: Send {
    fn get_item(&self, key: &str) -> Result<Option<String>, SnapshotStoreError>;

    /// Replaces the value stored under `key` in one step.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SnapshotStoreError>;
}

/// Stores each key as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, SnapshotStoreError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!(".{key}.json.tmp"))
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SnapshotStoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(SnapshotStoreError::io("reading snapshot", path, error)),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SnapshotStoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(|source| {
            SnapshotStoreError::io("creating storage directory", &self.root, source)
        })?;

        let temp_path = self.temp_path_for(key);
        fs::write(&temp_path, value)
            .map_err(|source| SnapshotStoreError::io("writing snapshot", &temp_path, source))?;
        fs::rename(&temp_path, &path)
            .map_err(|source| SnapshotStoreError::io("replacing snapshot", &path, source))
    }
}

fn validate_key(key: &str) -> Result<(), SnapshotStoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(SnapshotStoreError::InvalidKey {
            key: key.to_string(),
        })
    }
}

/// In-process storage. Clones share the same items, which lets a test play the part
/// of a page reload by building a second store over the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw value, bypassing serialization.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        lock_unpoisoned(&self.items).insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<String> {
        lock_unpoisoned(&self.items).get(key).cloned()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SnapshotStoreError> {
        Ok(self.get_raw(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SnapshotStoreError> {
        self.insert_raw(key, value);
        Ok(())
    }
}

/// Storage for contexts without durable storage: every access fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStorage;

impl StorageBackend for UnavailableStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, SnapshotStoreError> {
        Err(SnapshotStoreError::Unavailable)
    }

    fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), SnapshotStoreError> {
        Err(SnapshotStoreError::Unavailable)
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
