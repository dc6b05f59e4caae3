//! Durable key/value storage for the session mirror. [`FileStorage`] keeps a
//! single JSON object on disk, which is the native stand-in for browser local
//! storage. Values are plain strings; callers own their encoding. An entry
//! that is not a string is reported as [`StorageError::Corrupt`] without
//! affecting the other keys.

use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored value for '{0}' is not a string")]
    Corrupt(String),
}

/// Key/value store used to persist session state between launches.
pub trait Storage: Send + Sync {
    /// # Errors
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    /// Returns an error if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns an error if the backing medium cannot be updated.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage with no durability.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// JSON-object file storage. Every write replaces the file through a sibling
/// temp file so a crash never leaves a half-written document.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole document. A missing file is empty storage; an unreadable
    /// document is logged and treated as empty.
    fn load(&self) -> Result<BTreeMap<String, Value>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(path = %self.path.display(), "ignoring unreadable storage file: {err}");
                Ok(BTreeMap::new())
            }
        }
    }

    fn store(&self, entries: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let payload = serde_json::to_vec_pretty(entries)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), keys = entries.len(), "storage written");
        Ok(())
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, Value>) -> bool,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        if apply(&mut entries) {
            self.store(&entries)?;
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.load()?.remove(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value)),
            Some(_) => Err(StorageError::Corrupt(key.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), Value::String(value.to_string()));
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use uuid::Uuid;

    #[test]
    fn memory_storage_set_get_remove() -> Result<()> {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("token")?, None);

        storage.set("token", "abc")?;
        assert_eq!(storage.get("token")?, Some("abc".to_string()));

        storage.remove("token")?;
        storage.remove("token")?;
        assert_eq!(storage.get("token")?, None);
        Ok(())
    }

    #[test]
    fn file_storage_missing_file_is_empty() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("studyhub-storage-{}", Uuid::new_v4()));
        let storage = FileStorage::new(dir.join("absent.json"));

        assert_eq!(storage.get("token")?, None);
        storage.remove("token")?;
        assert!(!storage.path().exists());
        Ok(())
    }

    #[test]
    fn file_storage_persists_across_instances() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("studyhub-storage-{}", Uuid::new_v4()));
        let path = dir.join("nested").join("session.json");

        FileStorage::new(&path).set("token", "abc")?;
        FileStorage::new(&path).set("user", r#"{"id":1}"#)?;

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("token")?, Some("abc".to_string()));
        assert_eq!(reopened.get("user")?, Some(r#"{"id":1}"#.to_string()));
        Ok(())
    }

    #[test]
    fn file_storage_treats_corrupt_document_as_empty() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("studyhub-storage-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir)?;
        let path = dir.join("session.json");
        fs::write(&path, "{ definitely not json")?;

        let storage = FileStorage::new(&path);
        assert_eq!(storage.get("token")?, None);

        storage.set("token", "fresh")?;
        assert_eq!(storage.get("token")?, Some("fresh".to_string()));
        Ok(())
    }

    #[test]
    fn file_storage_non_string_entry_only_affects_its_key() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("studyhub-storage-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir)?;
        let path = dir.join("session.json");
        fs::write(&path, r#"{"token": "abc", "user": {"id": 1}}"#)?;

        let storage = FileStorage::new(&path);
        assert_eq!(storage.get("token")?, Some("abc".to_string()));
        assert!(matches!(storage.get("user"), Err(StorageError::Corrupt(key)) if key == "user"));

        storage.remove("user")?;
        assert_eq!(storage.get("user")?, None);
        assert_eq!(storage.get("token")?, Some("abc".to_string()));
        Ok(())
    }
}
