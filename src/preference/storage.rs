//! Key/value slots backing the theme preference

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors from a preference store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("preference storage is unavailable")]
    Unavailable,
    #[error("preference file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("preference file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A string key/value store
pub trait PreferenceStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// JSON object on disk, one entry per key
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load(&self) -> Result<Map<String, Value>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PreferenceStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.load()?;
        Ok(entries
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // a corrupt file is replaced rather than blocking writes
        let mut entries = self.load().unwrap_or_else(|e| {
            tracing::warn!("Discarding unreadable preference file {:?}: {}", self.path, e);
            Map::new()
        });
        entries.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}

/// Process-local store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one entry
    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage
            .lock()
            .insert(key.to_string(), value.to_string());
        storage
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PreferenceStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage that is switched off; every access fails
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStorage;

impl PreferenceStorage for DisabledStorage {
    fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}
