//! Token persistence backends

use crate::error::StorageError;
use crate::session::TokenStore;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Process-local store; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .remove(key);
        Ok(())
    }
}

/// JSON object file holding string values by key
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&contents).map_err(|source| StorageError::Format {
            path: self.path.clone(),
            source,
        })
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let contents = serde_json::to_string_pretty(map).map_err(|source| StorageError::Format {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, contents).map_err(io_err)
    }

    fn update(&self, apply: impl FnOnce(&mut Map<String, Value>)) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut map = self.read_map()?;
        apply(&mut map);
        self.write_map(&map)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_map() {
            Ok(map) => map.get(key).and_then(Value::as_str).map(str::to_string),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable session file");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|map| {
            map.insert(key.to_string(), Value::String(value.to_string()));
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|map| {
            map.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryTokenStore::default();
        assert_eq!(store.get("authToken"), None);
        store.set("authToken", "bearer a").unwrap();
        assert_eq!(store.get("authToken").as_deref(), Some("bearer a"));
        store.remove("authToken").unwrap();
        assert_eq!(store.get("authToken"), None);
    }

    #[test]
    fn file_store_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileTokenStore::new(&path).set("authToken", "bearer persisted").unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.get("authToken").as_deref(), Some("bearer persisted"));
    }

    #[test]
    fn file_store_remove_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));
        store.set("authToken", "bearer a").unwrap();
        store.set("theme", "dark").unwrap();

        store.remove("authToken").unwrap();
        assert_eq!(store.get("authToken"), None);
        assert_eq!(store.get("theme").as_deref(), Some("dark"));
    }

    #[test]
    fn missing_or_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileTokenStore::new(&path);
        assert_eq!(store.get("authToken"), None);
        store.remove("authToken").unwrap();

        fs::write(&path, "not json").unwrap();
        assert_eq!(store.get("authToken"), None);
        assert!(matches!(
            store.set("authToken", "x"),
            Err(StorageError::Format { .. })
        ));
    }
}
