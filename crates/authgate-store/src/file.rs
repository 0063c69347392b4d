//! File-backed storage backend.
//!
//! One JSON file per key under a host-supplied directory. The same backend
//! implements both persistence classes: the durable class points at a data
//! directory that outlives the host, the session class at a directory the
//! host scopes to one session's lifetime.

use crate::backend::KeyValueStore;
use authgate_core::{AuthGateError, Result};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// File-based key-value store.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    ///
    /// Creation failure is not an error here; the availability probe run
    /// by the manager will observe the first failing write and fall back.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "Failed to create storage directory");
        }
        Self { dir }
    }

    fn file_path(&self, key: &str) -> PathBuf {
        // Keys carry `:` separators; encode so every key is a valid filename.
        self.dir
            .join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let path = self.file_path(key);
        let contents = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                // Corrupted entry: treat as absent and clear it.
                tracing::warn!(key, error = %e, "Stored value is unparsable, clearing");
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.file_path(key);
        let contents = serde_json::to_string(value)
            .map_err(|e| AuthGateError::Storage(format!("failed to serialize value: {e}")))?;
        fs::write(&path, contents).map_err(|e| {
            AuthGateError::Storage(format!("failed to write {}: {e}", path.display()))
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.file_path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                AuthGateError::Storage(format!("failed to delete {}: {e}", path.display()))
            })?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    let stem = path.file_stem()?.to_string_lossy();
                    Some(urlencoding::decode(&stem).ok()?.into_owned())
                } else {
                    None
                }
            })
            .collect()
    }
}
