//! Storage manager: backend selection, namespacing, and fallback.

use crate::backend::{probe_backend, KeyValueStore};
use crate::file::FileStore;
use crate::memory::MemoryStore;
use authgate_core::Result;
use serde_json::Value;
use std::path::PathBuf;

/// Namespace prefix on every key this library writes.
const KEY_PREFIX: &str = "authgate";

/// Persistence class requested for a logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Survives the host application restarting.
    Durable,
    /// Survives a reload within one session scope, not a new session.
    Session,
    /// Process-only.
    Memory,
}

/// Host-supplied directories backing the two persistent classes.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    /// Directory for durable state.
    pub durable_dir: PathBuf,
    /// Directory the host scopes to one session's lifetime.
    pub session_dir: PathBuf,
}

/// Selects a backend per persistence class, falling back to in-memory when
/// a persistent backend fails its availability probe.
pub struct StorageManager {
    durable: Box<dyn KeyValueStore>,
    session: Box<dyn KeyValueStore>,
    memory: MemoryStore,
    app_id: Option<String>,
}

impl StorageManager {
    /// Build a manager over the given directories.
    ///
    /// Each file backend is probed once with a write/read/remove round
    /// trip; a backend that fails the probe is replaced by a fresh
    /// in-memory store so public operations never surface availability
    /// errors.
    #[must_use]
    pub fn new(paths: &StoragePaths, app_id: Option<String>) -> Self {
        Self {
            durable: Self::probed(FileStore::new(paths.durable_dir.clone()), "durable"),
            session: Self::probed(FileStore::new(paths.session_dir.clone()), "session"),
            memory: MemoryStore::new(),
            app_id,
        }
    }

    fn probed(store: FileStore, class: &str) -> Box<dyn KeyValueStore> {
        if probe_backend(&store) {
            Box::new(store)
        } else {
            tracing::warn!(class, "Storage backend unavailable, falling back to in-memory");
            Box::new(MemoryStore::new())
        }
    }

    fn store_for(&self, persistence: Persistence) -> &dyn KeyValueStore {
        match persistence {
            Persistence::Durable => self.durable.as_ref(),
            Persistence::Session => self.session.as_ref(),
            Persistence::Memory => &self.memory,
        }
    }

    /// Full namespaced key: `authgate:<name>[:<app_id>]`.
    fn full_key(&self, name: &str) -> String {
        match &self.app_id {
            Some(app_id) => format!("{KEY_PREFIX}:{name}:{app_id}"),
            None => format!("{KEY_PREFIX}:{name}"),
        }
    }

    /// Read a value. Absent and unparsable both read as `None`.
    pub fn get(&self, persistence: Persistence, name: &str) -> Option<Value> {
        self.store_for(persistence).get(&self.full_key(name))
    }

    /// Write a value.
    pub fn set(&self, persistence: Persistence, name: &str, value: &Value) -> Result<()> {
        self.store_for(persistence).set(&self.full_key(name), value)
    }

    /// Remove a value.
    pub fn remove(&self, persistence: Persistence, name: &str) -> Result<()> {
        self.store_for(persistence).remove(&self.full_key(name))
    }

    /// Remove every key this library owns in the given class.
    pub fn clear_namespace(&self, persistence: Persistence) -> Result<usize> {
        let store = self.store_for(persistence);
        let mut removed = 0;
        for key in store.keys() {
            if key.starts_with(KEY_PREFIX) {
                store.remove(&key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
