//! Recently-used tenant persistence.
//!
//! One durable key per project holds the ordered list of tenant keys a user
//! has signed in with on this host. Sign-out with no explicit tenant walks
//! this list; the tenant-selection UI may use it for ordering.

use crate::manager::{Persistence, StorageManager};
use authgate_core::{Result, TenantKey};
use serde_json::Value;
use std::sync::Arc;

/// Project-scoped manager for the persisted tenant set.
pub struct TenantListManager {
    storage: Arc<StorageManager>,
    project_id: String,
}

impl TenantListManager {
    /// Create a manager for one project.
    #[must_use]
    pub fn new(storage: Arc<StorageManager>, project_id: impl Into<String>) -> Self {
        Self {
            storage,
            project_id: project_id.into(),
        }
    }

    fn storage_name(&self) -> String {
        format!("tenants-{}", self.project_id)
    }

    fn read(&self) -> Vec<String> {
        let Some(value) = self.storage.get(Persistence::Durable, &self.storage_name()) else {
            return Vec::new();
        };
        // Anything other than a list of strings is a corrupted entry.
        match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn write(&self, entries: &[String]) -> Result<()> {
        let value = Value::Array(entries.iter().cloned().map(Value::String).collect());
        self.storage
            .set(Persistence::Durable, &self.storage_name(), &value)
    }

    /// Record a tenant, preserving insertion order. Idempotent.
    pub fn add(&self, tenant: &TenantKey) -> Result<()> {
        let wire = tenant.as_wire();
        let mut entries = self.read();
        if !entries.contains(&wire) {
            entries.push(wire);
            self.write(&entries)?;
        }
        Ok(())
    }

    /// List recorded tenants in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<TenantKey> {
        self.read()
            .iter()
            .filter_map(|raw| raw.parse().ok())
            .collect()
    }

    /// Remove a tenant. Idempotent.
    pub fn remove(&self, tenant: &TenantKey) -> Result<()> {
        let wire = tenant.as_wire();
        let mut entries = self.read();
        let before = entries.len();
        entries.retain(|entry| *entry != wire);
        if entries.len() != before {
            if entries.is_empty() {
                return self
                    .storage
                    .remove(Persistence::Durable, &self.storage_name());
            }
            self.write(&entries)?;
        }
        Ok(())
    }

    /// Drop the whole project entry.
    pub fn clear(&self) -> Result<()> {
        self.storage
            .remove(Persistence::Durable, &self.storage_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::StoragePaths;
    use tempfile::TempDir;

    fn test_tenants() -> (TempDir, TenantListManager) {
        let dir = TempDir::new().unwrap();
        let paths = StoragePaths {
            durable_dir: dir.path().join("durable"),
            session_dir: dir.path().join("session"),
        };
        let storage = Arc::new(StorageManager::new(&paths, None));
        (dir, TenantListManager::new(storage, "project-1"))
    }

    fn key(raw: &str) -> TenantKey {
        raw.parse().unwrap()
    }

    #[test]
    fn test_add_is_idempotent_and_ordered() {
        let (_dir, tenants) = test_tenants();
        tenants.add(&key("tenant-b")).unwrap();
        tenants.add(&key("tenant-a")).unwrap();
        tenants.add(&key("tenant-b")).unwrap();

        assert_eq!(
            tenants.list(),
            vec![key("tenant-b"), key("tenant-a")]
        );
    }

    #[test]
    fn test_project_marker_round_trips() {
        let (_dir, tenants) = test_tenants();
        tenants.add(&key("_project-1")).unwrap();

        let listed = tenants.list();
        assert_eq!(listed, vec![key("_project-1")]);
        assert!(listed[0].is_project_level());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_dir, tenants) = test_tenants();
        tenants.add(&key("tenant-a")).unwrap();
        tenants.add(&key("tenant-b")).unwrap();

        tenants.remove(&key("tenant-a")).unwrap();
        tenants.remove(&key("tenant-a")).unwrap();
        assert_eq!(tenants.list(), vec![key("tenant-b")]);
    }

    #[test]
    fn test_projects_are_isolated() {
        let dir = TempDir::new().unwrap();
        let paths = StoragePaths {
            durable_dir: dir.path().join("durable"),
            session_dir: dir.path().join("session"),
        };
        let storage = Arc::new(StorageManager::new(&paths, None));
        let first = TenantListManager::new(Arc::clone(&storage), "project-1");
        let second = TenantListManager::new(storage, "project-2");

        first.add(&key("tenant-a")).unwrap();
        assert!(second.list().is_empty());
    }

    #[test]
    fn test_clear() {
        let (_dir, tenants) = test_tenants();
        tenants.add(&key("tenant-a")).unwrap();
        tenants.clear().unwrap();
        assert!(tenants.list().is_empty());
    }

    #[test]
    fn test_unavailable_backend_never_throws_from_public_operations() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not dir").unwrap();

        let paths = StoragePaths {
            durable_dir: blocker.join("nested"),
            session_dir: blocker.join("nested-too"),
        };
        let storage = Arc::new(StorageManager::new(&paths, None));
        let tenants = TenantListManager::new(storage, "project-1");

        tenants.add(&key("tenant-a")).unwrap();
        assert_eq!(tenants.list(), vec![key("tenant-a")]);
        tenants.remove(&key("tenant-a")).unwrap();
        tenants.clear().unwrap();
    }
}
