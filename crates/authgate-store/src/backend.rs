//! Key-value storage backend abstraction.

use authgate_core::Result;
use serde_json::Value;

/// Trait for key-value storage backends.
///
/// Values are JSON so that anything JSON-representable round-trips with its
/// type preserved. A stored value that no longer parses is treated as
/// absent rather than an error.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key. `None` if absent or unparsable.
    fn get(&self, key: &str) -> Option<Value>;

    /// Set a value.
    fn set(&self, key: &str, value: &Value) -> Result<()>;

    /// Remove a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// List all stored keys.
    fn keys(&self) -> Vec<String>;
}

/// Key used for the one-time availability round-trip.
const PROBE_KEY: &str = "authgate-availability-probe";

/// Check that a backend can actually persist data.
///
/// Some hosts expose a backend that is present but rejects writes silently
/// (restricted profiles, full disks, read-only mounts). A write/read/remove
/// round-trip at construction detects that once, so later public operations
/// never have to.
pub fn probe_backend(store: &dyn KeyValueStore) -> bool {
    let marker = Value::String("probe".to_string());
    if store.set(PROBE_KEY, &marker).is_err() {
        return false;
    }
    let ok = store.get(PROBE_KEY).as_ref() == Some(&marker);
    let _ = store.remove(PROBE_KEY);
    ok
}
