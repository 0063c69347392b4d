//! Shared per-facade context.
//!
//! One API key's RPC clients, the memoization cache, and the storage
//! manager, threaded by reference into every handler the facade builds so
//! chained same-document operations reuse each other's results.

use crate::cache::OpCache;
use crate::environment::NavigationSender;
use authgate_api::{GatewayApiClient, IdentityApiClient};
use authgate_core::Result;
use authgate_store::{StorageManager, StoragePaths};
use std::sync::Arc;

/// Context shared across chained handler instances within one facade
/// lifetime. Never shared across full reloads.
pub struct SharedSettings {
    /// The API key the page is configured with.
    pub api_key: String,
    /// Identity-platform client for this API key.
    pub identity: IdentityApiClient,
    /// Gateway client.
    pub gateway: GatewayApiClient,
    /// Memoized RPC results, keyed by operation and arguments.
    pub cache: OpCache,
    /// Persistence for the recently-used tenant set.
    pub storage: Arc<StorageManager>,
    /// Sender half of the facade's navigation-event channel, for
    /// synthesizing same-document transition events.
    pub nav_sender: NavigationSender,
}

impl SharedSettings {
    /// Build the shared context for one API key.
    pub fn new(
        api_key: impl Into<String>,
        identity_base_url: &str,
        storage_paths: &StoragePaths,
        app_id: Option<String>,
        user_agent: &str,
        nav_sender: NavigationSender,
    ) -> Result<Self> {
        let api_key = api_key.into();
        Ok(Self {
            identity: IdentityApiClient::new(identity_base_url, api_key.clone(), user_agent)?,
            gateway: GatewayApiClient::new(user_agent)?,
            cache: OpCache::new(),
            storage: Arc::new(StorageManager::new(storage_paths, app_id)),
            api_key,
            nav_sender,
        })
    }
}
