//! Tenant Identifiers
//!
//! A tenant identifier in the handshake URL takes one of two forms: a real
//! tenant id, or the project-marker form `_<projectId>` denoting the
//! tenant-less top-level identity namespace of a project ("agent" flow).
//! [`TenantKey`] makes the distinction explicit so that callers cannot
//! accidentally scope an identity client to the marker string itself.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Prefix marking the tenant-less top-level namespace of a project.
const PROJECT_MARKER_PREFIX: char = '_';

/// Error type for tenant-key parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTenantKeyError {
    pub message: String,
}

impl Display for ParseTenantKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse tenant key: {}", self.message)
    }
}

impl std::error::Error for ParseTenantKeyError {}

/// A tenant identifier carried through the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TenantKey {
    /// A real tenant within the project.
    Tenant(String),
    /// The project-level namespace, parsed from the `_<projectId>` form.
    ProjectLevel(String),
}

impl TenantKey {
    /// The tenant id to scope an identity client with.
    ///
    /// `None` for the project-level namespace: identity clients treat the
    /// top-level user pool as the absence of a tenant.
    #[must_use]
    pub fn auth_tenant_id(&self) -> Option<&str> {
        match self {
            TenantKey::Tenant(id) => Some(id),
            TenantKey::ProjectLevel(_) => None,
        }
    }

    /// The raw wire form, as it appears in URLs and the persisted tenant set.
    #[must_use]
    pub fn as_wire(&self) -> String {
        match self {
            TenantKey::Tenant(id) => id.clone(),
            TenantKey::ProjectLevel(project_id) => {
                format!("{PROJECT_MARKER_PREFIX}{project_id}")
            }
        }
    }

    /// Whether this key denotes the project-level namespace.
    #[must_use]
    pub fn is_project_level(&self) -> bool {
        matches!(self, TenantKey::ProjectLevel(_))
    }
}

impl FromStr for TenantKey {
    type Err = ParseTenantKeyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseTenantKeyError {
                message: "tenant key must not be empty".to_string(),
            });
        }
        match s.strip_prefix(PROJECT_MARKER_PREFIX) {
            Some(project_id) => Ok(TenantKey::ProjectLevel(project_id.to_string())),
            None => Ok(TenantKey::Tenant(s.to_string())),
        }
    }
}

impl Display for TenantKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

impl From<TenantKey> for String {
    fn from(key: TenantKey) -> Self {
        key.as_wire()
    }
}

impl TryFrom<String> for TenantKey {
    type Error = ParseTenantKeyError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}
