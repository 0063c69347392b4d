//! Authgate Core Library
//!
//! Shared types for the authgate sign-in coordinator.
//!
//! # Modules
//!
//! - [`ids`] - tenant identifier forms ([`TenantKey`])
//! - [`error`] - standardized error taxonomy ([`AuthGateError`])
//! - [`sanitize`] - redirect-URL scheme sanitization

pub mod error;
pub mod ids;
pub mod sanitize;

// Re-export main types for convenient access
pub use error::{AuthGateError, Result};
pub use ids::{ParseTenantKeyError, TenantKey};
pub use sanitize::{sanitize_redirect_url, INERT_URL};
