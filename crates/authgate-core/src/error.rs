//! Error Types
//!
//! Standardized error taxonomy for the sign-in coordinator. Every failure
//! the library can surface, whether local validation, an authorization
//! gate, backend misconfiguration, or a transport fault, is classified
//! into one of these variants so that handler logic and host pages never branch on
//! backend-specific shapes.

use thiserror::Error;

/// Standardized error type for the sign-in coordinator.
///
/// # Variants
///
/// - `InvalidArgument` - malformed construction input or tenant mismatch (local, non-retryable)
/// - `PermissionDenied` - unauthorized domain or disallowed cross-origin embedding (non-retryable)
/// - `Internal` - backend-reported misconfiguration, e.g. zero candidate tenants (fatal)
/// - `Unknown` - unparsable backend response
/// - `Api` - transport error carrying the HTTP status and backend sub-code (typically transient)
/// - `Network` - connection-level failure before any response was received
/// - `Storage` - persistence serialization failure
#[derive(Debug, Clone, Error)]
pub enum AuthGateError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("API error (status {status}, code {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AuthGateError {
    /// Stable error code string for host-page dispatch and logging.
    ///
    /// For `Api` errors this is the normalized backend sub-code; for all
    /// other variants it is the taxonomy name.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            AuthGateError::InvalidArgument(_) => "invalid-argument",
            AuthGateError::PermissionDenied(_) => "permission-denied",
            AuthGateError::Internal(_) => "internal",
            AuthGateError::Unknown(_) => "unknown",
            AuthGateError::Api { code, .. } => code,
            AuthGateError::Network(_) => "network-error",
            AuthGateError::Storage(_) => "storage-error",
        }
    }

    /// Whether calling `start()` again on the same handler may succeed
    /// without correcting input.
    ///
    /// Transport and network faults are transient; everything else needs a
    /// changed input or a fixed deployment.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthGateError::Api { .. } | AuthGateError::Network(_)
        )
    }
}

/// Type alias for Results using [`AuthGateError`].
pub type Result<T> = std::result::Result<T, AuthGateError>;
