//! Wire models for the identity-platform and gateway APIs.

use authgate_core::{AuthGateError, Result};
use serde::{Deserialize, Serialize};

/// Project configuration returned by the identity-platform lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// The project owning the API key.
    pub project_id: String,

    /// Domains allowed to host sign-in surfaces and redirect targets.
    #[serde(default)]
    pub authorized_domains: Vec<String>,
}

/// Token-exchange request sent to the gateway's redirect endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeTokenRequest {
    /// The identity token to exchange.
    pub id_token: String,

    /// Opaque correlation token binding the handshake steps together.
    pub state: String,

    /// Raw tenant key the token was minted for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token_tenant_id: Option<String>,
}

impl ExchangeTokenRequest {
    /// Reject malformed requests before any network round trip.
    pub fn validate(&self) -> Result<()> {
        if self.id_token.is_empty() {
            return Err(AuthGateError::InvalidArgument(
                "id_token must not be empty".to_string(),
            ));
        }
        if self.state.is_empty() {
            return Err(AuthGateError::InvalidArgument(
                "state must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Successful token-exchange response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectServerResponse {
    /// Short-lived bearer credential presented to the target resource.
    pub redirect_token: String,

    /// The pre-authentication URL the browser should return to.
    pub original_uri: String,

    /// The resource URL that sets the session cookie.
    pub target_uri: String,
}

impl RedirectServerResponse {
    /// Response-shape validation: all three fields are required.
    pub fn validate(&self) -> Result<()> {
        if self.redirect_token.is_empty()
            || self.original_uri.is_empty()
            || self.target_uri.is_empty()
        {
            return Err(AuthGateError::Unknown(
                "incomplete redirect server response".to_string(),
            ));
        }
        Ok(())
    }
}

/// Session information for a pending handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfoResponse {
    /// Candidate tenants the resource serves.
    #[serde(default)]
    pub tenant_ids: Vec<String>,

    /// The pre-authentication URL the browser should return to.
    pub original_uri: String,
}

impl SessionInfoResponse {
    /// Response-shape validation.
    ///
    /// An empty candidate list is a backend misconfiguration, not a
    /// retryable condition.
    pub fn validate(&self) -> Result<()> {
        if self.original_uri.is_empty() {
            return Err(AuthGateError::Unknown(
                "session info missing original URI".to_string(),
            ));
        }
        if self.tenant_ids.is_empty() {
            return Err(AuthGateError::Internal(
                "no tenants configured for this resource".to_string(),
            ));
        }
        Ok(())
    }
}
