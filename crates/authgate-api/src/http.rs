//! Shared HTTP plumbing for both RPC clients.

use crate::error_parse::normalize_error_body;
use authgate_core::{AuthGateError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// RPC timeout on desktop hosts.
pub const DESKTOP_TIMEOUT: Duration = Duration::from_secs(30);

/// RPC timeout on mobile hosts, where radio wake-up and handover make the
/// desktop budget too tight.
pub const MOBILE_TIMEOUT: Duration = Duration::from_secs(60);

const MOBILE_UA_MARKERS: &[&str] = &[
    "android",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
    "mobile",
];

/// Pick the request timeout for a host user agent.
#[must_use]
pub fn timeout_for_user_agent(user_agent: &str) -> Duration {
    let ua = user_agent.to_ascii_lowercase();
    if MOBILE_UA_MARKERS.iter().any(|marker| ua.contains(marker)) {
        MOBILE_TIMEOUT
    } else {
        DESKTOP_TIMEOUT
    }
}

/// Build the underlying HTTP client for a host user agent.
pub(crate) fn build_client(user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(timeout_for_user_agent(user_agent))
        .user_agent("authgate-signin/0.1")
        .build()
        .map_err(|e| AuthGateError::Internal(format!("failed to build HTTP client: {e}")))
}

/// Map connection-level failures, which never carried a response.
pub(crate) fn map_transport_error(e: reqwest::Error) -> AuthGateError {
    if e.is_timeout() {
        AuthGateError::Network("request timed out".to_string())
    } else {
        AuthGateError::Network(e.to_string())
    }
}

/// Parse a success body, normalize an error body.
pub(crate) async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    let body = response.text().await.map_err(map_transport_error)?;

    if status.is_success() {
        serde_json::from_str(&body)
            .map_err(|e| AuthGateError::Unknown(format!("unparsable backend response: {e}")))
    } else {
        let payload = normalize_error_body(status.as_u16(), &body);
        tracing::debug!(
            status = payload.status,
            code = %payload.code,
            "Backend reported an error"
        );
        Err(payload.into())
    }
}

/// Accept any success status with any body; normalize everything else.
///
/// The cookie-set endpoint answers with whatever the proxied resource
/// serves, so the success body is opaque.
pub(crate) async fn normalize_empty_ok(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.map_err(map_transport_error)?;
    Err(normalize_error_body(status.as_u16(), &body).into())
}
