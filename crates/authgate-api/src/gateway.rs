//! Gateway RPC client.
//!
//! Three calls against the access gateway: exchange an identity token for a
//! redirect token, present the redirect token to the target resource to set
//! its session cookie, and look up session information for a pending
//! handshake. All endpoints are addressed relative to the redirect URL the
//! gateway put in the page URL.

use crate::http::{build_client, handle_response, map_transport_error, normalize_empty_ok};
use crate::models::{ExchangeTokenRequest, RedirectServerResponse, SessionInfoResponse};
use authgate_core::{AuthGateError, Result};
use reqwest::Client;
use url::Url;

/// Header carrying the redirect token on the cookie-set call.
pub const REDIRECT_TOKEN_HEADER: &str = "x-iap-3p-token";

/// Typed client for the gateway's handshake endpoints.
#[derive(Debug, Clone)]
pub struct GatewayApiClient {
    http: Client,
}

impl GatewayApiClient {
    /// Create a client.
    pub fn new(user_agent: &str) -> Result<Self> {
        Ok(Self {
            http: build_client(user_agent)?,
        })
    }

    /// Exchange an identity token for `{redirectToken, originalUri, targetUri}`.
    pub async fn exchange_id_token(
        &self,
        redirect_server_url: &str,
        request: &ExchangeTokenRequest,
    ) -> Result<RedirectServerResponse> {
        let url = validate_gateway_url(redirect_server_url)?;
        request.validate()?;

        tracing::debug!(url = %url, "Exchanging identity token");
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;
        let parsed: RedirectServerResponse = handle_response(response).await?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Present the redirect token to the target resource, establishing its
    /// session cookie.
    pub async fn set_cookie_at_target_url(
        &self,
        target_url: &str,
        redirect_token: &str,
    ) -> Result<()> {
        let url = validate_gateway_url(target_url)?;
        if redirect_token.is_empty() {
            return Err(AuthGateError::InvalidArgument(
                "redirect token must not be empty".to_string(),
            ));
        }

        tracing::debug!(url = %url, "Setting session cookie at target");
        let response = self
            .http
            .get(url)
            .header(REDIRECT_TOKEN_HEADER, redirect_token)
            .send()
            .await
            .map_err(map_transport_error)?;
        normalize_empty_ok(response).await
    }

    /// Look up session information for a pending handshake state.
    pub async fn get_session_info(
        &self,
        redirect_server_url: &str,
        state: &str,
    ) -> Result<SessionInfoResponse> {
        let url = validate_gateway_url(redirect_server_url)?;
        if state.is_empty() {
            return Err(AuthGateError::InvalidArgument(
                "state must not be empty".to_string(),
            ));
        }

        tracing::debug!(url = %url, "Fetching session info");
        let response = self
            .http
            .get(url)
            .query(&[("state", state)])
            .send()
            .await
            .map_err(map_transport_error)?;
        let parsed: SessionInfoResponse = handle_response(response).await?;
        parsed.validate()?;
        Ok(parsed)
    }
}

/// Gateway endpoints must be plain web URLs.
fn validate_gateway_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|_| AuthGateError::InvalidArgument(format!("invalid URL: {raw}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(AuthGateError::InvalidArgument(format!(
            "unsupported URL scheme: {scheme}"
        ))),
    }
}
