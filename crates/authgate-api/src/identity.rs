//! Identity-platform RPC client.
//!
//! One lookup call per API key returns the owning project and its
//! authorized-domain allow-list; the client layers the combined
//! origin-authorization check on top of it.

use crate::http::{build_client, handle_response, map_transport_error};
use crate::models::ProjectConfig;
use authgate_core::{AuthGateError, Result};
use reqwest::Client;
use url::Url;

/// Default identity-platform endpoint prefix.
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identity.authgate.dev/v1";

/// Typed client for the identity-platform API.
#[derive(Debug, Clone)]
pub struct IdentityApiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl IdentityApiClient {
    /// Create a client for one API key.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http: build_client(user_agent)?,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Look up the project configuration for this API key.
    pub async fn get_project_config(&self) -> Result<ProjectConfig> {
        let url = format!("{}/projectConfig", self.base_url);
        tracing::debug!(url = %url, "Fetching project configuration");
        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(map_transport_error)?;
        handle_response(response).await
    }

    /// Check that every supplied URL is hosted on an authorized domain and
    /// return the project id.
    ///
    /// URL shapes are validated locally before the lookup; an unauthorized
    /// URL fails with permission-denied naming the first offender.
    pub async fn check_authorized_domains_and_get_project_id(
        &self,
        urls: &[String],
    ) -> Result<String> {
        let mut parsed = Vec::with_capacity(urls.len());
        for raw in urls {
            let url = Url::parse(raw).map_err(|_| {
                AuthGateError::InvalidArgument(format!("invalid URL: {raw}"))
            })?;
            parsed.push((raw, url));
        }

        let config = self.get_project_config().await?;
        for (raw, url) in &parsed {
            if !is_authorized_domain(url, &config.authorized_domains) {
                return Err(AuthGateError::PermissionDenied(format!(
                    "unauthorized domain: {raw}"
                )));
            }
        }

        tracing::debug!(project_id = %config.project_id, "All origins authorized");
        Ok(config.project_id)
    }
}

/// Domain allow-list matching.
///
/// Web origins match an entry exactly or as a subdomain of it; extension
/// origins match on the extension id only.
fn is_authorized_domain(url: &Url, authorized_domains: &[String]) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();

    match url.scheme() {
        "http" | "https" => authorized_domains.iter().any(|domain| {
            let domain = domain.to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{domain}"))
        }),
        "chrome-extension" => authorized_domains
            .iter()
            .any(|domain| host == domain.to_ascii_lowercase()),
        _ => false,
    }
}
