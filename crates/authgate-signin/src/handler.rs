//! Shared protocol skeleton for the operation handlers.

use crate::callbacks::SignInCallbacks;
use crate::environment::Environment;
use crate::settings::SharedSettings;
use async_trait::async_trait;
use authgate_api::{
    ExchangeTokenRequest, ProjectConfig, RedirectServerResponse, SessionInfoResponse,
};
use authgate_core::{AuthGateError, Result};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Authorization results change rarely; cache the combined check long.
pub const AUTHORIZATION_TTL: Duration = Duration::from_secs(30 * 60);

/// Session info tracks a pending handshake; keep it fresh.
pub const SESSION_INFO_TTL: Duration = Duration::from_secs(5 * 60);

/// Exchange and cookie-set results only need to survive a retry window.
pub const EXCHANGE_TTL: Duration = Duration::from_secs(5 * 60);

/// Protocol state of one operation handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Constructed, not yet started.
    Created,
    /// Running the combined origin-authorization check.
    Authorizing,
    /// Driving mode-specific RPCs.
    Working,
    /// Suspended on the host's interactive sign-in UI.
    AwaitingSignIn,
    /// Finished; the browser is navigating away or terminal UI is up.
    Completed,
    /// Failed; `start()` may be called again to retry.
    Failed,
}

/// One protocol operation, driven to completion by `start()`.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Drive the operation. A failed `start()` may be called again on the
    /// same instance: memoized steps replay for free, so only the steps
    /// that had not yet succeeded re-execute.
    async fn start(&self) -> Result<()>;

    /// The pre-authentication target URL, when a redirect context exists.
    async fn original_url(&self) -> Result<Option<String>>;

    /// Current protocol state.
    fn state(&self) -> FlowState;
}

/// State and helpers shared by every handler.
pub(crate) struct FlowContext {
    pub settings: Arc<SharedSettings>,
    pub env: Arc<dyn Environment>,
    pub callbacks: Arc<dyn SignInCallbacks>,
    state: RwLock<FlowState>,
}

impl FlowContext {
    pub fn new(
        settings: Arc<SharedSettings>,
        env: Arc<dyn Environment>,
        callbacks: Arc<dyn SignInCallbacks>,
    ) -> Self {
        Self {
            settings,
            env,
            callbacks,
            state: RwLock::new(FlowState::Created),
        }
    }

    pub fn state(&self) -> FlowState {
        self.state.read().map(|state| *state).unwrap_or(FlowState::Failed)
    }

    pub fn set_state(&self, next: FlowState) {
        if let Ok(mut state) = self.state.write() {
            *state = next;
        }
    }

    /// The combined "are these URLs authorized for this project" check,
    /// covering the current origin and the redirect target. Memoized.
    pub async fn authorize(&self, redirect_url: Option<&str>) -> Result<String> {
        self.set_state(FlowState::Authorizing);

        let mut urls = vec![self.env.current_url().to_string()];
        if let Some(redirect) = redirect_url {
            urls.push(redirect.to_string());
        }

        let settings = Arc::clone(&self.settings);
        let call_urls = urls.clone();
        let result = self
            .settings
            .cache
            .cached("check-authorized-domains", &urls, AUTHORIZATION_TTL, move || async move {
                settings
                    .identity
                    .check_authorized_domains_and_get_project_id(&call_urls)
                    .await
            })
            .await;

        if result.is_err() {
            self.callbacks.hide_progress().await;
        }
        result
    }

    /// Project configuration for the selection hook. Memoized.
    pub async fn project_config(&self) -> Result<ProjectConfig> {
        let settings = Arc::clone(&self.settings);
        self.settings
            .cache
            .cached(
                "project-config",
                &self.settings.api_key,
                AUTHORIZATION_TTL,
                move || async move { settings.identity.get_project_config().await },
            )
            .await
    }

    /// Session info for a pending handshake. Memoized.
    pub async fn session_info(
        &self,
        redirect_url: &str,
        state: &str,
    ) -> Result<SessionInfoResponse> {
        let settings = Arc::clone(&self.settings);
        let args = (redirect_url.to_string(), state.to_string());
        let call = args.clone();
        self.settings
            .cache
            .cached("session-info", &args, SESSION_INFO_TTL, move || async move {
                settings.gateway.get_session_info(&call.0, &call.1).await
            })
            .await
    }

    /// Token exchange at the gateway. Memoized.
    pub async fn exchange_token(
        &self,
        redirect_url: &str,
        request: ExchangeTokenRequest,
    ) -> Result<RedirectServerResponse> {
        let settings = Arc::clone(&self.settings);
        let args = (
            redirect_url.to_string(),
            request.id_token.clone(),
            request.state.clone(),
            request.id_token_tenant_id.clone(),
        );
        let url = redirect_url.to_string();
        self.settings
            .cache
            .cached("exchange-token", &args, EXCHANGE_TTL, move || async move {
                settings.gateway.exchange_id_token(&url, &request).await
            })
            .await
    }

    /// Cookie establishment at the target resource. Memoized.
    pub async fn set_cookie(&self, target_url: &str, redirect_token: &str) -> Result<()> {
        let settings = Arc::clone(&self.settings);
        let args = (target_url.to_string(), redirect_token.to_string());
        let call = args.clone();
        self.settings
            .cache
            .cached("set-cookie", &args, EXCHANGE_TTL, move || async move {
                settings
                    .gateway
                    .set_cookie_at_target_url(&call.0, &call.1)
                    .await
            })
            .await
    }

    /// Resolve the pre-authentication URL from session info, when a
    /// redirect context exists.
    pub async fn original_url_from_session(
        &self,
        redirect_url: Option<&str>,
        state: Option<&str>,
    ) -> Result<Option<String>> {
        match (redirect_url, state) {
            (Some(redirect), Some(state)) => {
                let info = self.session_info(redirect, state).await?;
                Ok(Some(info.original_uri))
            }
            _ => Ok(None),
        }
    }

    /// The common failure path: hide progress, report through the error
    /// hook, hand the error back for propagation.
    pub async fn fail(&self, error: AuthGateError) -> AuthGateError {
        self.set_state(FlowState::Failed);
        self.callbacks.hide_progress().await;
        tracing::warn!(code = error.code(), error = %error, "Operation failed");
        self.callbacks.handle_error(&error).await;
        error
    }
}
