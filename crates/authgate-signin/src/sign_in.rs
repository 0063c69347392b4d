//! Sign-in operation handler.
//!
//! Tries the silent path first (an existing session whose token still
//! mints) and falls back to the host's interactive sign-in UI. Both paths
//! share one finish sequence: optional user post-processing, token
//! exchange, cookie establishment, tenant bookkeeping, and the final
//! navigation back to the resource.

use crate::callbacks::{is_session_gone, AuthUser, SignInCallbacks, TenantAuth};
use crate::config::{OperationConfig, SelectedTenantInfo};
use crate::environment::Environment;
use crate::handler::{FlowContext, FlowState, OperationHandler};
use crate::settings::SharedSettings;
use async_trait::async_trait;
use authgate_api::ExchangeTokenRequest;
use authgate_core::{AuthGateError, Result, TenantKey};
use authgate_store::TenantListManager;
use std::sync::Arc;

pub struct SignInHandler {
    ctx: FlowContext,
    tenant: TenantKey,
    redirect_url: String,
    state_token: String,
    force_reauth: bool,
    selected_tenant_info: Option<SelectedTenantInfo>,
}

impl SignInHandler {
    /// Validate and freeze the operation inputs.
    pub fn new(
        config: &OperationConfig,
        settings: Arc<SharedSettings>,
        env: Arc<dyn Environment>,
        callbacks: Arc<dyn SignInCallbacks>,
        force_reauth: bool,
    ) -> Result<Self> {
        let tenant = config.tid.clone().ok_or_else(|| {
            AuthGateError::InvalidArgument("sign-in requires a tenant identifier".to_string())
        })?;
        let redirect_url = config.redirect_url.clone().ok_or_else(|| {
            AuthGateError::InvalidArgument("sign-in requires a redirect URL".to_string())
        })?;
        let state_token = config.state.clone().ok_or_else(|| {
            AuthGateError::InvalidArgument("sign-in requires a state token".to_string())
        })?;

        Ok(Self {
            ctx: FlowContext::new(settings, env, callbacks),
            tenant,
            redirect_url,
            state_token,
            force_reauth,
            selected_tenant_info: config.selected_tenant_info.clone(),
        })
    }

    fn verify_tenant(&self, user: &AuthUser) -> Result<()> {
        if user.tenant_id.as_deref() == self.tenant.auth_tenant_id() {
            Ok(())
        } else {
            Err(AuthGateError::InvalidArgument(format!(
                "signed-in tenant {:?} does not match the requested tenant {:?}",
                user.tenant_id,
                self.tenant.auth_tenant_id()
            )))
        }
    }

    async fn process(&self) -> Result<()> {
        let auth = self
            .ctx
            .callbacks
            .auth_for_tenant(&self.ctx.settings.api_key, self.tenant.auth_tenant_id())
            .await?;
        if auth.tenant_id().as_deref() != self.tenant.auth_tenant_id() {
            return Err(AuthGateError::InvalidArgument(
                "resolved identity client is scoped to a different tenant".to_string(),
            ));
        }

        let project_id = self.ctx.authorize(Some(&self.redirect_url)).await?;
        self.ctx.set_state(FlowState::Working);

        // Silent path: reuse an existing session unless re-auth is forced.
        // A token fetch failing because the account itself is gone means
        // there is no session to reuse, not that sign-in failed.
        if !self.force_reauth {
            if let Some(user) = auth.current_user().await? {
                match auth.id_token(&user, false).await {
                    Ok(_) => return self.finish(&auth, user, &project_id).await,
                    Err(e) if is_session_gone(&e) => {
                        tracing::debug!(uid = %user.uid, "Existing session is gone, signing in interactively");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        // Interactive path. Only the silent path is tolerated inside a
        // cross-origin embedded frame.
        if self.ctx.env.is_embedded_frame() {
            return Err(AuthGateError::PermissionDenied(
                "interactive sign-in is not allowed in a cross-origin frame".to_string(),
            ));
        }

        self.ctx.callbacks.hide_progress().await;
        self.ctx.set_state(FlowState::AwaitingSignIn);
        let user = self
            .ctx
            .callbacks
            .start_sign_in(Arc::clone(&auth), self.selected_tenant_info.as_ref())
            .await?;
        self.verify_tenant(&user)?;

        self.ctx.callbacks.show_progress().await;
        self.ctx.set_state(FlowState::Working);
        self.finish(&auth, user, &project_id).await
    }

    /// Finish sequence shared by the silent and interactive paths.
    async fn finish(
        &self,
        auth: &Arc<dyn TenantAuth>,
        user: AuthUser,
        project_id: &str,
    ) -> Result<()> {
        let user = if self.ctx.callbacks.has_process_user() {
            let processed = self.ctx.callbacks.process_user(user).await?;
            self.verify_tenant(&processed)?;
            processed
        } else {
            user
        };

        let id_token = auth.id_token(&user, false).await?;
        let request = ExchangeTokenRequest {
            id_token,
            state: self.state_token.clone(),
            id_token_tenant_id: self.tenant.auth_tenant_id().map(str::to_string),
        };
        let response = self.ctx.exchange_token(&self.redirect_url, request).await?;
        self.ctx
            .set_cookie(&response.target_uri, &response.redirect_token)
            .await?;

        let tenants =
            TenantListManager::new(Arc::clone(&self.ctx.settings.storage), project_id);
        tenants.add(&self.tenant)?;

        tracing::info!(original_uri = %response.original_uri, "Sign-in complete, returning to resource");
        self.ctx.env.navigate(&response.original_uri).await
    }
}

#[async_trait]
impl OperationHandler for SignInHandler {
    async fn start(&self) -> Result<()> {
        tracing::info!(tenant = %self.tenant, "Starting sign-in");
        self.ctx.callbacks.show_progress().await;
        match self.process().await {
            Ok(()) => {
                self.ctx.set_state(FlowState::Completed);
                Ok(())
            }
            Err(e) => Err(self.ctx.fail(e).await),
        }
    }

    async fn original_url(&self) -> Result<Option<String>> {
        self.ctx
            .original_url_from_session(Some(&self.redirect_url), Some(&self.state_token))
            .await
    }

    fn state(&self) -> FlowState {
        self.ctx.state()
    }
}
