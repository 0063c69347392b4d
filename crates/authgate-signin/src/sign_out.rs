//! Sign-out operation handler.
//!
//! Ends the session of one tenant, or of every tenant recorded in the
//! persisted set, then either returns to the resource via the gateway or
//! hands off to the host's terminal signed-out UI.

use crate::callbacks::SignInCallbacks;
use crate::config::OperationConfig;
use crate::environment::Environment;
use crate::handler::{FlowContext, FlowState, OperationHandler};
use crate::settings::SharedSettings;
use async_trait::async_trait;
use authgate_api::ExchangeTokenRequest;
use authgate_core::{Result, TenantKey};
use authgate_store::TenantListManager;
use std::sync::Arc;

/// Placeholder identity token for resolving the original URL after
/// sign-out; the gateway's exchange endpoint accepts it in place of a
/// real token.
const SIGN_OUT_PLACEHOLDER_TOKEN: &str = "SIGNED_OUT";

pub struct SignOutHandler {
    ctx: FlowContext,
    tenant: Option<TenantKey>,
    redirect_url: Option<String>,
    state_token: Option<String>,
}

impl SignOutHandler {
    /// Freeze the operation inputs. Everything is optional here: no tenant
    /// means all recorded tenants, no redirect context means terminal UI.
    pub fn new(
        config: &OperationConfig,
        settings: Arc<SharedSettings>,
        env: Arc<dyn Environment>,
        callbacks: Arc<dyn SignInCallbacks>,
    ) -> Self {
        Self {
            ctx: FlowContext::new(settings, env, callbacks),
            tenant: config.tid.clone(),
            redirect_url: config.redirect_url.clone(),
            state_token: config.state.clone(),
        }
    }

    async fn process(&self) -> Result<()> {
        let project_id = self.ctx.authorize(self.redirect_url.as_deref()).await?;
        self.ctx.set_state(FlowState::Working);

        let tenants =
            TenantListManager::new(Arc::clone(&self.ctx.settings.storage), project_id);
        let targets = match &self.tenant {
            Some(tenant) => vec![tenant.clone()],
            None => tenants.list(),
        };

        for tenant in &targets {
            let auth = self
                .ctx
                .callbacks
                .auth_for_tenant(&self.ctx.settings.api_key, tenant.auth_tenant_id())
                .await?;
            auth.sign_out().await?;
            tenants.remove(tenant)?;
            tracing::debug!(tenant = %tenant, "Signed out of tenant");
        }

        match (&self.redirect_url, &self.state_token) {
            (Some(redirect_url), Some(state)) => {
                let request = ExchangeTokenRequest {
                    id_token: SIGN_OUT_PLACEHOLDER_TOKEN.to_string(),
                    state: state.clone(),
                    id_token_tenant_id: None,
                };
                let response = self.ctx.exchange_token(redirect_url, request).await?;
                tracing::info!(original_uri = %response.original_uri, "Signed out, returning to resource");
                self.ctx.env.navigate(&response.original_uri).await
            }
            _ => {
                self.ctx.callbacks.hide_progress().await;
                tracing::info!("Signed out with no redirect context, showing terminal UI");
                self.ctx.callbacks.complete_sign_out().await
            }
        }
    }
}

#[async_trait]
impl OperationHandler for SignOutHandler {
    async fn start(&self) -> Result<()> {
        tracing::info!("Starting sign-out");
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
            .original_url_from_session(self.redirect_url.as_deref(), self.state_token.as_deref())
            .await
    }

    fn state(&self) -> FlowState {
        self.ctx.state()
    }
}
