//! Tenant-selection operation handler.
//!
//! A resource may serve several tenants; this handler fetches the
//! candidates, lets the host's selection UI (or an auto-pick) choose one,
//! and transitions into the sign-in operation: in the same document when
//! the host can push history state, with a real navigation otherwise.

use crate::callbacks::SignInCallbacks;
use crate::config::{OperationConfig, SelectedTenantInfo, SIGN_IN_CONTINUATION};
use crate::environment::{Environment, NavigationEvent};
use crate::handler::{FlowContext, FlowState, OperationHandler};
use crate::settings::SharedSettings;
use async_trait::async_trait;
use authgate_core::{AuthGateError, Result, TenantKey};
use serde_json::json;
use std::sync::Arc;
use url::Url;

pub struct SelectTenantHandler {
    ctx: FlowContext,
    redirect_url: String,
    state_token: String,
    hl: Option<String>,
}

impl SelectTenantHandler {
    /// Validate and freeze the operation inputs.
    pub fn new(
        config: &OperationConfig,
        settings: Arc<SharedSettings>,
        env: Arc<dyn Environment>,
        callbacks: Arc<dyn SignInCallbacks>,
    ) -> Result<Self> {
        let redirect_url = config.redirect_url.clone().ok_or_else(|| {
            AuthGateError::InvalidArgument("tenant selection requires a redirect URL".to_string())
        })?;
        let state_token = config.state.clone().ok_or_else(|| {
            AuthGateError::InvalidArgument("tenant selection requires a state token".to_string())
        })?;

        Ok(Self {
            ctx: FlowContext::new(settings, env, callbacks),
            redirect_url,
            state_token,
            hl: config.hl.clone(),
        })
    }

    async fn process(&self) -> Result<()> {
        self.ctx.authorize(Some(&self.redirect_url)).await?;
        self.ctx.set_state(FlowState::Working);

        let info = self
            .ctx
            .session_info(&self.redirect_url, &self.state_token)
            .await?;
        let candidates = info.tenant_ids;

        let selection = if self.ctx.callbacks.has_select_tenant() {
            let project_config = self.ctx.project_config().await?;
            self.ctx
                .callbacks
                .select_tenant(&project_config, &candidates)
                .await?
        } else {
            SelectedTenantInfo {
                email: None,
                tenant_id: candidates.first().cloned(),
                provider_ids: Vec::new(),
            }
        };

        let tenant = validate_selection(selection.tenant_id.as_deref(), &candidates)?;
        let sign_in_url = self.build_sign_in_url(&tenant);
        let hint = SelectedTenantInfo {
            email: selection.email,
            tenant_id: Some(tenant.as_wire()),
            provider_ids: selection.provider_ids,
        };

        if self.ctx.env.supports_history_push() {
            let payload = json!({
                "state": SIGN_IN_CONTINUATION,
                "selectedTenantInfo": hint,
            });
            self.ctx.env.push_history_state(payload, &sign_in_url)?;
            // Hosts do not emit a navigation event for programmatic
            // pushes; synthesize the one the facade is waiting on.
            let _ = self.ctx.settings.nav_sender.send(NavigationEvent {
                url: sign_in_url.to_string(),
            });
            tracing::info!(tenant = %tenant, "Continuing to sign-in in the same document");
        } else {
            let mut target = sign_in_url;
            target.set_fragment(Some(&hash_hint(&hint)));
            tracing::info!(tenant = %tenant, "Continuing to sign-in with a full navigation");
            self.ctx.env.navigate(target.as_str()).await?;
        }
        Ok(())
    }

    fn build_sign_in_url(&self, tenant: &TenantKey) -> Url {
        let mut url = self.ctx.env.current_url();
        url.set_fragment(None);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            pairs.append_pair("mode", "login");
            pairs.append_pair("apiKey", &self.ctx.settings.api_key);
            pairs.append_pair("tid", &tenant.as_wire());
            pairs.append_pair("state", &self.state_token);
            pairs.append_pair("redirect_uri", &self.redirect_url);
            if let Some(hl) = &self.hl {
                pairs.append_pair("hl", hl);
            }
        }
        url
    }
}

/// Check the selection against the candidate set.
///
/// A `None` selection means the project-level namespace and is valid only
/// when the candidate list carries a project-marker entry.
fn validate_selection(selected: Option<&str>, candidates: &[String]) -> Result<TenantKey> {
    match selected {
        Some(raw) => {
            if !candidates.iter().any(|candidate| candidate == raw) {
                return Err(AuthGateError::InvalidArgument(format!(
                    "selected tenant {raw} is not served by this resource"
                )));
            }
            raw.parse().map_err(|_| {
                AuthGateError::InvalidArgument(format!("malformed tenant selection: {raw}"))
            })
        }
        None => candidates
            .iter()
            .find(|candidate| candidate.starts_with('_'))
            .and_then(|marker| marker.parse().ok())
            .ok_or_else(|| {
                AuthGateError::InvalidArgument(
                    "project-level sign-in is not served by this resource".to_string(),
                )
            }),
    }
}

/// Legacy-host encoding of the selection hint:
/// `hint=<email>;<provider1>,<provider2>,...`.
fn hash_hint(hint: &SelectedTenantInfo) -> String {
    let email = hint
        .email
        .as_deref()
        .map(|email| urlencoding::encode(email).into_owned())
        .unwrap_or_default();
    format!("hint={email};{}", hint.provider_ids.join(","))
}

#[async_trait]
impl OperationHandler for SelectTenantHandler {
    async fn start(&self) -> Result<()> {
        tracing::info!("Starting tenant selection");
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
