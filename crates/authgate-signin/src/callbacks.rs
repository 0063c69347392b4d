//! External collaborator seam.
//!
//! The host page supplies the interactive pieces of the handshake
//! (per-tenant identity clients and the sign-in, tenant-selection, and
//! signed-out UI) through these traits. Required capabilities are plain
//! trait methods; optional ones pair a `has_*` probe with the hook so
//! handlers know whether to call them at all.

use crate::config::SelectedTenantInfo;
use async_trait::async_trait;
use authgate_api::ProjectConfig;
use authgate_core::{AuthGateError, Result};
use std::sync::Arc;

/// Sub-codes a tenant identity client reports when the underlying account
/// can no longer mint tokens. The silent sign-in path treats these as
/// "no session", the account being implicitly signed out, rather than as
/// failures.
pub const SESSION_GONE_CODES: &[&str] = &[
    "USER_DISABLED",
    "USER_DELETED",
    "USER_SIGNED_OUT",
    "TOKEN_EXPIRED",
];

/// Whether a token-fetch failure means the session is simply gone.
#[must_use]
pub fn is_session_gone(error: &AuthGateError) -> bool {
    matches!(error, AuthGateError::Api { code, .. } if SESSION_GONE_CODES.contains(&code.as_str()))
}

/// A user known to a tenant identity client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Stable user id within the identity namespace.
    pub uid: String,
    /// Email, when the providers expose one.
    pub email: Option<String>,
    /// Tenant the user is scoped to; `None` in the project-level namespace.
    pub tenant_id: Option<String>,
}

/// Boundary to one tenant-scoped identity client.
///
/// The concrete client (token issuance, provider plumbing) is the host's;
/// the coordinator only needs session state, tokens, and sign-out.
#[async_trait]
pub trait TenantAuth: Send + Sync {
    /// The tenant this client is scoped to; `None` for the project-level
    /// namespace.
    fn tenant_id(&self) -> Option<String>;

    /// The signed-in user, resolving only after the client's initial
    /// session-state notification has fired.
    async fn current_user(&self) -> Result<Option<AuthUser>>;

    /// Fetch an identity token for `user`.
    async fn id_token(&self, user: &AuthUser, force_refresh: bool) -> Result<String>;

    /// End this client's session.
    async fn sign_out(&self) -> Result<()>;
}

/// The external collaborator driving UI on behalf of the coordinator.
#[async_trait]
pub trait SignInCallbacks: Send + Sync {
    /// Resolve the identity client for a tenant of the given API key's
    /// project.
    async fn auth_for_tenant(
        &self,
        api_key: &str,
        tenant_id: Option<&str>,
    ) -> Result<Arc<dyn TenantAuth>>;

    /// Run interactive sign-in on `auth` and resolve the signed-in user.
    ///
    /// Wall-clock time here is unbounded; any timeout policy belongs to
    /// the UI.
    async fn start_sign_in(
        &self,
        auth: Arc<dyn TenantAuth>,
        hint: Option<&SelectedTenantInfo>,
    ) -> Result<AuthUser>;

    /// Show the terminal signed-out UI when no redirect context exists.
    async fn complete_sign_out(&self) -> Result<()>;

    /// Whether [`select_tenant`](Self::select_tenant) is implemented.
    fn has_select_tenant(&self) -> bool {
        false
    }

    /// Present candidate tenants and resolve the user's choice.
    async fn select_tenant(
        &self,
        project_config: &ProjectConfig,
        tenant_ids: &[String],
    ) -> Result<SelectedTenantInfo> {
        let _ = (project_config, tenant_ids);
        Err(AuthGateError::Internal(
            "tenant selection is not implemented by this host".to_string(),
        ))
    }

    /// Whether [`process_user`](Self::process_user) is implemented.
    fn has_process_user(&self) -> bool {
        false
    }

    /// Post-process the signed-in user before the token exchange, e.g. to
    /// force a fresh token or link providers.
    async fn process_user(&self, user: AuthUser) -> Result<AuthUser> {
        Ok(user)
    }

    /// Show the progress indicator.
    async fn show_progress(&self) {}

    /// Hide the progress indicator.
    async fn hide_progress(&self) {}

    /// Observe a classified failure. The single reporting point for every
    /// error the coordinator surfaces.
    async fn handle_error(&self, error: &AuthGateError) {
        let _ = error;
    }
}
