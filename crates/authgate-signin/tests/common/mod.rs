//! Shared harness for the handshake scenario tests: a mock host
//! environment, mock collaborator callbacks with scripted identity
//! clients, and a wiremock backend standing in for both the identity
//! platform and the gateway.
#![allow(dead_code)]

use async_trait::async_trait;
use authgate_core::{AuthGateError, Result};
use authgate_signin::{
    Authentication, AuthenticationOptions, AuthUser, Environment, SelectedTenantInfo,
    SignInCallbacks, StorageManager, StoragePaths, TenantAuth, TenantListManager,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROJECT_ID: &str = "project-1";

/// Scripted host environment.
pub struct MockEnv {
    url: Mutex<Url>,
    payload: Mutex<Option<Value>>,
    pub embedded: bool,
    pub history_push: bool,
    navigations: Mutex<Vec<String>>,
}

impl MockEnv {
    pub fn new(url: &str) -> Self {
        Self {
            url: Mutex::new(Url::parse(url).unwrap()),
            payload: Mutex::new(None),
            embedded: false,
            history_push: true,
            navigations: Mutex::new(Vec::new()),
        }
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Environment for MockEnv {
    fn current_url(&self) -> Url {
        self.url.lock().unwrap().clone()
    }

    fn navigation_payload(&self) -> Option<Value> {
        self.payload.lock().unwrap().clone()
    }

    fn user_agent(&self) -> String {
        "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0".to_string()
    }

    fn is_embedded_frame(&self) -> bool {
        self.embedded
    }

    fn supports_history_push(&self) -> bool {
        self.history_push
    }

    fn push_history_state(&self, payload: Value, url: &Url) -> Result<()> {
        *self.url.lock().unwrap() = url.clone();
        *self.payload.lock().unwrap() = Some(payload);
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.navigations.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Scripted tenant identity client.
pub struct MockAuth {
    tenant: Option<String>,
    user: Mutex<Option<AuthUser>>,
    gone_uids: Mutex<HashSet<String>>,
    pub sign_outs: AtomicUsize,
}

impl MockAuth {
    pub fn new(tenant: Option<&str>) -> Self {
        Self {
            tenant: tenant.map(str::to_string),
            user: Mutex::new(None),
            gone_uids: Mutex::new(HashSet::new()),
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn set_user(&self, user: AuthUser) {
        *self.user.lock().unwrap() = Some(user);
    }

    /// Make token fetches for `uid` fail as an implicitly-signed-out
    /// account.
    pub fn mark_session_gone(&self, uid: &str) {
        self.gone_uids.lock().unwrap().insert(uid.to_string());
    }
}

#[async_trait]
impl TenantAuth for MockAuth {
    fn tenant_id(&self) -> Option<String> {
        self.tenant.clone()
    }

    async fn current_user(&self) -> Result<Option<AuthUser>> {
        Ok(self.user.lock().unwrap().clone())
    }

    async fn id_token(&self, user: &AuthUser, _force_refresh: bool) -> Result<String> {
        if self.gone_uids.lock().unwrap().contains(&user.uid) {
            return Err(AuthGateError::Api {
                status: 400,
                code: "USER_DISABLED".to_string(),
                message: "account disabled by administrator".to_string(),
            });
        }
        Ok(format!("token-{}", user.uid))
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        *self.user.lock().unwrap() = None;
        Ok(())
    }
}

/// Scripted collaborator with an event log for ordering assertions.
pub struct MockCallbacks {
    auths: Mutex<HashMap<Option<String>, Arc<MockAuth>>>,
    /// What interactive sign-in resolves with, when scripted.
    pub sign_in_user: Mutex<Option<AuthUser>>,
    /// What the selection hook resolves with, when scripted.
    pub selection: Mutex<Option<SelectedTenantInfo>>,
    events: Mutex<Vec<String>>,
}

impl MockCallbacks {
    pub fn new() -> Self {
        Self {
            auths: Mutex::new(HashMap::new()),
            sign_in_user: Mutex::new(None),
            selection: Mutex::new(None),
            events: Mutex::new(Vec::new()),
        }
    }

    /// The identity client for a tenant, creating a session-less one on
    /// first use.
    pub fn auth_for(&self, tenant: Option<&str>) -> Arc<MockAuth> {
        let mut auths = self.auths.lock().unwrap();
        Arc::clone(
            auths
                .entry(tenant.map(str::to_string))
                .or_insert_with(|| Arc::new(MockAuth::new(tenant))),
        )
    }

    fn log(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

#[async_trait]
impl SignInCallbacks for MockCallbacks {
    async fn auth_for_tenant(
        &self,
        _api_key: &str,
        tenant_id: Option<&str>,
    ) -> Result<Arc<dyn TenantAuth>> {
        Ok(self.auth_for(tenant_id))
    }

    async fn start_sign_in(
        &self,
        auth: Arc<dyn TenantAuth>,
        hint: Option<&SelectedTenantInfo>,
    ) -> Result<AuthUser> {
        self.log(match hint {
            Some(hint) => format!("sign_in:hint={}", hint.tenant_id.as_deref().unwrap_or("-")),
            None => "sign_in".to_string(),
        });
        let user = self
            .sign_in_user
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AuthGateError::Internal("no scripted sign-in user".to_string()))?;
        // Interactive sign-in leaves a live session on the client.
        self.auth_for(auth.tenant_id().as_deref()).set_user(user.clone());
        Ok(user)
    }

    async fn complete_sign_out(&self) -> Result<()> {
        self.log("complete_sign_out");
        Ok(())
    }

    fn has_select_tenant(&self) -> bool {
        self.selection.lock().unwrap().is_some()
    }

    async fn select_tenant(
        &self,
        _project_config: &authgate_signin::ProjectConfig,
        _tenant_ids: &[String],
    ) -> Result<SelectedTenantInfo> {
        self.log("select_tenant");
        self.selection
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AuthGateError::Internal("no scripted selection".to_string()))
    }

    async fn show_progress(&self) {
        self.log("show");
    }

    async fn hide_progress(&self) {
        self.log("hide");
    }

    async fn handle_error(&self, error: &AuthGateError) {
        self.log(format!("error:{}", error.code()));
    }
}

/// One scenario's wiring: wiremock backend, temp storage, mock host.
pub struct TestContext {
    pub server: MockServer,
    pub temp: TempDir,
    pub env: Arc<MockEnv>,
    pub callbacks: Arc<MockCallbacks>,
}

impl TestContext {
    /// Build a context whose page URL may reference the backend via the
    /// `{gateway}` placeholder.
    pub async fn new(page_url_template: &str) -> Self {
        let server = MockServer::start().await;
        let page_url =
            page_url_template.replace("{gateway}", &format!("{}/gateway/auth", server.uri()));
        Self {
            server,
            temp: TempDir::new().unwrap(),
            env: Arc::new(MockEnv::new(&page_url)),
            callbacks: Arc::new(MockCallbacks::new()),
        }
    }

    pub fn gateway_url(&self) -> String {
        format!("{}/gateway/auth", self.server.uri())
    }

    pub fn storage_paths(&self) -> StoragePaths {
        StoragePaths {
            durable_dir: self.temp.path().join("durable"),
            session_dir: self.temp.path().join("session"),
        }
    }

    pub fn authentication(&self) -> Authentication {
        let options = AuthenticationOptions {
            identity_base_url: self.server.uri(),
            storage_paths: self.storage_paths(),
            app_id: None,
        };
        Authentication::new(
            Arc::clone(&self.env) as Arc<dyn Environment>,
            Arc::clone(&self.callbacks) as Arc<dyn SignInCallbacks>,
            options,
        )
        .unwrap()
    }

    /// A fresh view of the persisted tenant set.
    pub fn tenant_list(&self) -> TenantListManager {
        let storage = Arc::new(StorageManager::new(&self.storage_paths(), None));
        TenantListManager::new(storage, PROJECT_ID)
    }

    /// Mount the identity-platform lookup with the standard project.
    pub async fn mock_identity(&self, authorized_domains: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/projectConfig"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "projectId": PROJECT_ID,
                "authorizedDomains": authorized_domains,
            })))
            .mount(&self.server)
            .await;
    }

    /// Domains matching both the page origin and the wiremock gateway.
    pub fn standard_domains() -> Vec<&'static str> {
        vec!["example.com", "127.0.0.1", "localhost"]
    }
}

pub fn user(uid: &str, tenant: Option<&str>) -> AuthUser {
    AuthUser {
        uid: uid.to_string(),
        email: Some(format!("{uid}@example.com")),
        tenant_id: tenant.map(str::to_string),
    }
}
