//! The facade the host page drives.
//!
//! Parses the operation configuration, owns the shared settings, builds
//! one handler per operation, and bridges same-document navigation events
//! into fresh handler instances.

use crate::callbacks::SignInCallbacks;
use crate::config::{OperationConfig, OperationMode};
use crate::environment::{
    navigation_channel, Environment, NavigationReceiver, NavigationSender,
};
use crate::handler::{FlowState, OperationHandler};
use crate::select_tenant::SelectTenantHandler;
use crate::settings::SharedSettings;
use crate::sign_in::SignInHandler;
use crate::sign_out::SignOutHandler;
use authgate_api::DEFAULT_IDENTITY_BASE_URL;
use authgate_core::{AuthGateError, Result};
use authgate_store::StoragePaths;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Host wiring for the facade.
#[derive(Debug, Clone)]
pub struct AuthenticationOptions {
    /// Identity-platform endpoint prefix.
    pub identity_base_url: String,
    /// Directories backing durable and session persistence.
    pub storage_paths: StoragePaths,
    /// Distinguishes co-hosted applications sharing one storage scope.
    pub app_id: Option<String>,
}

impl AuthenticationOptions {
    /// Options with the default identity endpoint.
    #[must_use]
    pub fn new(storage_paths: StoragePaths) -> Self {
        Self {
            identity_base_url: DEFAULT_IDENTITY_BASE_URL.to_string(),
            storage_paths,
            app_id: None,
        }
    }
}

/// The current handler, or the construction failure deferred to `start()`.
enum HandlerSlot {
    Ready(Box<dyn OperationHandler>),
    Deferred(AuthGateError),
}

/// Entry point: one instance per sign-in page load.
pub struct Authentication {
    env: Arc<dyn Environment>,
    callbacks: Arc<dyn SignInCallbacks>,
    settings: Arc<SharedSettings>,
    slot: Mutex<HandlerSlot>,
    receiver: Mutex<NavigationReceiver>,
    nav_sender: NavigationSender,
}

impl Authentication {
    /// Parse the current navigation target and prepare its handler.
    ///
    /// Configuration problems (missing API key, unknown mode, missing
    /// operation fields) are captured and deferred: they surface through
    /// the error hook when [`start`](Self::start) runs, never from here.
    /// Only host-wiring failures are immediate.
    pub fn new(
        env: Arc<dyn Environment>,
        callbacks: Arc<dyn SignInCallbacks>,
        options: AuthenticationOptions,
    ) -> Result<Self> {
        let (nav_sender, receiver) = navigation_channel();
        let config = OperationConfig::from_environment(env.as_ref());

        let settings = Arc::new(SharedSettings::new(
            config.api_key.clone().unwrap_or_default(),
            &options.identity_base_url,
            &options.storage_paths,
            options.app_id,
            &env.user_agent(),
            nav_sender.clone(),
        )?);

        let slot = match build_handler(&config, &settings, &env, &callbacks) {
            Ok(handler) => HandlerSlot::Ready(handler),
            Err(e) => HandlerSlot::Deferred(e),
        };

        Ok(Self {
            env,
            callbacks,
            settings,
            slot: Mutex::new(slot),
            receiver: Mutex::new(receiver),
            nav_sender,
        })
    }

    /// A sender hosts can use to report native same-document traversal.
    #[must_use]
    pub fn navigation_sender(&self) -> NavigationSender {
        self.nav_sender.clone()
    }

    /// Drive the current operation.
    ///
    /// Every failure has already been reported through the error hook when
    /// this returns; calling `start()` again retries, replaying memoized
    /// steps for free.
    pub async fn start(&self) -> Result<()> {
        let slot = self.slot.lock().await;
        match &*slot {
            HandlerSlot::Ready(handler) => handler.start().await,
            HandlerSlot::Deferred(error) => {
                tracing::warn!(code = error.code(), error = %error, "Deferred construction failure");
                self.callbacks.handle_error(error).await;
                Err(error.clone())
            }
        }
    }

    /// Retry the current operation after a failure.
    pub async fn retry(&self) -> Result<()> {
        self.start().await
    }

    /// The pre-authentication target URL, for host-page UI.
    pub async fn original_url(&self) -> Result<Option<String>> {
        let slot = self.slot.lock().await;
        match &*slot {
            HandlerSlot::Ready(handler) => handler.original_url().await,
            HandlerSlot::Deferred(error) => Err(error.clone()),
        }
    }

    /// Protocol state of the current operation, when one was constructed.
    pub async fn state(&self) -> Option<FlowState> {
        let slot = self.slot.lock().await;
        match &*slot {
            HandlerSlot::Ready(handler) => Some(handler.state()),
            HandlerSlot::Deferred(_) => None,
        }
    }

    /// Wait for the next same-document transition, build its handler, and
    /// drive it. `Ok(false)` once the event channel has closed.
    ///
    /// Transitions are handled one at a time: the previous handler's
    /// `start()` has settled before the next handler exists, so no two
    /// handlers of one facade ever run concurrently.
    pub async fn process_next_transition(&self) -> Result<bool> {
        let event = self.receiver.lock().await.recv().await;
        let Some(event) = event else {
            return Ok(false);
        };
        tracing::debug!(url = %event.url, "Same-document transition");

        let config = OperationConfig::from_environment(self.env.as_ref());
        let next = match build_handler(&config, &self.settings, &self.env, &self.callbacks) {
            Ok(handler) => HandlerSlot::Ready(handler),
            Err(e) => HandlerSlot::Deferred(e),
        };
        *self.slot.lock().await = next;

        self.start().await?;
        Ok(true)
    }

    /// Event loop for the page lifetime: drive the initial operation, then
    /// every chained transition until the channel closes or an operation
    /// fails.
    pub async fn run(&self) -> Result<()> {
        self.start().await?;
        while self.process_next_transition().await? {}
        Ok(())
    }
}

/// Select and construct the handler for a parsed configuration.
fn build_handler(
    config: &OperationConfig,
    settings: &Arc<SharedSettings>,
    env: &Arc<dyn Environment>,
    callbacks: &Arc<dyn SignInCallbacks>,
) -> Result<Box<dyn OperationHandler>> {
    if settings.api_key.is_empty() {
        return Err(AuthGateError::InvalidArgument(
            "missing API key in page URL".to_string(),
        ));
    }

    let settings = Arc::clone(settings);
    let env = Arc::clone(env);
    let callbacks = Arc::clone(callbacks);

    match config.mode {
        OperationMode::Login => Ok(Box::new(SignInHandler::new(
            config, settings, env, callbacks, false,
        )?)),
        OperationMode::Reauth => Ok(Box::new(SignInHandler::new(
            config, settings, env, callbacks, true,
        )?)),
        OperationMode::Signout => Ok(Box::new(SignOutHandler::new(
            config, settings, env, callbacks,
        ))),
        OperationMode::SelectAuthSession => Ok(Box::new(SelectTenantHandler::new(
            config, settings, env, callbacks,
        )?)),
        OperationMode::Unknown => Err(AuthGateError::InvalidArgument(
            "unsupported operation mode in page URL".to_string(),
        )),
    }
}
