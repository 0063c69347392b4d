//! Authgate Sign-In Coordinator
//!
//! Client-side coordinator for the redirect-based authentication handshake
//! between a gateway-protected resource and a multi-tenant identity
//! backend. The host sign-in page supplies the environment and the
//! interactive UI through traits; this crate supplies the protocol state
//! machines, the RPC plumbing, retry-safe memoization, and tenant
//! persistence.
//!
//! # Modules
//!
//! - [`config`] - operation descriptor parsed from the navigation target
//! - [`cache`] - request memoization for safe retries
//! - [`environment`] / [`callbacks`] - the host seams
//! - [`handler`] / [`sign_in`] / [`select_tenant`] / [`sign_out`] - the
//!   operation state machines
//! - [`authentication`] - the facade
//!
//! # Example
//!
//! ```rust,ignore
//! use authgate_signin::{Authentication, AuthenticationOptions};
//! use authgate_store::StoragePaths;
//! use std::sync::Arc;
//!
//! let auth = Authentication::new(
//!     Arc::new(my_environment),
//!     Arc::new(my_callbacks),
//!     AuthenticationOptions::new(StoragePaths {
//!         durable_dir: data_dir.join("authgate"),
//!         session_dir: session_dir.join("authgate"),
//!     }),
//! )?;
//!
//! // Drive the operation the page URL requests, then every chained
//! // same-document transition.
//! auth.run().await?;
//! ```

pub mod authentication;
pub mod cache;
pub mod callbacks;
pub mod config;
pub mod environment;
pub mod handler;
pub mod select_tenant;
pub mod settings;
pub mod sign_in;
pub mod sign_out;

pub use authentication::{Authentication, AuthenticationOptions};
pub use cache::OpCache;
pub use callbacks::{is_session_gone, AuthUser, SignInCallbacks, TenantAuth, SESSION_GONE_CODES};
pub use config::{OperationConfig, OperationMode, SelectedTenantInfo};
pub use environment::{
    navigation_channel, Environment, NavigationEvent, NavigationReceiver, NavigationSender,
};
pub use handler::{FlowState, OperationHandler};
pub use select_tenant::SelectTenantHandler;
pub use settings::SharedSettings;
pub use sign_in::SignInHandler;
pub use sign_out::SignOutHandler;

// Re-export the boundary types hosts interact with.
pub use authgate_api::{ProjectConfig, RedirectServerResponse, SessionInfoResponse};
pub use authgate_core::{AuthGateError, Result, TenantKey};
pub use authgate_store::{Persistence, StorageManager, StoragePaths, TenantListManager};
