//! Authgate API Library
//!
//! Typed RPC clients for the two backends the sign-in coordinator talks
//! to, with their error shapes normalized into the shared taxonomy.
//!
//! # Modules
//!
//! - [`identity`] - identity-platform lookup and origin authorization
//! - [`gateway`] - token exchange, cookie set, session info
//! - [`models`] - wire request/response types with shape validation
//! - [`error_parse`] - backend error-encoding normalization
//! - [`http`] - shared client construction and timeouts

pub mod error_parse;
pub mod gateway;
pub mod http;
pub mod identity;
pub mod models;

pub use error_parse::{normalize_error_body, ApiErrorPayload};
pub use gateway::{GatewayApiClient, REDIRECT_TOKEN_HEADER};
pub use http::timeout_for_user_agent;
pub use identity::{IdentityApiClient, DEFAULT_IDENTITY_BASE_URL};
pub use models::{
    ExchangeTokenRequest, ProjectConfig, RedirectServerResponse, SessionInfoResponse,
};
