//! Host environment seam.
//!
//! The coordinator never touches the page directly. Everything it needs
//! from the host (the current navigation target, embedding information,
//! navigation capabilities, and same-document transition signals) flows
//! through [`Environment`] and the navigation-event channel.

use async_trait::async_trait;
use authgate_core::Result;
use serde_json::Value;
use tokio::sync::mpsc;
use url::Url;

/// A same-document navigation the facade should react to.
///
/// Emitted by the tenant-selection handler after a programmatic history
/// push (hosts do not emit one for those), and by hosts that observe
/// native back/forward traversal.
#[derive(Debug, Clone)]
pub struct NavigationEvent {
    /// The URL the document now shows.
    pub url: String,
}

/// Sending half of the navigation-event channel.
pub type NavigationSender = mpsc::UnboundedSender<NavigationEvent>;

/// Receiving half; the facade is the sole consumer.
pub type NavigationReceiver = mpsc::UnboundedReceiver<NavigationEvent>;

/// Create the single-consumer navigation-event channel.
#[must_use]
pub fn navigation_channel() -> (NavigationSender, NavigationReceiver) {
    mpsc::unbounded_channel()
}

/// What the coordinator needs from the page hosting it.
#[async_trait]
pub trait Environment: Send + Sync {
    /// The current navigation target, including query and fragment.
    fn current_url(&self) -> Url;

    /// The payload attached to the current history entry by a
    /// same-document transition, if any.
    fn navigation_payload(&self) -> Option<Value>;

    /// The host user agent string.
    fn user_agent(&self) -> String;

    /// Whether the sign-in surface is embedded in a cross-origin frame.
    fn is_embedded_frame(&self) -> bool;

    /// Whether the host can update navigation history without a reload and
    /// observe the synthesized event for it.
    fn supports_history_push(&self) -> bool;

    /// Push a history entry carrying `payload`, making `url` current.
    ///
    /// Only called when [`supports_history_push`](Self::supports_history_push)
    /// reports `true`.
    fn push_history_state(&self, payload: Value, url: &Url) -> Result<()>;

    /// Perform a real navigation, leaving the current document.
    async fn navigate(&self, url: &str) -> Result<()>;
}
