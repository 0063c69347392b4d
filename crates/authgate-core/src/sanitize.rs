//! Redirect-URL sanitization.
//!
//! The redirect target arrives in the page URL and is attacker-influenced.
//! Anything that is not a plain web origin is replaced wholesale with a
//! fixed inert value before it can reach a navigation call.

use url::Url;

/// Inert value substituted for redirect URLs with unsafe schemes.
pub const INERT_URL: &str = "about:invalid";

/// Schemes a redirect target is allowed to carry.
const SAFE_SCHEMES: &[&str] = &["http", "https", "chrome-extension"];

/// Replace a redirect URL with [`INERT_URL`] unless it parses as an
/// absolute URL with a safe scheme.
#[must_use]
pub fn sanitize_redirect_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) if SAFE_SCHEMES.contains(&url.scheme()) => raw.to_string(),
        _ => INERT_URL.to_string(),
    }
}
