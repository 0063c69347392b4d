//! Operation configuration parsed from the navigation target.
//!
//! One [`OperationConfig`] is parsed per page load or per chained
//! same-document transition. It is immutable; the facade discards it with
//! the handler it built from it.

use crate::environment::Environment;
use authgate_core::{sanitize_redirect_url, TenantKey};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;
use url::Url;

/// Discriminator a navigation payload must carry to count as a sign-in
/// continuation.
pub(crate) const SIGN_IN_CONTINUATION: &str = "signIn";

/// Hash-fragment prefix of the legacy selection hint.
const HASH_HINT_PREFIX: &str = "hint=";

/// The operation requested by the page URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Establish a session, reusing an existing sign-in when possible.
    Login,
    /// Establish a session, forcing interactive re-authentication.
    Reauth,
    /// End one or all recorded tenant sessions.
    Signout,
    /// Let the user pick a tenant before signing in.
    SelectAuthSession,
    /// Anything else; rejected when the handler starts.
    Unknown,
}

impl OperationMode {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("login") => OperationMode::Login,
            Some("reauth") => OperationMode::Reauth,
            Some("signout") => OperationMode::Signout,
            Some("selectAuthSession") => OperationMode::SelectAuthSession,
            _ => OperationMode::Unknown,
        }
    }

    /// The wire value carried in the `mode` query parameter.
    #[must_use]
    pub fn as_wire(&self) -> Option<&'static str> {
        match self {
            OperationMode::Login => Some("login"),
            OperationMode::Reauth => Some("reauth"),
            OperationMode::Signout => Some("signout"),
            OperationMode::SelectAuthSession => Some("selectAuthSession"),
            OperationMode::Unknown => None,
        }
    }
}

/// A tenant-selection hint carried across the selection → sign-in
/// transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedTenantInfo {
    /// Email the user identified with, when known and well-formed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Raw tenant key of the selection; `None` selects the project-level
    /// namespace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Sign-in providers to offer, already shape-checked.
    #[serde(default)]
    pub provider_ids: Vec<String>,
}

/// Immutable descriptor of the operation the current URL requests.
#[derive(Debug, Clone)]
pub struct OperationConfig {
    pub mode: OperationMode,
    pub api_key: Option<String>,
    pub tid: Option<TenantKey>,
    /// Sanitized redirect target; unsafe schemes read as `about:invalid`.
    pub redirect_url: Option<String>,
    pub state: Option<String>,
    pub hl: Option<String>,
    pub selected_tenant_info: Option<SelectedTenantInfo>,
}

impl OperationConfig {
    /// Parse the host's current navigation target.
    #[must_use]
    pub fn from_environment(env: &dyn Environment) -> Self {
        Self::parse(&env.current_url(), env.navigation_payload().as_ref())
    }

    /// Parse a navigation target and optional same-document payload.
    #[must_use]
    pub fn parse(url: &Url, payload: Option<&Value>) -> Self {
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let non_empty = |name: &str| query.get(name).filter(|v| !v.is_empty()).cloned();

        let mode = OperationMode::parse(query.get("mode").map(String::as_str));
        let tid: Option<TenantKey> = non_empty("tid").and_then(|raw| raw.parse().ok());
        let redirect_url = non_empty("redirect_uri").map(|raw| sanitize_redirect_url(&raw));
        let selected_tenant_info = resolve_selected_tenant_info(url, payload, tid.as_ref());

        Self {
            mode,
            api_key: non_empty("apiKey"),
            tid,
            redirect_url,
            state: non_empty("state"),
            hl: non_empty("hl"),
            selected_tenant_info,
        }
    }
}

/// Resolve the selection hint with payload priority, then cross-check it
/// against the URL's own tenant identity.
///
/// A hint whose tenant (after project-marker normalization) differs from
/// the URL's `tid` is a stale or foreign selection and is discarded whole.
fn resolve_selected_tenant_info(
    url: &Url,
    payload: Option<&Value>,
    tid: Option<&TenantKey>,
) -> Option<SelectedTenantInfo> {
    let tid = tid?;

    // Payload priority: a host that attaches navigation payloads never
    // falls back to the legacy hash.
    let info = match payload {
        Some(payload) => payload_selection(payload)?,
        None => hash_selection(url, tid)?,
    };

    let selected = info
        .tenant_id
        .as_deref()
        .filter(|raw| !raw.starts_with('_'));
    if selected == tid.auth_tenant_id() {
        Some(info)
    } else {
        tracing::debug!("Discarding selection hint with mismatched tenant identity");
        None
    }
}

/// Selection hint from the navigation payload.
///
/// Only a payload whose discriminator marks it as a sign-in continuation
/// carries a hint; anything else resolves to no hint at all.
fn payload_selection(payload: &Value) -> Option<SelectedTenantInfo> {
    if payload.get("state").and_then(Value::as_str) != Some(SIGN_IN_CONTINUATION) {
        return None;
    }
    let raw = payload.get("selectedTenantInfo")?;
    Some(SelectedTenantInfo {
        email: raw
            .get("email")
            .and_then(Value::as_str)
            .filter(|email| is_valid_email(email))
            .map(str::to_string),
        tenant_id: raw
            .get("tenantId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        provider_ids: sanitize_provider_ids(raw.get("providerIds")),
    })
}

/// Selection hint from the legacy `#hint=<email>;<p1>,<p2>,...` fragment,
/// for hosts that cannot attach navigation payloads.
///
/// The fragment carries no tenant of its own; the hint inherits the URL's
/// `tid`.
fn hash_selection(url: &Url, tid: &TenantKey) -> Option<SelectedTenantInfo> {
    let fragment = url.fragment()?;
    let hint = fragment.strip_prefix(HASH_HINT_PREFIX)?;
    let (raw_email, raw_providers) = hint.split_once(';').unwrap_or((hint, ""));

    let email = urlencoding::decode(raw_email)
        .ok()
        .map(|decoded| decoded.into_owned())
        .filter(|decoded| is_valid_email(decoded));
    let provider_ids = raw_providers
        .split(',')
        .map(str::trim)
        .filter(|id| is_valid_provider_id(id))
        .map(str::to_string)
        .collect();

    Some(SelectedTenantInfo {
        email,
        tenant_id: Some(tid.as_wire()),
        provider_ids,
    })
}

/// Drop anything that is not an array of well-shaped provider ids.
fn sanitize_provider_ids(raw: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|id| is_valid_provider_id(id))
        .map(str::to_string)
        .collect()
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern")
    })
}

fn provider_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid provider pattern"))
}

fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

fn is_valid_provider_id(id: &str) -> bool {
    !id.is_empty() && provider_id_pattern().is_match(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(url: &str, payload: Option<Value>) -> OperationConfig {
        OperationConfig::parse(&Url::parse(url).unwrap(), payload.as_ref())
    }

    #[test]
    fn test_all_fields_round_trip() {
        let config = parse(
            "https://auth.example.com/signin?mode=login&apiKey=key-1&tid=tenant-a\
             &redirect_uri=https%3A%2F%2Fgateway.example.com%2Fauth&state=st-1&hl=de",
            None,
        );

        assert_eq!(config.mode, OperationMode::Login);
        assert_eq!(config.api_key.as_deref(), Some("key-1"));
        assert_eq!(config.tid, Some("tenant-a".parse().unwrap()));
        assert_eq!(
            config.redirect_url.as_deref(),
            Some("https://gateway.example.com/auth")
        );
        assert_eq!(config.state.as_deref(), Some("st-1"));
        assert_eq!(config.hl.as_deref(), Some("de"));
    }

    #[test]
    fn test_unknown_and_missing_modes() {
        assert_eq!(
            parse("https://a.example.com/?mode=whatever", None).mode,
            OperationMode::Unknown
        );
        assert_eq!(
            parse("https://a.example.com/", None).mode,
            OperationMode::Unknown
        );
    }

    #[test]
    fn test_unsafe_redirect_scheme_replaced() {
        let config = parse(
            "https://a.example.com/?mode=login&redirect_uri=javascript%3Aalert(1)",
            None,
        );
        assert_eq!(config.redirect_url.as_deref(), Some("about:invalid"));
    }

    #[test]
    fn test_project_marker_tid() {
        let config = parse("https://a.example.com/?mode=login&tid=_project-1", None);
        let tid = config.tid.unwrap();
        assert!(tid.is_project_level());
        assert_eq!(tid.auth_tenant_id(), None);
    }

    #[test]
    fn test_payload_selection_with_matching_tenant() {
        let payload = json!({
            "state": "signIn",
            "selectedTenantInfo": {
                "email": "user@example.com",
                "tenantId": "tenant-a",
                "providerIds": ["oidc.corp", "saml.legacy"],
            }
        });
        let config = parse(
            "https://a.example.com/?mode=login&tid=tenant-a",
            Some(payload),
        );

        let info = config.selected_tenant_info.unwrap();
        assert_eq!(info.email.as_deref(), Some("user@example.com"));
        assert_eq!(info.tenant_id.as_deref(), Some("tenant-a"));
        assert_eq!(info.provider_ids, vec!["oidc.corp", "saml.legacy"]);
    }

    #[test]
    fn test_selection_null_without_tid() {
        let payload = json!({
            "state": "signIn",
            "selectedTenantInfo": {"tenantId": "tenant-a"},
        });
        let config = parse("https://a.example.com/?mode=login", Some(payload));
        assert!(config.selected_tenant_info.is_none());
    }

    #[test]
    fn test_selection_discarded_on_tenant_mismatch() {
        let payload = json!({
            "state": "signIn",
            "selectedTenantInfo": {"tenantId": "tenant-b"},
        });
        let config = parse(
            "https://a.example.com/?mode=login&tid=tenant-a",
            Some(payload),
        );
        assert!(config.selected_tenant_info.is_none());
    }

    #[test]
    fn test_project_marker_normalization_in_cross_check() {
        // A marker-form hint against a marker-form tid resolves equal.
        let payload = json!({
            "state": "signIn",
            "selectedTenantInfo": {"tenantId": "_project-1"},
        });
        let config = parse(
            "https://a.example.com/?mode=login&tid=_project-1",
            Some(payload),
        );
        assert!(config.selected_tenant_info.is_some());

        // A real-tenant hint against a marker-form tid does not.
        let payload = json!({
            "state": "signIn",
            "selectedTenantInfo": {"tenantId": "tenant-a"},
        });
        let config = parse(
            "https://a.example.com/?mode=login&tid=_project-1",
            Some(payload),
        );
        assert!(config.selected_tenant_info.is_none());
    }

    #[test]
    fn test_payload_with_wrong_discriminator_yields_no_hint() {
        // A host that attaches payloads never consults the legacy hash.
        let payload = json!({"state": "somethingElse"});
        let config = parse(
            "https://a.example.com/?mode=login&tid=tenant-a#hint=user%40example.com;oidc.corp",
            Some(payload),
        );
        assert!(config.selected_tenant_info.is_none());
    }

    #[test]
    fn test_hash_hint_without_payload() {
        let config = parse(
            "https://a.example.com/?mode=login&tid=tenant-a#hint=user%40example.com;p1,p2",
            None,
        );
        let info = config.selected_tenant_info.unwrap();
        assert_eq!(info.provider_ids, vec!["p1", "p2"]);
    }

    #[test]
    fn test_invalid_email_dropped() {
        let payload = json!({
            "state": "signIn",
            "selectedTenantInfo": {"email": "not-an-email", "tenantId": "tenant-a"},
        });
        let config = parse(
            "https://a.example.com/?mode=login&tid=tenant-a",
            Some(payload),
        );
        assert!(config.selected_tenant_info.unwrap().email.is_none());
    }

    #[test]
    fn test_non_array_provider_ids_reset_to_empty() {
        let payload = json!({
            "state": "signIn",
            "selectedTenantInfo": {"tenantId": "tenant-a", "providerIds": "oidc.corp"},
        });
        let config = parse(
            "https://a.example.com/?mode=login&tid=tenant-a",
            Some(payload),
        );
        assert!(config.selected_tenant_info.unwrap().provider_ids.is_empty());
    }

    #[test]
    fn test_malformed_provider_ids_dropped() {
        let payload = json!({
            "state": "signIn",
            "selectedTenantInfo": {
                "tenantId": "tenant-a",
                "providerIds": [" oidc.corp ", "bad provider!", ""],
            }
        });
        let config = parse(
            "https://a.example.com/?mode=login&tid=tenant-a",
            Some(payload),
        );
        assert_eq!(
            config.selected_tenant_info.unwrap().provider_ids,
            vec!["oidc.corp"]
        );
    }

    #[test]
    fn test_selected_tenant_info_serializes_camel_case() {
        let info = SelectedTenantInfo {
            email: Some("user@example.com".to_string()),
            tenant_id: Some("tenant-a".to_string()),
            provider_ids: vec!["p1".to_string()],
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["tenantId"], "tenant-a");
        assert_eq!(json["providerIds"][0], "p1");
    }
}
