//! Backend error-shape normalization.
//!
//! The two backends report failures in at least three incompatible
//! encodings. Each encoding gets its own parser strategy; all of them feed
//! the single [`ApiErrorPayload`] shape so handler logic never branches on
//! backend-specific text.
//!
//! Encodings, in the order they are tried:
//!
//! 1. Structured JSON: `{"error": {"code": 400, "status": "INVALID_API_KEY",
//!    "message": "..."}}`
//! 2. JSON with a colon-delimited sub-code embedded in the message:
//!    `{"error": {"code": 401, "message": "RESTART_PROCESS: state expired"}}`
//! 3. A plain-text banner with an embedded numeric code:
//!    `"There was an error handling the request. Error code 37."`

use authgate_core::AuthGateError;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// One normalized backend error: HTTP status, string sub-code, message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorPayload {
    pub status: u16,
    pub code: String,
    pub message: String,
}

impl From<ApiErrorPayload> for AuthGateError {
    fn from(payload: ApiErrorPayload) -> Self {
        AuthGateError::Api {
            status: payload.status,
            code: payload.code,
            message: payload.message,
        }
    }
}

/// Envelope for the JSON error encodings.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Encoding 1: structured JSON with an explicit status field.
fn parse_structured_json(http_status: u16, body: &str) -> Option<ApiErrorPayload> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let status_code = envelope.error.status?;
    Some(ApiErrorPayload {
        status: envelope.error.code.unwrap_or(http_status),
        code: status_code,
        message: envelope.error.message.unwrap_or_default(),
    })
}

/// Encoding 2: JSON whose message embeds `SUB_CODE: details`.
///
/// The sub-code is the upper-case token before the first colon; a message
/// with no such token normalizes with the whole message and an `UNKNOWN`
/// sub-code.
fn parse_coded_message(http_status: u16, body: &str) -> Option<ApiErrorPayload> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let message = envelope.error.message?;
    let status = envelope.error.code.unwrap_or(http_status);

    match message.split_once(':') {
        Some((code, detail)) if is_sub_code(code) => Some(ApiErrorPayload {
            status,
            code: code.trim().to_string(),
            message: detail.trim().to_string(),
        }),
        _ => Some(ApiErrorPayload {
            status,
            code: "UNKNOWN".to_string(),
            message,
        }),
    }
}

fn is_sub_code(token: &str) -> bool {
    let token = token.trim();
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

fn banner_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?:error\s+)?code[:\s]+(\d{1,3})\b").expect("valid banner pattern")
    })
}

/// Encoding 3: a plain-text banner with an embedded numeric code.
fn parse_text_banner(http_status: u16, body: &str) -> Option<ApiErrorPayload> {
    let captures = banner_code_pattern().captures(body)?;
    Some(ApiErrorPayload {
        status: http_status,
        code: captures[1].to_string(),
        message: body.trim().to_string(),
    })
}

/// Normalize an error-response body into one [`ApiErrorPayload`].
///
/// Strategies run in declaration order; a body no strategy understands
/// still yields a payload carrying the HTTP status and the raw text.
#[must_use]
pub fn normalize_error_body(http_status: u16, body: &str) -> ApiErrorPayload {
    parse_structured_json(http_status, body)
        .or_else(|| parse_coded_message(http_status, body))
        .or_else(|| parse_text_banner(http_status, body))
        .unwrap_or_else(|| ApiErrorPayload {
            status: http_status,
            code: "UNKNOWN".to_string(),
            message: if body.trim().is_empty() {
                format!("HTTP {http_status}")
            } else {
                body.trim().to_string()
            },
        })
}
