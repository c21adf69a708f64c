//! Turning a raw HTTP response into a [`WrappedResponse`].

use std::collections::BTreeMap;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde_json::{Value, json};

use crate::domain::WrappedResponse;
use crate::domain::http::APPLICATION_JSON;

pub const JSON_PARSE_FAILURE: &str = "Could not parse response JSON";
pub const TEXT_PARSE_FAILURE: &str = "Could not parse response as String";

/// Wrap status, headers and body bytes.
///
/// Header names are lower-case; values that are not visible ASCII are
/// decoded lossily.
#[must_use]
pub fn wrap_response(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> WrappedResponse {
    let mut collected: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        collected
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    WrappedResponse {
        status: status.as_u16(),
        reason_phrase: status.canonical_reason().unwrap_or_default().to_string(),
        headers: collected,
        body: parse_body(content_type, body),
    }
}

/// Decode `body` according to `content_type`.
///
/// Never fails: undecodable bodies become a diagnostic `{"error": ...}` object.
#[must_use]
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Value {
    if is_json(content_type) {
        match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "agent response is not valid JSON");
                json!({ "error": JSON_PARSE_FAILURE })
            }
        }
    } else {
        match std::str::from_utf8(body) {
            Ok(text) => Value::String(text.to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "agent response is not valid UTF-8");
                json!({ "error": TEXT_PARSE_FAILURE })
            }
        }
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(APPLICATION_JSON))
}
