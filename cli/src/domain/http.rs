//! Plain-data descriptions of HTTP requests to agents and of their responses.
//!
//! A [`RequestSpec`] is a complete value: there is no builder object and no
//! partially constructed state. Sending one is the job of
//! `crate::infra::http`.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::error::RequestError;

/// Characters escaped when substituting a value into one path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to call one agent endpoint, minus the agent's base URI.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    /// Absolute path with `{name}` placeholders, e.g. `/v1/lifecycle/{action}`.
    pub path: String,
    /// Values for the placeholders in `path`.
    pub path_params: BTreeMap<String, String>,
    /// Query pairs, sent in order; a name may repeat.
    pub query: Vec<(String, String)>,
    /// Extra request headers; a name may repeat.
    pub headers: Vec<(String, String)>,
    /// JSON entity, sent with `Content-Type: application/json`.
    pub body: Option<serde_json::Value>,
    /// Media type for the `Accept` header.
    pub accept: String,
    /// Overall deadline for this request, replacing the transport's default.
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    /// A bare request with no parameters, headers or body, accepting `text/plain`.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            path_params: BTreeMap::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            accept: TEXT_PLAIN.to_string(),
            timeout: None,
        }
    }

    /// Resolve the full target URL against an agent's base URI.
    ///
    /// Placeholders are substituted with percent-encoded values, the path is
    /// appended to the base path, and query pairs replace any query the base
    /// carried.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] if a placeholder has no value or is not
    /// closed, or if `base` cannot carry a path.
    pub fn resolve_url(&self, base: &Url) -> Result<Url, RequestError> {
        if base.cannot_be_a_base() {
            return Err(RequestError::InvalidBase(base.to_string()));
        }
        let path = self.expand_path()?;

        let mut url = base.clone();
        let joined = format!(
            "{}/{}",
            base.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url.set_query(None);
        url.set_fragment(None);
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    fn expand_path(&self) -> Result<String, RequestError> {
        let mut expanded = String::with_capacity(self.path.len());
        let mut rest = self.path.as_str();
        while let Some(open) = rest.find('{') {
            expanded.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| RequestError::UnterminatedTemplate(self.path.clone()))?;
            let name = &after[..close];
            let value =
                self.path_params
                    .get(name)
                    .ok_or_else(|| RequestError::UnresolvedTemplate {
                        path: self.path.clone(),
                        name: name.to_string(),
                    })?;
            expanded.extend(utf8_percent_encode(value, PATH_SEGMENT));
            rest = &after[close + 1..];
        }
        expanded.push_str(rest);
        Ok(expanded)
    }
}

/// Status, headers and decoded body of an agent response.
///
/// `body` is JSON when the agent answered `application/json`, a JSON string
/// for any other content type, or `{"error": "..."}` when the body could
/// not be decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedResponse {
    pub status: u16,
    pub reason_phrase: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: serde_json::Value,
}

impl WrappedResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value of header `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}
