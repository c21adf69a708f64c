//! `reqwest`-backed agent transport.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use url::Url;

use crate::application::ports::AgentTransport;
use crate::domain::{HttpMethod, RequestSpec, WrappedResponse};
use crate::infra::response::wrap_response;

/// Sends [`RequestSpec`]s over a shared connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build agent HTTP client")?;
        Ok(Self { client })
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl AgentTransport for ReqwestTransport {
    async fn send(&self, base: &Url, request: &RequestSpec) -> Result<WrappedResponse> {
        send(&self.client, base, request).await
    }
}

/// Build `request` against `base`, send it, and wrap whatever comes back.
///
/// Any status code is a successful send. A request carrying its own
/// `timeout` overrides the client's default.
///
/// # Errors
///
/// Returns an error if the URL cannot be resolved, the connection fails or
/// times out, or the body cannot be read.
pub async fn send(
    client: &reqwest::Client,
    base: &Url,
    request: &RequestSpec,
) -> Result<WrappedResponse> {
    let url = request.resolve_url(base)?;
    tracing::debug!(method = %request.method, %url, "sending agent request");

    let mut builder = client
        .request(method(request.method), url.clone())
        .header(ACCEPT, request.accept.as_str());
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }
    if let Some(timeout) = request.timeout {
        builder = builder.timeout(timeout);
    }

    let response = builder
        .send()
        .await
        .with_context(|| format!("{} {url} failed", request.method))?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .bytes()
        .await
        .with_context(|| format!("failed to read response body from {url}"))?;
    tracing::debug!(%url, status = status.as_u16(), "agent responded");
    Ok(wrap_response(status, &headers, &body))
}

fn method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}
