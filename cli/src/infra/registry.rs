//! Membership sources: a registry file on disk and a discovery service.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

use crate::application::ports::MembershipSource;
use crate::domain::RegistryRecord;

// ── Static registry ───────────────────────────────────────────────────────────

/// Agent listing kept in a YAML (or JSON) file, re-read on every fetch.
///
/// The file is either a bare list of records or a map with an `agents` list:
///
/// ```yaml
/// agents:
///   - node_id: coordinator-1
///     properties:
///       http: http://10.0.0.1:8080
///       configured-presto-coordinator: "true"
/// ```
#[derive(Debug, Clone)]
pub struct StaticRegistry {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    List(Vec<RegistryRecord>),
    Wrapped { agents: Vec<RegistryRecord> },
}

impl StaticRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MembershipSource for StaticRegistry {
    async fn fetch(&self) -> Result<Vec<RegistryRecord>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read registry file {}", self.path.display()))?;
        let file: RegistryFile = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse registry file {}", self.path.display()))?;
        Ok(match file {
            RegistryFile::List(agents) | RegistryFile::Wrapped { agents } => agents,
        })
    }
}

// ── Discovery service ─────────────────────────────────────────────────────────

/// Client for a discovery service exposing `GET /v1/service/{type}`.
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    http: reqwest::Client,
    base: Url,
    service_type: String,
}

#[derive(Deserialize)]
struct ServiceListing {
    #[serde(default)]
    services: Vec<ServiceEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceEntry {
    node_id: String,
    #[serde(default)]
    properties: HashMap<String, String>,
}

impl DiscoveryClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base: Url, service_type: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build discovery HTTP client")?;
        Ok(Self::with_client(http, base, service_type))
    }

    pub fn with_client(http: reqwest::Client, base: Url, service_type: impl Into<String>) -> Self {
        Self {
            http,
            base,
            service_type: service_type.into(),
        }
    }

    fn listing_url(&self) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("discovery URI {} cannot be a base", self.base))?
            .pop_if_empty()
            .extend(["v1", "service", self.service_type.as_str()]);
        Ok(url)
    }
}

impl MembershipSource for DiscoveryClient {
    async fn fetch(&self) -> Result<Vec<RegistryRecord>> {
        let url = self.listing_url()?;
        tracing::debug!(%url, "querying discovery service");
        let listing: ServiceListing = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("discovery request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("discovery service at {url} returned an error"))?
            .json()
            .await
            .with_context(|| format!("invalid discovery response from {url}"))?;
        Ok(listing
            .services
            .into_iter()
            .map(|entry| RegistryRecord {
                node_id: entry.node_id,
                properties: entry.properties,
            })
            .collect())
    }
}

// ── Configured source ─────────────────────────────────────────────────────────

/// The source picked on the command line.
#[derive(Debug, Clone)]
pub enum ConfiguredSource {
    File(StaticRegistry),
    Discovery(DiscoveryClient),
}

impl MembershipSource for ConfiguredSource {
    async fn fetch(&self) -> Result<Vec<RegistryRecord>> {
        match self {
            ConfiguredSource::File(registry) => registry.fetch().await,
            ConfiguredSource::Discovery(client) => client.fetch().await,
        }
    }
}
