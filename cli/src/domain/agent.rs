//! Agent identity, role and the membership snapshot built from registry records.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use fleet_common::{keys, parse_coordinator_flag};
use serde::{Deserialize, Serialize};
use url::Url;

pub use fleet_common::AgentRole;

use crate::domain::error::DiscoveryError;

/// One raw entry as returned by a registry, before any validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub node_id: String,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl RegistryRecord {
    pub fn new<I, K, V>(node_id: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            node_id: node_id.into(),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// A validated agent: unique id, endpoint and role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentDescriptor {
    pub id: String,
    pub endpoint: Url,
    pub role: AgentRole,
}

impl AgentDescriptor {
    /// Validate one registry record.
    ///
    /// The endpoint must parse as an absolute URI; the role comes from the
    /// coordinator flag alone.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::MissingAddress`] or
    /// [`DiscoveryError::InvalidAddress`].
    pub fn from_record(record: &RegistryRecord) -> Result<Self, DiscoveryError> {
        let raw = record
            .property(keys::ADDRESS)
            .ok_or_else(|| DiscoveryError::MissingAddress {
                id: record.node_id.clone(),
                key: keys::ADDRESS,
            })?;
        let endpoint = Url::parse(raw).map_err(|source| DiscoveryError::InvalidAddress {
            id: record.node_id.clone(),
            raw: raw.to_string(),
            source,
        })?;
        let is_coordinator = parse_coordinator_flag(record.property(keys::COORDINATOR));
        Ok(Self {
            id: record.node_id.clone(),
            endpoint,
            role: AgentRole::from_coordinator_flag(is_coordinator),
        })
    }

    #[must_use]
    pub fn is_coordinator(&self) -> bool {
        self.role == AgentRole::Coordinator
    }
}

/// Which agents a query or dispatch targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Coordinators,
    Workers,
    Ids(Vec<String>),
}

/// Immutable, point-in-time set of agents keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSnapshot {
    agents: BTreeMap<String, AgentDescriptor>,
}

impl MembershipSnapshot {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from a full registry listing.
    ///
    /// All-or-nothing: the first malformed record or repeated id fails the
    /// whole build and nothing partial is returned.
    ///
    /// # Errors
    ///
    /// Returns the first [`DiscoveryError`] met.
    pub fn build(records: &[RegistryRecord]) -> Result<Self, DiscoveryError> {
        let mut agents = BTreeMap::new();
        for record in records {
            let agent = AgentDescriptor::from_record(record)?;
            if agents.contains_key(&agent.id) {
                return Err(DiscoveryError::DuplicateId(agent.id));
            }
            agents.insert(agent.id.clone(), agent);
        }
        Ok(Self { agents })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AgentDescriptor> {
        self.agents.get(id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.values()
    }

    /// `id → endpoint` for every agent.
    #[must_use]
    pub fn endpoints(&self) -> BTreeMap<String, Url> {
        self.collect(|_| true)
    }

    /// `id → endpoint` for agents holding `role`.
    #[must_use]
    pub fn endpoints_with_role(&self, role: AgentRole) -> BTreeMap<String, Url> {
        self.collect(|agent| agent.role == role)
    }

    /// `id → endpoint` for the agents among `ids`; unknown ids are skipped.
    #[must_use]
    pub fn endpoints_for_ids(&self, ids: &[String]) -> BTreeMap<String, Url> {
        let wanted: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
        self.collect(|agent| wanted.contains(agent.id.as_str()))
    }

    fn collect(&self, keep: impl Fn(&AgentDescriptor) -> bool) -> BTreeMap<String, Url> {
        self.agents
            .values()
            .filter(|agent| keep(agent))
            .map(|agent| (agent.id.clone(), agent.endpoint.clone()))
            .collect()
    }
}
