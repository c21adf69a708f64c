//! Application service: fleet membership resolution.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Every query refreshes from the injected [`MembershipSource`] first, so
//! answers always reflect the registry as of the call.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use url::Url;

use crate::application::ports::MembershipSource;
use crate::domain::{AgentRole, DiscoveryError, MembershipError, MembershipSnapshot, Selection};

/// Resolves agent ids and roles to endpoints from a live registry.
///
/// The snapshot is replaced wholesale on each refresh. A failed refresh
/// leaves it empty rather than stale.
pub struct MembershipResolver<S> {
    source: S,
    snapshot: Mutex<Arc<MembershipSnapshot>>,
}

impl<S: MembershipSource> MembershipResolver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            snapshot: Mutex::new(Arc::new(MembershipSnapshot::empty())),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The snapshot left by the most recent refresh, without refreshing.
    pub async fn current(&self) -> Arc<MembershipSnapshot> {
        Arc::clone(&*self.snapshot.lock().await)
    }

    /// Refresh, then return the whole snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipError::Discovery`] if the registry could not be
    /// read or held a malformed record.
    pub async fn snapshot(&self) -> Result<Arc<MembershipSnapshot>, MembershipError> {
        Ok(self.refresh().await?)
    }

    /// Every known agent.
    ///
    /// # Errors
    ///
    /// Fails if the refresh fails.
    pub async fn resolve_all(&self) -> Result<BTreeMap<String, Url>, MembershipError> {
        Ok(self.refresh().await?.endpoints())
    }

    /// Agents flagged as coordinators.
    ///
    /// # Errors
    ///
    /// Fails if the refresh fails.
    pub async fn resolve_coordinators(&self) -> Result<BTreeMap<String, Url>, MembershipError> {
        Ok(self
            .refresh()
            .await?
            .endpoints_with_role(AgentRole::Coordinator))
    }

    /// Agents not flagged as coordinators.
    ///
    /// # Errors
    ///
    /// Fails if the refresh fails.
    pub async fn resolve_workers(&self) -> Result<BTreeMap<String, Url>, MembershipError> {
        Ok(self.refresh().await?.endpoints_with_role(AgentRole::Worker))
    }

    /// Exactly the agents named in `ids`.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipError::UnknownAgents`] if any id is not in the
    /// registry or is requested more than once, or a discovery error if the
    /// refresh fails.
    pub async fn resolve_by_ids(
        &self,
        ids: &[String],
    ) -> Result<BTreeMap<String, Url>, MembershipError> {
        let snapshot = self.refresh().await?;
        let picked = snapshot.endpoints_for_ids(ids);
        if picked.len() == ids.len() {
            return Ok(picked);
        }

        let mut seen = BTreeSet::new();
        let mut unknown = Vec::new();
        let mut duplicated = Vec::new();
        for id in ids {
            if !seen.insert(id.as_str()) {
                if !duplicated.contains(id) {
                    duplicated.push(id.clone());
                }
            } else if snapshot.get(id).is_none() {
                unknown.push(id.clone());
            }
        }
        Err(MembershipError::UnknownAgents {
            unknown,
            duplicated,
        })
    }

    /// Dispatch on a [`Selection`].
    ///
    /// # Errors
    ///
    /// Same as the query the selection maps to.
    pub async fn resolve(
        &self,
        selection: &Selection,
    ) -> Result<BTreeMap<String, Url>, MembershipError> {
        match selection {
            Selection::All => self.resolve_all().await,
            Selection::Coordinators => self.resolve_coordinators().await,
            Selection::Workers => self.resolve_workers().await,
            Selection::Ids(ids) => self.resolve_by_ids(ids).await,
        }
    }

    /// Fetch, validate and swap in a new snapshot.
    ///
    /// The lock is held across the fetch so refreshes never interleave.
    async fn refresh(&self) -> Result<Arc<MembershipSnapshot>, DiscoveryError> {
        let mut current = self.snapshot.lock().await;
        let built = match self.source.fetch().await {
            Ok(records) => MembershipSnapshot::build(&records),
            Err(e) => Err(DiscoveryError::Source(e)),
        };
        match built {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *current = Arc::clone(&snapshot);
                tracing::debug!(agents = snapshot.len(), "membership refreshed");
                Ok(snapshot)
            }
            Err(e) => {
                *current = Arc::new(MembershipSnapshot::empty());
                match &e {
                    DiscoveryError::Source(cause) => {
                        tracing::warn!(error = %format!("{cause:#}"), "registry fetch failed; membership cleared");
                    }
                    other => {
                        tracing::warn!(error = %other, "registry listing rejected; membership cleared");
                    }
                }
                Err(e)
            }
        }
    }
}
