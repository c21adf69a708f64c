//! Shared fakes: an in-memory registry and a recording transport.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use fleet_common::{CommandOutcome, keys};
use fleet_controller::application::ports::{AgentTransport, MembershipSource};
use fleet_controller::domain::{RegistryRecord, RequestSpec, WrappedResponse};
use url::Url;

// ── Registry records ──────────────────────────────────────────────────────────

pub fn agent(id: &str, http: &str, coordinator: bool) -> RegistryRecord {
    RegistryRecord::new(
        id,
        [
            (keys::ADDRESS, http.to_string()),
            (keys::COORDINATOR, coordinator.to_string()),
        ],
    )
}

/// One coordinator `a` and two workers `b`, `c`.
pub fn small_fleet() -> Vec<RegistryRecord> {
    vec![
        agent("a", "http://a:8080", true),
        agent("b", "http://b:8080", false),
        agent("c", "http://c:8080", false),
    ]
}

pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

// ── Fake: registry ────────────────────────────────────────────────────────────

/// Registry whose listing can be swapped or broken between fetches.
pub struct FakeSource {
    listing: Mutex<Result<Vec<RegistryRecord>, String>>,
    fetches: AtomicUsize,
}

impl FakeSource {
    pub fn with(records: Vec<RegistryRecord>) -> Self {
        Self {
            listing: Mutex::new(Ok(records)),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            listing: Mutex::new(Err(message.to_string())),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, records: Vec<RegistryRecord>) {
        *self.listing.lock().unwrap() = Ok(records);
    }

    pub fn fail(&self, message: &str) {
        *self.listing.lock().unwrap() = Err(message.to_string());
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl MembershipSource for FakeSource {
    async fn fetch(&self) -> Result<Vec<RegistryRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &*self.listing.lock().unwrap() {
            Ok(records) => Ok(records.clone()),
            Err(message) => Err(anyhow::anyhow!("{message}")),
        }
    }
}

/// Registry that records how many fetches overlap.
pub struct OverlapProbe {
    records: Vec<RegistryRecord>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl OverlapProbe {
    pub fn new(records: Vec<RegistryRecord>) -> Self {
        Self {
            records,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl MembershipSource for OverlapProbe {
    async fn fetch(&self) -> Result<Vec<RegistryRecord>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}

// ── Fake: transport ───────────────────────────────────────────────────────────

/// Transport that answers every agent with a successful command outcome,
/// except hosts listed as down (transport error) or as failing (exit 3).
#[derive(Default)]
pub struct FakeTransport {
    pub down: Vec<String>,
    pub failing: Vec<String>,
    pub sent: Mutex<Vec<Url>>,
}

impl FakeTransport {
    pub fn sent_hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self
            .sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|url| url.host_str().map(ToString::to_string))
            .collect();
        hosts.sort();
        hosts
    }
}

impl AgentTransport for FakeTransport {
    async fn send(&self, base: &Url, request: &RequestSpec) -> Result<WrappedResponse> {
        let url = request.resolve_url(base)?;
        self.sent.lock().unwrap().push(url.clone());
        let host = url.host_str().unwrap_or_default().to_string();
        if self.down.contains(&host) {
            anyhow::bail!("connection refused: {url}");
        }
        let exit_code = if self.failing.contains(&host) { 3 } else { 0 };
        Ok(outcome_response(exit_code, &format!("{host} {}\n", url.path())))
    }
}

pub fn outcome_response(exit_code: i32, output: &str) -> WrappedResponse {
    WrappedResponse {
        status: 200,
        reason_phrase: "OK".to_string(),
        headers: BTreeMap::from([(
            "content-type".to_string(),
            vec!["application/json".to_string()],
        )]),
        body: serde_json::to_value(CommandOutcome {
            exit_code,
            output: output.to_string(),
        })
        .unwrap(),
    }
}
