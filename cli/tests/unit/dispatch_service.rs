//! Tests for the dispatch service.
//!
//! One request goes to every selected agent; a failing agent is recorded
//! without affecting the rest.

use std::time::Duration;

use fleet_common::{CommandOutcome, LifecycleAction, LifecycleParams};
use fleet_controller::application::services::dispatch::{
    AgentOutcome, dispatch, lifecycle_request,
};
use fleet_controller::application::services::membership::MembershipResolver;
use fleet_controller::domain::{MembershipError, Selection};

use crate::helpers::{FakeSource, FakeTransport, ids, small_fleet};

fn start_request() -> fleet_controller::domain::RequestSpec {
    lifecycle_request(
        LifecycleAction::Start,
        &LifecycleParams::default(),
        Duration::from_secs(60),
    )
    .unwrap()
}

#[tokio::test]
async fn sends_once_to_each_selected_agent() {
    let resolver = MembershipResolver::new(FakeSource::with(small_fleet()));
    let transport = FakeTransport::default();

    let report = dispatch(&resolver, &transport, &Selection::All, &start_request())
        .await
        .unwrap();

    assert_eq!(transport.sent_hosts(), ["a", "b", "c"]);
    assert_eq!(report.len(), 3);
    let outcome: CommandOutcome =
        serde_json::from_value(report.outcomes["b"].response().unwrap().body.clone()).unwrap();
    assert_eq!(outcome.output, "b /v1/lifecycle/start\n");
    assert!(report.outcomes.values().all(|outcome| outcome.response().is_some()));
}

#[tokio::test]
async fn role_selection_limits_targets() {
    let resolver = MembershipResolver::new(FakeSource::with(small_fleet()));
    let transport = FakeTransport::default();

    dispatch(&resolver, &transport, &Selection::Workers, &start_request())
        .await
        .unwrap();
    assert_eq!(transport.sent_hosts(), ["b", "c"]);
}

#[tokio::test]
async fn one_unreachable_agent_does_not_abort_the_rest() {
    let resolver = MembershipResolver::new(FakeSource::with(small_fleet()));
    let transport = FakeTransport {
        down: ids(&["b"]),
        ..FakeTransport::default()
    };

    let report = dispatch(&resolver, &transport, &Selection::All, &start_request())
        .await
        .unwrap();

    assert_eq!(transport.sent_hosts(), ["a", "b", "c"]);
    assert!(matches!(report.outcomes["b"], AgentOutcome::Failed(ref msg) if msg.contains("connection refused")));
    assert!(report.outcomes["a"].response().is_some());
    assert!(report.outcomes["c"].response().is_some());
}

#[tokio::test]
async fn unknown_id_aborts_before_sending() {
    let resolver = MembershipResolver::new(FakeSource::with(small_fleet()));
    let transport = FakeTransport::default();

    let err = dispatch(
        &resolver,
        &transport,
        &Selection::Ids(ids(&["a", "nope"])),
        &start_request(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, MembershipError::UnknownAgents { .. }));
    assert!(transport.sent_hosts().is_empty());
}

#[tokio::test]
async fn empty_selection_sends_nothing() {
    let resolver = MembershipResolver::new(FakeSource::with(Vec::new()));
    let transport = FakeTransport::default();

    let report = dispatch(&resolver, &transport, &Selection::Coordinators, &start_request())
        .await
        .unwrap();
    assert!(report.is_empty());
    assert!(transport.sent_hosts().is_empty());
}

#[tokio::test]
async fn report_serializes_per_agent() {
    let resolver = MembershipResolver::new(FakeSource::with(small_fleet()));
    let transport = FakeTransport {
        down: ids(&["c"]),
        ..FakeTransport::default()
    };
    let report = dispatch(
        &resolver,
        &transport,
        &Selection::Ids(ids(&["a", "c"])),
        &start_request(),
    )
    .await
    .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["a"]["response"]["status"], 200);
    assert_eq!(json["a"]["response"]["body"]["exit_code"], 0);
    assert!(json["c"]["failed"].as_str().unwrap().contains("connection refused"));
}
