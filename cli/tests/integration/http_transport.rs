//! Integration tests for the `reqwest` agent transport and response wrapper.

use std::time::Duration;

use fleet_controller::application::ports::AgentTransport;
use fleet_controller::domain::http::APPLICATION_JSON;
use fleet_controller::domain::{HttpMethod, RequestSpec};
use fleet_controller::infra::ReqwestTransport;
use fleet_controller::infra::response::{JSON_PARSE_FAILURE, TEXT_PARSE_FAILURE};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport() -> ReqwestTransport {
    ReqwestTransport::new(Duration::from_secs(5)).unwrap()
}

fn base(server: &MockServer) -> Url {
    Url::parse(&server.uri()).unwrap()
}

#[tokio::test]
async fn sends_json_body_and_decodes_json_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/lifecycle/install"))
        .and(header("accept", APPLICATION_JSON))
        .and(header("content-type", APPLICATION_JSON))
        .and(body_json(json!({"package": "presto.rpm"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"exit_code": 0, "output": "done\n"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut request = RequestSpec::new(HttpMethod::Post, "/v1/lifecycle/{action}");
    request.path_params.insert("action".into(), "install".into());
    request.body = Some(json!({"package": "presto.rpm"}));
    request.accept = APPLICATION_JSON.into();

    let response = transport().send(&base(&server), &request).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.reason_phrase, "OK");
    assert_eq!(response.body, json!({"exit_code": 0, "output": "done\n"}));
    assert!(response.header("content-type").unwrap().starts_with(APPLICATION_JSON));
}

#[tokio::test]
async fn forwards_query_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/config/node.properties"))
        .and(query_param("key", "node.id"))
        .and(header("x-request-id", "42"))
        .and(header("accept", "text/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_string("node.id=a\n"))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = RequestSpec::new(HttpMethod::Get, "/v1/config/{file}");
    request.path_params.insert("file".into(), "node.properties".into());
    request.query.push(("key".into(), "node.id".into()));
    request.headers.push(("x-request-id".into(), "42".into()));

    let response = transport().send(&base(&server), &request).await.unwrap();
    assert_eq!(response.body, json!("node.id=a\n"));
}

#[tokio::test]
async fn error_status_is_still_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such thing"))
        .mount(&server)
        .await;

    let request = RequestSpec::new(HttpMethod::Get, "/v1/missing");
    let response = transport().send(&base(&server), &request).await.unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.reason_phrase, "Not Found");
    assert!(!response.is_success());
    assert_eq!(response.body, json!("no such thing"));
}

#[tokio::test]
async fn malformed_json_yields_diagnostic_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("{\"exit_code\": ", "application/json"),
        )
        .mount(&server)
        .await;

    let request = RequestSpec::new(HttpMethod::Get, "/v1/status");
    let response = transport().send(&base(&server), &request).await.unwrap();
    assert_eq!(response.body, json!({"error": JSON_PARSE_FAILURE}));
}

#[tokio::test]
async fn binary_body_yields_diagnostic_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![0xc3, 0x28, 0xff], "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let request = RequestSpec::new(HttpMethod::Get, "/v1/blob");
    let response = transport().send(&base(&server), &request).await.unwrap();
    assert_eq!(response.body, json!({"error": TEXT_PARSE_FAILURE}));
}

#[tokio::test]
async fn unresolved_template_fails_without_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = RequestSpec::new(HttpMethod::Post, "/v1/lifecycle/{action}");
    let err = transport().send(&base(&server), &request).await.unwrap_err();
    assert!(err.to_string().contains("No value for template '{action}'"));
}

#[tokio::test]
async fn connection_refused_is_an_error() {
    let request = RequestSpec::new(HttpMethod::Get, "/health");
    let base = Url::parse("http://127.0.0.1:9").unwrap();
    assert!(transport().send(&base, &request).await.is_err());
}

#[tokio::test]
async fn request_timeout_overrides_client_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/lifecycle/install"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"exit_code": 0, "output": ""}))
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;
    let transport = ReqwestTransport::new(Duration::from_millis(300)).unwrap();
    let mut request = RequestSpec::new(HttpMethod::Post, "/v1/lifecycle/install");

    assert!(transport.send(&base(&server), &request).await.is_err());

    request.timeout = Some(Duration::from_secs(10));
    let response = transport.send(&base(&server), &request).await.unwrap();
    assert_eq!(response.status, 200);
}
