//! Companies service integration tests using wiremock

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bpnr::companies::fetch_companies;
use bpnr::error::BpnrError;
use bpnr::http::{ApiClient, NetworkTransport};

fn api() -> ApiClient {
    ApiClient::new(Arc::new(
        NetworkTransport::new(Duration::from_secs(5)).unwrap(),
    ))
}

#[tokio::test]
async fn test_fetch_companies_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/companies"))
        .and(header("authorization", "Bearer at-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": "c1", "name": "One" },
            { "uuid": "c2", "displayName": "Two" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let companies = fetch_companies(&api(), &format!("{}/", server.uri()), "at-1")
        .await
        .unwrap();

    let names: Vec<_> = companies.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["One", "Two"]);
}

#[tokio::test]
async fn test_fetch_companies_unauthorized_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/companies"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = fetch_companies(&api(), &server.uri(), "expired")
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BpnrError>(),
        Some(BpnrError::Http { status: 401, .. })
    ));
}

#[tokio::test]
async fn test_fetch_companies_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/companies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "companies": [] })))
        .mount(&server)
        .await;

    let err = fetch_companies(&api(), &server.uri(), "at")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Companies error: no companies available");
}
