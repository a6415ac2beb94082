//! ERP discovery integration tests using wiremock
//!
//! Verifies `discover` and `fetch_openid_configuration` over real HTTP:
//!
//! - Path construction from origins with trailing slashes.
//! - Alias resolution on a realistic legacy document.
//! - Transport and status failures map to `Discovery` and `Configuration`.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bpnr::auth::discovery::{discover, fetch_openid_configuration};
use bpnr::error::BpnrError;
use bpnr::http::{ApiClient, NetworkTransport};

fn api() -> ApiClient {
    ApiClient::new(Arc::new(
        NetworkTransport::new(Duration::from_secs(5)).unwrap(),
    ))
}

#[tokio::test]
async fn test_discover_legacy_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/erp.json"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "oidc": {
                "issuer": "https://id.example/auth/realms/legacy/",
                "clientId": "legacy-app"
            },
            "api": { "baseURL": "https://api.example/erp/" },
            "modules": ["core", 17, "payroll"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let discovery = discover(&api(), &format!("{}///", server.uri()))
        .await
        .unwrap();

    assert_eq!(discovery.oidc_issuer, "https://id.example/auth/realms/legacy");
    assert_eq!(discovery.api_base_url, "https://api.example/erp");
    assert_eq!(discovery.realm.as_deref(), Some("legacy"));
    assert_eq!(discovery.client_id.as_deref(), Some("legacy-app"));
    assert_eq!(
        discovery.modules,
        Some(vec!["core".to_string(), "payroll".to_string()])
    );
}

#[tokio::test]
async fn test_discover_defaults_api_base_to_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/erp.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "issuer": "https://id.example/realms/x" })),
        )
        .mount(&server)
        .await;

    let discovery = discover(&api(), &server.uri()).await.unwrap();
    assert_eq!(discovery.api_base_url, server.uri());
}

#[tokio::test]
async fn test_discover_missing_issuer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/erp.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "realm": "x" })))
        .mount(&server)
        .await;

    let err = discover(&api(), &server.uri()).await.unwrap_err();
    assert_eq!(err.to_string(), "Discovery error: missing OIDC issuer");
}

#[tokio::test]
async fn test_discover_http_error_is_discovery_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = discover(&api(), &server.uri()).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BpnrError>(),
        Some(BpnrError::Discovery(_))
    ));
}

#[tokio::test]
async fn test_discover_non_json_body_is_discovery_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = discover(&api(), &server.uri()).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BpnrError>(),
        Some(BpnrError::Discovery(_))
    ));
}

#[tokio::test]
async fn test_discover_unreachable_host() {
    let err = discover(&api(), "http://127.0.0.1:9").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BpnrError>(),
        Some(BpnrError::Discovery(_))
    ));
}

#[tokio::test]
async fn test_fetch_openid_configuration_trims_issuer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/realms/acme/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "authorization_endpoint": "https://id.example/auth",
            "token_endpoint": "https://id.example/token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = fetch_openid_configuration(&api(), &format!("{}/realms/acme/", server.uri()))
        .await
        .unwrap();
    assert_eq!(config.authorization_endpoint, "https://id.example/auth");
    assert_eq!(config.token_endpoint, "https://id.example/token");
}

#[tokio::test]
async fn test_fetch_openid_configuration_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = fetch_openid_configuration(&api(), &server.uri())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BpnrError>(),
        Some(BpnrError::Configuration(_))
    ));
}
