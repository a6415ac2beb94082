//! In-process fixture backend
//!
//! [`FixtureTransport`] answers the four endpoints the client talks to with
//! deterministic data, so the whole connect sequence can run without a
//! server.  URLs are matched by suffix; the host part is echoed back into the
//! generated documents, so any origin works.
//!
//! | Request                                         | Response                         |
//! |-------------------------------------------------|----------------------------------|
//! | `GET  <base>/.well-known/erp.json`              | discovery for realm `acme`       |
//! | `GET  <issuer>/.well-known/openid-configuration`| Keycloak-style endpoints         |
//! | `POST <...>/protocol/openid-connect/token`      | fixed tokens                     |
//! | `GET  <...>/api/companies`                      | four companies, fixed order      |
//!
//! Anything else yields `404`.  Every request is recorded and can be read
//! back with [`FixtureTransport::history`].

use serde_json::json;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse, Method, Transport};

const ERP_DISCOVERY_SUFFIX: &str = "/.well-known/erp.json";
const OPENID_CONFIGURATION_SUFFIX: &str = "/.well-known/openid-configuration";
const TOKEN_SUFFIX: &str = "/protocol/openid-connect/token";
const COMPANIES_SUFFIX: &str = "/api/companies";

/// Access token issued by the fixture token endpoint.
pub const FIXTURE_ACCESS_TOKEN: &str = "mock-access-token";
/// Refresh token issued by the fixture token endpoint.
pub const FIXTURE_REFRESH_TOKEN: &str = "mock-refresh-token";

/// Companies served by the fixture backend, in response order.
pub const FIXTURE_COMPANIES: [(&str, &str); 4] = [
    ("geovi-it-ltd", "Geovi IT Ltd"),
    ("it-works-ltd", "IT Works Ltd"),
    ("acme-ood", "ACME OOD"),
    ("acme-retail", "ACME Retail"),
];

/// A request observed by the fixture backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Request method
    pub method: Method,
    /// Request URL
    pub url: String,
    /// Request body, if any
    pub body: Option<String>,
}

/// [`Transport`] serving canned ERP, OIDC, and companies responses.
#[derive(Debug, Default)]
pub struct FixtureTransport {
    history: Mutex<Vec<RecordedRequest>>,
}

impl FixtureTransport {
    /// Creates a fixture backend with an empty request history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every request seen so far, oldest first.
    pub async fn history(&self) -> Vec<RecordedRequest> {
        self.history.lock().await.clone()
    }

    /// Clears the recorded request history.
    pub async fn reset_history(&self) {
        self.history.lock().await.clear();
    }

    fn route(request: &HttpRequest) -> HttpResponse {
        let url = request.url.as_str();

        match request.method {
            Method::Get => {
                if let Some(base) = url.strip_suffix(ERP_DISCOVERY_SUFFIX) {
                    return ok(json!({
                        "oidcIssuer": format!("{base}/auth/realms/acme"),
                        "apiBaseUrl": base,
                        "realm": "acme",
                        "clientId": "bpnr-mobile",
                        "modules": ["core", "accounting"],
                    }));
                }
                if let Some(issuer) = url.strip_suffix(OPENID_CONFIGURATION_SUFFIX) {
                    let issuer = issuer.trim_end_matches('/');
                    return ok(json!({
                        "authorization_endpoint": format!("{issuer}/protocol/openid-connect/auth"),
                        "token_endpoint": format!("{issuer}{TOKEN_SUFFIX}"),
                    }));
                }
                if url.ends_with(COMPANIES_SUFFIX) {
                    let companies: Vec<_> = FIXTURE_COMPANIES
                        .iter()
                        .map(|(id, name)| json!({ "id": id, "name": name }))
                        .collect();
                    return ok(json!({ "companies": companies }));
                }
            }
            Method::Post => {
                if url.ends_with(TOKEN_SUFFIX) {
                    let body = request.body.as_deref().unwrap_or_default();
                    let grant = url::form_urlencoded::parse(body.as_bytes())
                        .find(|(k, _)| k == "grant_type")
                        .map(|(_, v)| v.into_owned());
                    if grant.as_deref() != Some("authorization_code") {
                        return HttpResponse {
                            status: 400,
                            body: json!({ "error": "unsupported_grant_type" }).to_string(),
                        };
                    }
                    return ok(json!({
                        "access_token": FIXTURE_ACCESS_TOKEN,
                        "refresh_token": FIXTURE_REFRESH_TOKEN,
                        "token_type": "Bearer",
                        "expires_in": 3600,
                    }));
                }
            }
        }

        HttpResponse {
            status: 404,
            body: String::new(),
        }
    }
}

fn ok(value: serde_json::Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: value.to_string(),
    }
}

#[async_trait::async_trait]
impl Transport for FixtureTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = Self::route(&request);
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            "fixture request"
        );
        self.history.lock().await.push(RecordedRequest {
            method: request.method,
            url: request.url,
            body: request.body,
        });
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(url: &str) -> HttpRequest {
        HttpRequest {
            method: Method::Get,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_erp_document_echoes_base() {
        let transport = FixtureTransport::new();
        let resp = transport
            .execute(get("https://erp.other.example/.well-known/erp.json"))
            .await
            .unwrap();
        let doc: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(
            doc["oidcIssuer"],
            "https://erp.other.example/auth/realms/acme"
        );
        assert_eq!(doc["apiBaseUrl"], "https://erp.other.example");
    }

    #[tokio::test]
    async fn test_openid_configuration_derives_endpoints() {
        let transport = FixtureTransport::new();
        let resp = transport
            .execute(get(
                "https://h.example/auth/realms/acme/.well-known/openid-configuration",
            ))
            .await
            .unwrap();
        let doc: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(
            doc["token_endpoint"],
            "https://h.example/auth/realms/acme/protocol/openid-connect/token"
        );
    }

    #[tokio::test]
    async fn test_token_endpoint_requires_authorization_code_grant() {
        let transport = FixtureTransport::new();
        let resp = transport
            .execute(HttpRequest {
                method: Method::Post,
                url: "https://h.example/protocol/openid-connect/token".to_string(),
                headers: Vec::new(),
                body: Some("grant_type=refresh_token".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(resp.status, 400);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_and_recorded() {
        let transport = FixtureTransport::new();
        let resp = transport
            .execute(get("https://h.example/unknown"))
            .await
            .unwrap();
        assert_eq!(resp.status, 404);

        let history = transport.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].url, "https://h.example/unknown");

        transport.reset_history().await;
        assert!(transport.history().await.is_empty());
    }
}
