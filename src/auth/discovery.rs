//! ERP server discovery and OpenID Connect metadata lookup
//!
//! Locating the identity provider is a two-hop process:
//!
//! 1. [`discover`] fetches `<origin>/.well-known/erp.json` from the ERP
//!    server and normalizes it into an [`ErpDiscovery`] descriptor.  ERP
//!    deployments of different vintages name the fields differently, so every
//!    field is read through an ordered list of aliases.
//! 2. [`fetch_openid_configuration`] fetches
//!    `<issuer>/.well-known/openid-configuration` and keeps the two endpoints
//!    the login flow needs.
//!
//! # Field aliases
//!
//! | Field          | Aliases, highest priority first                                |
//! |----------------|----------------------------------------------------------------|
//! | `oidc_issuer`  | `oidcIssuer`, `oidc_issuer`, `issuer`, `oidc.issuer`           |
//! | `api_base_url` | `apiBaseUrl`, `api_base_url`, `api.baseUrl`, `api.baseURL`     |
//! | `realm`        | `realm`, `keycloakRealm`, `oidc.realm`, inferred from issuer   |
//! | `client_id`    | `clientId`, `oidcClientId`, `oidc.clientId`                    |
//!
//! Only string values count; an alias holding a number or object is skipped.
//!
//! # References
//!
//! - OpenID Connect Discovery 1.0 <https://openid.net/specs/openid-connect-discovery-1_0.html>

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BpnrError, Result};
use crate::http::{read_str, ApiClient};
use crate::urls::trim_trailing_slash;

const ERP_DISCOVERY_PATH: &str = "/.well-known/erp.json";
const OPENID_CONFIGURATION_PATH: &str = "/.well-known/openid-configuration";
const REALM_MARKER: &str = "/realms/";

// ---------------------------------------------------------------------------
// ErpDiscovery
// ---------------------------------------------------------------------------

/// Normalized description of an ERP server.
///
/// Both URL fields are stored without a trailing slash so that paths can be
/// appended with a plain `format!`.
///
/// # Examples
///
/// ```
/// use bpnr::auth::discovery::parse_erp_discovery;
///
/// let raw = serde_json::json!({
///     "oidc": { "issuer": "https://erp.example/auth/realms/acme/" }
/// });
/// let discovery = parse_erp_discovery(&raw, "https://erp.example").unwrap();
///
/// assert_eq!(discovery.oidc_issuer, "https://erp.example/auth/realms/acme");
/// assert_eq!(discovery.api_base_url, "https://erp.example");
/// assert_eq!(discovery.realm.as_deref(), Some("acme"));
/// assert!(discovery.client_id.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErpDiscovery {
    /// OIDC issuer URL, trailing slash stripped.
    pub oidc_issuer: String,

    /// Base URL of the ERP REST API, trailing slash stripped.  Falls back to
    /// the server origin when the document does not name one.
    pub api_base_url: String,

    /// Identity provider realm, when advertised or inferable from the issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,

    /// OIDC client id advertised by the server.  Callers supply a fallback
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// ERP modules enabled on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<String>>,
}

/// Fetches and parses the ERP discovery document for `server_url`.
///
/// Trailing slashes on `server_url` are stripped before
/// `/.well-known/erp.json` is appended.
///
/// # Errors
///
/// Returns [`BpnrError::Discovery`] when the document cannot be fetched,
/// is not a JSON object, or has no issuer under any alias.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use bpnr::auth::discovery::discover;
/// use bpnr::http::{ApiClient, FixtureTransport};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> bpnr::error::Result<()> {
/// let api = ApiClient::new(Arc::new(FixtureTransport::new()));
/// let discovery = discover(&api, "https://erp.acme.example/").await?;
/// assert_eq!(discovery.client_id.as_deref(), Some("bpnr-mobile"));
/// # Ok(())
/// # }
/// ```
pub async fn discover(api: &ApiClient, server_url: &str) -> Result<ErpDiscovery> {
    let base = trim_trailing_slash(server_url);
    let discovery_url = format!("{base}{ERP_DISCOVERY_PATH}");

    let raw = api.get_json(&discovery_url, None).await.map_err(|e| {
        BpnrError::Discovery(format!("failed to fetch {discovery_url}: {e}"))
    })?;

    let discovery = parse_erp_discovery(&raw, base)?;
    tracing::debug!(
        issuer = %discovery.oidc_issuer,
        realm = ?discovery.realm,
        "ERP discovery resolved"
    );
    Ok(discovery)
}

/// Parses a raw discovery document.
///
/// `server_url` is the origin the document was fetched from; it becomes the
/// API base when the document does not name one.
///
/// # Errors
///
/// - `Discovery("invalid discovery document")` if `raw` is not an object.
/// - `Discovery("missing OIDC issuer")` if no issuer alias holds a string.
pub fn parse_erp_discovery(raw: &Value, server_url: &str) -> Result<ErpDiscovery> {
    let root = raw
        .as_object()
        .ok_or_else(|| BpnrError::Discovery("invalid discovery document".to_string()))?;

    let oidc = root.get("oidc").and_then(Value::as_object);
    let api = root.get("api").and_then(Value::as_object);

    let oidc_issuer = first_of(root, &["oidcIssuer", "oidc_issuer", "issuer"])
        .or_else(|| oidc.and_then(|o| read_str(o, "issuer")))
        .ok_or_else(|| BpnrError::Discovery("missing OIDC issuer".to_string()))?;

    let api_base_url = first_of(root, &["apiBaseUrl", "api_base_url"])
        .or_else(|| api.and_then(|a| first_of(a, &["baseUrl", "baseURL"])))
        .unwrap_or(server_url);

    let realm = first_of(root, &["realm", "keycloakRealm"])
        .or_else(|| oidc.and_then(|o| read_str(o, "realm")))
        .map(str::to_string)
        .or_else(|| infer_keycloak_realm(oidc_issuer));

    let client_id = first_of(root, &["clientId", "oidcClientId"])
        .or_else(|| oidc.and_then(|o| read_str(o, "clientId")))
        .map(str::to_string);

    let modules = root.get("modules").and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    });

    Ok(ErpDiscovery {
        oidc_issuer: trim_trailing_slash(oidc_issuer).to_string(),
        api_base_url: trim_trailing_slash(api_base_url).to_string(),
        realm,
        client_id,
        modules,
    })
}

/// Extracts a Keycloak realm name from an issuer URL.
///
/// Returns the first path component after `/realms/`, ending at `/`, `?`, or
/// `#`.  Returns `None` when there is no marker or the component is empty.
///
/// # Examples
///
/// ```
/// use bpnr::auth::discovery::infer_keycloak_realm;
///
/// assert_eq!(
///     infer_keycloak_realm("https://host/auth/realms/acme/foo").as_deref(),
///     Some("acme")
/// );
/// assert_eq!(infer_keycloak_realm("https://host/auth"), None);
/// ```
pub fn infer_keycloak_realm(issuer: &str) -> Option<String> {
    let index = issuer.find(REALM_MARKER)?;
    let rest = &issuer[index + REALM_MARKER.len()..];
    let realm = rest.split(['/', '?', '#']).next().unwrap_or_default();
    (!realm.is_empty()).then(|| realm.to_string())
}

fn first_of<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| read_str(object, key))
}

// ---------------------------------------------------------------------------
// OpenID Connect configuration
// ---------------------------------------------------------------------------

/// The subset of OpenID provider metadata used by the login flow.
///
/// Derived fresh for every login attempt; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenIdConfiguration {
    /// URL of the authorization endpoint (RFC 6749 section 3.1).
    pub authorization_endpoint: String,

    /// URL of the token endpoint (RFC 6749 section 3.2).
    pub token_endpoint: String,
}

/// Fetches `<issuer>/.well-known/openid-configuration`.
///
/// # Errors
///
/// Returns [`BpnrError::Configuration`] if the document cannot be fetched,
/// is not a JSON object, or lacks either endpoint.
pub async fn fetch_openid_configuration(
    api: &ApiClient,
    issuer: &str,
) -> Result<OpenIdConfiguration> {
    let url = format!("{}{OPENID_CONFIGURATION_PATH}", trim_trailing_slash(issuer));

    let raw = api
        .get_json(&url, None)
        .await
        .map_err(|e| BpnrError::Configuration(format!("failed to fetch {url}: {e}")))?;

    parse_openid_configuration(&raw)
}

/// Parses an OpenID provider metadata document.
///
/// # Errors
///
/// Returns [`BpnrError::Configuration`] if `raw` is not an object or either
/// `authorization_endpoint` or `token_endpoint` is missing.
pub fn parse_openid_configuration(raw: &Value) -> Result<OpenIdConfiguration> {
    let root = raw
        .as_object()
        .ok_or_else(|| BpnrError::Configuration("invalid OIDC configuration".to_string()))?;

    match (
        read_str(root, "authorization_endpoint"),
        read_str(root, "token_endpoint"),
    ) {
        (Some(authorization), Some(token)) if !authorization.is_empty() && !token.is_empty() => {
            Ok(OpenIdConfiguration {
                authorization_endpoint: authorization.to_string(),
                token_endpoint: token.to_string(),
            })
        }
        _ => Err(BpnrError::Configuration("OIDC configuration missing endpoints".to_string()).into()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn discovery_error(result: Result<ErpDiscovery>) -> String {
        match result.unwrap_err().downcast_ref::<BpnrError>() {
            Some(BpnrError::Discovery(msg)) => msg.clone(),
            other => panic!("expected Discovery error, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Issuer aliases
    // -----------------------------------------------------------------------

    #[test]
    fn test_issuer_alias_priority() {
        let raw = json!({
            "issuer": "https://c.example",
            "oidc_issuer": "https://b.example",
            "oidcIssuer": "https://a.example",
            "oidc": { "issuer": "https://d.example" }
        });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert_eq!(d.oidc_issuer, "https://a.example");

        let raw = json!({ "issuer": "https://c.example", "oidc": { "issuer": "https://d.example" } });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert_eq!(d.oidc_issuer, "https://c.example");
    }

    #[test]
    fn test_nested_issuer_used_and_trailing_slash_stripped() {
        let raw = json!({ "oidc": { "issuer": "https://idp.example/realms/x//" } });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert_eq!(d.oidc_issuer, "https://idp.example/realms/x");
    }

    #[test]
    fn test_non_string_issuer_alias_is_skipped() {
        let raw = json!({ "oidcIssuer": 42, "issuer": "https://idp.example" });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert_eq!(d.oidc_issuer, "https://idp.example");
    }

    #[test]
    fn test_missing_issuer_fails() {
        let raw = json!({ "apiBaseUrl": "https://api.example", "oidc": {} });
        let msg = discovery_error(parse_erp_discovery(&raw, "https://srv.example"));
        assert_eq!(msg, "missing OIDC issuer");
    }

    #[test]
    fn test_non_object_document_fails() {
        for raw in [json!([1, 2]), json!("text"), json!(null)] {
            let msg = discovery_error(parse_erp_discovery(&raw, "https://srv.example"));
            assert_eq!(msg, "invalid discovery document");
        }
    }

    // -----------------------------------------------------------------------
    // API base
    // -----------------------------------------------------------------------

    #[test]
    fn test_api_base_falls_back_to_server_url() {
        let raw = json!({ "issuer": "https://idp.example" });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert_eq!(d.api_base_url, "https://srv.example");
    }

    #[test]
    fn test_api_base_nested_aliases() {
        let raw = json!({ "issuer": "https://i", "api": { "baseURL": "https://api.example/v2/" } });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert_eq!(d.api_base_url, "https://api.example/v2");

        let raw = json!({
            "issuer": "https://i",
            "api": { "baseUrl": "https://first.example", "baseURL": "https://second.example" }
        });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert_eq!(d.api_base_url, "https://first.example");
    }

    #[test]
    fn test_api_base_top_level_wins_over_nested() {
        let raw = json!({
            "issuer": "https://i",
            "api_base_url": "https://flat.example",
            "api": { "baseUrl": "https://nested.example" }
        });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert_eq!(d.api_base_url, "https://flat.example");
    }

    // -----------------------------------------------------------------------
    // Realm and client id
    // -----------------------------------------------------------------------

    #[test]
    fn test_explicit_realm_beats_inference() {
        let raw = json!({
            "issuer": "https://h/auth/realms/inferred",
            "keycloakRealm": "explicit"
        });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert_eq!(d.realm.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_realm_inferred_from_issuer() {
        let raw = json!({ "issuer": "https://h/auth/realms/acme" });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert_eq!(d.realm.as_deref(), Some("acme"));
    }

    #[test]
    fn test_infer_keycloak_realm_edge_cases() {
        assert_eq!(
            infer_keycloak_realm("https://host/auth/realms/acme/foo").as_deref(),
            Some("acme")
        );
        assert_eq!(
            infer_keycloak_realm("https://host/realms/acme?x=1").as_deref(),
            Some("acme")
        );
        assert_eq!(
            infer_keycloak_realm("https://host/realms/acme#frag").as_deref(),
            Some("acme")
        );
        assert_eq!(infer_keycloak_realm("https://host/auth"), None);
        assert_eq!(infer_keycloak_realm("https://host/realms/"), None);
        assert_eq!(infer_keycloak_realm("https://host/realms//x"), None);
    }

    #[test]
    fn test_client_id_aliases() {
        let raw = json!({ "issuer": "https://i", "oidcClientId": "second", "oidc": { "clientId": "third" } });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert_eq!(d.client_id.as_deref(), Some("second"));

        let raw = json!({ "issuer": "https://i", "oidc": { "clientId": "third" } });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert_eq!(d.client_id.as_deref(), Some("third"));

        let raw = json!({ "issuer": "https://i" });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert!(d.client_id.is_none());
    }

    #[test]
    fn test_modules_keep_only_strings() {
        let raw = json!({ "issuer": "https://i", "modules": ["core", 3, null, "accounting"] });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert_eq!(
            d.modules,
            Some(vec!["core".to_string(), "accounting".to_string()])
        );

        let raw = json!({ "issuer": "https://i", "modules": "core" });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        assert!(d.modules.is_none());
    }

    #[test]
    fn test_descriptor_serializes_camel_case() {
        let raw = json!({ "issuer": "https://h/realms/acme", "clientId": "c" });
        let d = parse_erp_discovery(&raw, "https://srv.example").unwrap();
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["oidcIssuer"], "https://h/realms/acme");
        assert_eq!(value["apiBaseUrl"], "https://srv.example");
        assert!(value.get("modules").is_none());
    }

    // -----------------------------------------------------------------------
    // OpenID configuration
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_openid_configuration_ok() {
        let raw = json!({
            "issuer": "https://idp",
            "authorization_endpoint": "https://idp/auth",
            "token_endpoint": "https://idp/token",
            "jwks_uri": "https://idp/certs"
        });
        let config = parse_openid_configuration(&raw).unwrap();
        assert_eq!(config.authorization_endpoint, "https://idp/auth");
        assert_eq!(config.token_endpoint, "https://idp/token");
    }

    #[test]
    fn test_parse_openid_configuration_missing_endpoint() {
        let raw = json!({ "authorization_endpoint": "https://idp/auth" });
        let err = parse_openid_configuration(&raw).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BpnrError>(),
            Some(BpnrError::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_openid_configuration_not_object() {
        let err = parse_openid_configuration(&json!(["x"])).unwrap_err();
        assert!(err.to_string().contains("invalid OIDC configuration"));
    }
}
