//! HTTP client abstraction and transport strategies
//!
//! This module defines the [`Transport`] trait that performs a single HTTP
//! exchange, and the [`ApiClient`] that layers JSON decoding, form encoding,
//! bearer authentication, and error logging on top of it.  Concrete
//! transports live in submodules:
//!
//! - [`network::NetworkTransport`] -- real network I/O through `reqwest`.
//! - [`fixture::FixtureTransport`] -- in-process fixture backend serving the
//!   discovery, OIDC, token, and companies endpoints.  Used for offline demos
//!   and tests.
//!
//! # Design
//!
//! The strategy is chosen once, when the client is constructed, from
//! [`HttpConfig::transport`](crate::config::HttpConfig).  There is no global
//! switch: two clients with different transports can coexist in the same
//! process.

pub mod fixture;
pub mod network;

use std::sync::Arc;

use serde_json::Value;

use crate::config::{HttpConfig, TransportKind};
use crate::error::{BpnrError, Result};

pub use fixture::FixtureTransport;
pub use network::NetworkTransport;

/// HTTP method subset used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A fully described outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method
    pub method: Method,
    /// Absolute request URL
    pub url: String,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// Optional request body, already encoded
    pub body: Option<String>,
}

impl HttpRequest {
    /// Returns the value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response returned by a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpResponse {
    /// Returns true for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over the component that actually moves bytes.
///
/// Implementations must not interpret status codes; a 4xx or 5xx is still an
/// `Ok(HttpResponse)`.  Only failures to complete the exchange (DNS,
/// connection refused, timeout) are errors.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Performs one request/response exchange.
    ///
    /// # Errors
    ///
    /// Returns [`BpnrError::Transport`] if the exchange could not complete.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// JSON API client over an injected [`Transport`].
///
/// Cloning is cheap; clones share the transport.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use bpnr::http::{ApiClient, FixtureTransport};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> bpnr::error::Result<()> {
/// let api = ApiClient::new(Arc::new(FixtureTransport::new()));
/// let doc = api
///     .get_json("https://erp.acme.example/.well-known/erp.json", None)
///     .await?;
/// assert_eq!(doc["realm"], "acme");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    /// Creates a client over the given transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Creates a client whose transport is selected by `config.transport`.
    ///
    /// # Errors
    ///
    /// Returns [`BpnrError::Transport`] if the network client cannot be
    /// built (TLS backend initialisation failure).
    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        let transport: Arc<dyn Transport> = match config.transport {
            TransportKind::Network => Arc::new(NetworkTransport::new(config.timeout())?),
            TransportKind::Fixture => Arc::new(FixtureTransport::new()),
        };
        tracing::debug!("HTTP transport: {:?}", config.transport);
        Ok(Self::new(transport))
    }

    /// Issues a `GET` expecting a JSON body.
    ///
    /// When `bearer` is set, an `Authorization: Bearer <token>` header is
    /// attached.
    ///
    /// # Errors
    ///
    /// - [`BpnrError::Transport`] if the exchange fails or the body is not
    ///   JSON.
    /// - [`BpnrError::Http`] for non-2xx status codes.
    pub async fn get_json(&self, url: &str, bearer: Option<&str>) -> Result<Value> {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if let Some(token) = bearer {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        self.send(HttpRequest {
            method: Method::Get,
            url: url.to_string(),
            headers,
            body: None,
        })
        .await
    }

    /// Issues a `POST` with an `application/x-www-form-urlencoded` body
    /// built from `fields`, in order, expecting a JSON response.
    ///
    /// # Errors
    ///
    /// Same as [`get_json`](Self::get_json).
    pub async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<Value> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields.iter())
            .finish();

        self.send(HttpRequest {
            method: Method::Post,
            url: url.to_string(),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                (
                    "Content-Type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                ),
            ],
            body: Some(body),
        })
        .await
    }

    async fn send(&self, request: HttpRequest) -> Result<Value> {
        let url = request.url.clone();
        let response = self.transport.execute(request).await?;

        if !response.is_success() {
            tracing::warn!(url = %url, status = response.status, "HTTP error");
            let body = (!response.body.is_empty()).then_some(response.body);
            return Err(BpnrError::Http {
                status: response.status,
                body,
            }
            .into());
        }

        serde_json::from_str(&response.body).map_err(|e| {
            BpnrError::Transport(format!("invalid JSON response from {url}: {e}")).into()
        })
    }
}

/// Reads a string field from a JSON object, ignoring non-string values.
pub(crate) fn read_str<'a>(
    object: &'a serde_json::Map<String, Value>,
    key: &str,
) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}
