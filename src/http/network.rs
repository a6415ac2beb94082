//! Network transport backed by `reqwest`

use std::time::Duration;

use crate::error::{BpnrError, Result};
use crate::http::{HttpRequest, HttpResponse, Method, Transport};

/// [`Transport`] that performs real HTTP requests.
///
/// The `timeout` applies to each individual request, mirroring the 15 second
/// default of the mobile client.
#[derive(Debug, Clone)]
pub struct NetworkTransport {
    http_client: reqwest::Client,
}

impl NetworkTransport {
    /// Builds a transport with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BpnrError::Transport`] if the TLS backend fails to
    /// initialise.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BpnrError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http_client })
    }
}

#[async_trait::async_trait]
impl Transport for NetworkTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.http_client.get(&request.url),
            Method::Post => self.http_client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await.map_err(|e| {
            BpnrError::Transport(format!("{} {} failed: {e}", request.method, request.url))
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            BpnrError::Transport(format!(
                "{} {} body read failed: {e}",
                request.method, request.url
            ))
        })?;
        Ok(HttpResponse { status, body })
    }
}
