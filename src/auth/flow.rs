//! OIDC authorization code flow with PKCE
//!
//! # Flow overview
//!
//! 1. Fetch the provider's OpenID configuration from the issuer.
//! 2. Generate a PKCE verifier, challenge, and `state`.
//! 3. Build the authorization URL.
//! 4. Subscribe to incoming URLs, then open the authorization view.
//! 5. Wait for the redirect, bounded by the login timeout.
//! 6. Validate the redirect: provider error, missing code, state mismatch.
//! 7. Exchange the code for tokens at the token endpoint.
//!
//! Each call to [`PkceLoginFlow::login`] is an independent attempt.  Nothing
//! is retried and no state carries over between attempts.
//!
//! # References
//!
//! - OpenID Connect Core 1.0 <https://openid.net/specs/openid-connect-core-1_0.html>
//! - RFC 7636 PKCE <https://www.rfc-editor.org/rfc/rfc7636>

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use url::Url;

use crate::auth::discovery::fetch_openid_configuration;
use crate::auth::pkce::{self, PkceMaterial};
use crate::auth::redirect::{parse_redirect_url, wait_for_redirect, LinkHub, RedirectResult};
use crate::auth::view::AuthorizationView;
use crate::error::{BpnrError, Result};
use crate::http::{read_str, ApiClient};

/// Login timeout used when none is configured.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// Parameters and tokens
// ---------------------------------------------------------------------------

/// Inputs for one login attempt.
///
/// # Examples
///
/// ```
/// use bpnr::auth::flow::OidcLoginParams;
///
/// let params = OidcLoginParams {
///     issuer: "https://erp.example/auth/realms/acme".to_string(),
///     client_id: "bpnr-mobile".to_string(),
///     redirect_uri: "bpnr://auth/callback".to_string(),
///     scope: "openid profile offline_access".to_string(),
/// };
/// assert!(params.scope.contains("openid"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcLoginParams {
    /// OIDC issuer URL
    pub issuer: String,
    /// Client id registered with the provider
    pub client_id: String,
    /// Redirect URI registered for the client
    pub redirect_uri: String,
    /// Space-separated scopes
    pub scope: String,
}

/// Tokens returned by a successful code exchange.
///
/// Held in memory only.  The `Debug` output never includes token values.
#[derive(Clone, PartialEq, Eq)]
pub struct OidcTokens {
    /// Bearer token for API calls
    pub access_token: String,
    /// Refresh token, when the provider issued one
    pub refresh_token: Option<String>,
    /// ID token, when the provider issued one
    pub id_token: Option<String>,
    /// Token type, normally `Bearer`
    pub token_type: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: Option<u64>,
    /// When the exchange completed
    pub obtained_at: DateTime<Utc>,
}

impl OidcTokens {
    /// Absolute expiry of the access token, when `expires_in` is known.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_in.map(|secs| {
            self.obtained_at + chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
        })
    }

    /// Returns true once the access token's lifetime has elapsed.
    ///
    /// Tokens without an `expires_in` never report as expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at().is_some_and(|at| Utc::now() >= at)
    }
}

impl std::fmt::Debug for OidcTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// PkceLoginFlow
// ---------------------------------------------------------------------------

/// Drives a browser-based OIDC login.
///
/// The HTTP client, authorization view, and incoming-URL hub are injected,
/// so the same flow runs against a real provider or the fixture backend.
#[derive(Debug, Clone)]
pub struct PkceLoginFlow {
    api: ApiClient,
    view: Arc<dyn AuthorizationView>,
    links: Arc<LinkHub>,
    timeout: Duration,
}

impl PkceLoginFlow {
    /// Creates a flow with the default five minute login timeout.
    pub fn new(api: ApiClient, view: Arc<dyn AuthorizationView>, links: Arc<LinkHub>) -> Self {
        Self {
            api,
            view,
            links,
            timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }

    /// Overrides how long to wait for the redirect.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs one complete login attempt.
    ///
    /// # Errors
    ///
    /// - [`BpnrError::Configuration`] if the provider metadata is unusable.
    /// - [`BpnrError::Environment`] if secure randomness is unavailable.
    /// - [`BpnrError::Timeout`] if no redirect arrives in time.
    /// - [`BpnrError::Authorization`], [`BpnrError::MissingCode`], or
    ///   [`BpnrError::StateMismatch`] for a rejected redirect.
    /// - [`BpnrError::TokenExchange`] if the code cannot be redeemed.
    /// - Any error from the authorization view's `open`.
    pub async fn login(&self, params: &OidcLoginParams) -> Result<OidcTokens> {
        let metadata = fetch_openid_configuration(&self.api, &params.issuer).await?;
        let pkce = pkce::generate()?;
        let authorization_url =
            build_authorization_url(&metadata.authorization_endpoint, params, &pkce)?;

        // Subscribe before opening so a fast redirect is not missed.
        let events = self.links.subscribe();
        tracing::info!(issuer = %params.issuer, "opening authorization view");
        self.view.open(&authorization_url).await?;

        let initial = self.links.initial_url();
        let redirect = wait_for_redirect(
            events,
            async move { initial },
            &params.redirect_uri,
            self.timeout,
        )
        .await?;

        let code = validate_redirect(&parse_redirect_url(&redirect), &pkce.state)?;

        let tokens = self
            .exchange_code_for_token(&metadata.token_endpoint, params, &code, &pkce.code_verifier)
            .await?;
        tracing::info!(expires_in = ?tokens.expires_in, "token exchange succeeded");
        Ok(tokens)
    }

    /// Redeems an authorization code at `token_endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`BpnrError::TokenExchange`] on transport failure, non-2xx
    /// status, or a response without an `access_token`.
    pub async fn exchange_code_for_token(
        &self,
        token_endpoint: &str,
        params: &OidcLoginParams,
        code: &str,
        code_verifier: &str,
    ) -> Result<OidcTokens> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", params.client_id.as_str()),
            ("redirect_uri", params.redirect_uri.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
        ];

        let raw = self
            .api
            .post_form(token_endpoint, &form)
            .await
            .map_err(|e| BpnrError::TokenExchange(format!("token request failed: {e}")))?;

        parse_token_response(&raw)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Appends the authorization request parameters to `endpoint`.
///
/// Parameters are added in a fixed order after any query the endpoint
/// already carries.
///
/// # Errors
///
/// Returns [`BpnrError::Configuration`] if `endpoint` is not an absolute URL.
pub fn build_authorization_url(
    endpoint: &str,
    params: &OidcLoginParams,
    pkce: &PkceMaterial,
) -> Result<String> {
    let mut url = Url::parse(endpoint).map_err(|e| {
        BpnrError::Configuration(format!("invalid authorization endpoint {endpoint}: {e}"))
    })?;

    url.query_pairs_mut()
        .append_pair("client_id", &params.client_id)
        .append_pair("redirect_uri", &params.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &params.scope)
        .append_pair("state", &pkce.state)
        .append_pair("code_challenge", &pkce.code_challenge)
        .append_pair("code_challenge_method", "S256");

    Ok(url.into())
}

/// Checks a parsed redirect and returns its authorization code.
///
/// Checks run in order: provider error, missing code, state mismatch.
///
/// # Errors
///
/// - [`BpnrError::Authorization`] if the redirect carries `error`.
/// - [`BpnrError::MissingCode`] if there is no non-empty `code`.
/// - [`BpnrError::StateMismatch`] if `state` differs from `expected_state`.
pub fn validate_redirect(result: &RedirectResult, expected_state: &str) -> Result<String> {
    if let Some(error) = &result.error {
        return Err(BpnrError::Authorization {
            error: error.clone(),
            description: result.error_description.clone(),
        }
        .into());
    }

    let code = match result.code.as_deref() {
        Some(code) if !code.is_empty() => code,
        _ => return Err(BpnrError::MissingCode.into()),
    };

    if result.state.as_deref() != Some(expected_state) {
        return Err(BpnrError::StateMismatch.into());
    }

    Ok(code.to_string())
}

/// Maps a token endpoint response onto [`OidcTokens`].
///
/// Optional fields count only when their JSON type is right.
///
/// # Errors
///
/// Returns [`BpnrError::TokenExchange`] if `raw` is not an object or has no
/// string `access_token`.
pub fn parse_token_response(raw: &Value) -> Result<OidcTokens> {
    let body = raw
        .as_object()
        .ok_or_else(|| BpnrError::TokenExchange("invalid token response".to_string()))?;

    let access_token = read_str(body, "access_token")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| BpnrError::TokenExchange("missing access_token".to_string()))?;

    Ok(OidcTokens {
        access_token: access_token.to_string(),
        refresh_token: read_str(body, "refresh_token").map(str::to_string),
        id_token: read_str(body, "id_token").map(str::to_string),
        token_type: read_str(body, "token_type").map(str::to_string),
        expires_in: body.get("expires_in").and_then(Value::as_u64),
        obtained_at: Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
