//! Connect sequence: normalize, discover, log in, load companies
//!
//! [`Onboarding::connect`] takes free-form server input and leaves the
//! [`Session`] either fully connected or without credentials.  It never
//! leaves tokens from a failed attempt behind.

use std::sync::Arc;

use crate::auth::{discover, AuthorizationView, ErpDiscovery, LinkHub, OidcLoginParams, OidcTokens, PkceLoginFlow};
use crate::companies::{fetch_companies, Company};
use crate::config::{AuthConfig, Config};
use crate::error::{BpnrError, Result};
use crate::http::ApiClient;
use crate::session::Session;
use crate::urls::normalize_server_url;

/// Everything learned during a successful connect.
#[derive(Debug, Clone)]
pub struct ConnectOutcome {
    /// Normalized server origin
    pub server_url: String,
    /// Discovery descriptor for the server
    pub discovery: ErpDiscovery,
    /// Tokens from the login
    pub tokens: OidcTokens,
    /// Companies available to the user
    pub companies: Vec<Company>,
    /// Company selected once the connect finished
    pub selected_company: Option<Company>,
}

/// Orchestrates the onboarding connect sequence.
#[derive(Debug, Clone)]
pub struct Onboarding {
    api: ApiClient,
    flow: PkceLoginFlow,
    auth: AuthConfig,
}

impl Onboarding {
    /// Creates an orchestrator from its parts.
    pub fn new(api: ApiClient, flow: PkceLoginFlow, auth: AuthConfig) -> Self {
        Self { api, flow, auth }
    }

    /// Builds the HTTP client and login flow described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be constructed.
    pub fn from_config(
        config: &Config,
        view: Arc<dyn AuthorizationView>,
        links: Arc<LinkHub>,
    ) -> Result<Self> {
        let api = ApiClient::from_config(&config.http)?;
        let flow = PkceLoginFlow::new(api.clone(), view, links)
            .with_timeout(config.auth.login_timeout());
        Ok(Self::new(api, flow, config.auth.clone()))
    }

    /// Connects `session` to the server named by `input`.
    ///
    /// Steps, in order:
    ///
    /// 1. Normalize `input` to an origin.
    /// 2. Reset the session for that origin.
    /// 3. Discover and record the ERP descriptor.
    /// 4. Log in with the advertised client id, or the configured default.
    /// 5. Record tokens, then load and record companies.
    /// 6. Select the first company if none is selected for this server.
    ///
    /// # Errors
    ///
    /// Returns [`BpnrError::InvalidServerUrl`] for unusable input, otherwise
    /// the error of the first failing step.  On any error the session holds
    /// no tokens and no companies.
    pub async fn connect(&self, session: &mut Session, input: &str) -> Result<ConnectOutcome> {
        let server_url = normalize_server_url(input)
            .ok_or_else(|| BpnrError::InvalidServerUrl(input.trim().to_string()))?;

        session.begin_connect(&server_url);
        match self.run(session, &server_url).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                session.clear_credentials();
                tracing::warn!(server = %server_url, "connect failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run(&self, session: &mut Session, server_url: &str) -> Result<ConnectOutcome> {
        let discovery = discover(&self.api, server_url).await?;
        session.commit_discovery(discovery.clone());
        tracing::info!(server = %server_url, realm = ?discovery.realm, "server discovered");

        let params = OidcLoginParams {
            issuer: discovery.oidc_issuer.clone(),
            client_id: discovery
                .client_id
                .clone()
                .unwrap_or_else(|| self.auth.default_client_id.clone()),
            redirect_uri: self.auth.redirect_uri.clone(),
            scope: self.auth.scope.clone(),
        };
        let tokens = self.flow.login(&params).await?;
        session.commit_tokens(&tokens);

        let companies =
            fetch_companies(&self.api, &discovery.api_base_url, &tokens.access_token).await?;
        session.set_companies(companies.clone());

        if session.selected_company_id().is_empty() {
            if let Some(first) = companies.first() {
                session.select_company(&first.id);
            }
        }
        let selected_company = session.selected_company().cloned();

        Ok(ConnectOutcome {
            server_url: server_url.to_string(),
            discovery,
            tokens,
            companies,
            selected_company,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::FixtureAuthorizationView;
    use crate::http::fixture::FIXTURE_ACCESS_TOKEN;
    use crate::test_utils::{assert_bpnr_error, fixture_config, temp_dir};

    fn fixture_onboarding() -> Onboarding {
        let dir = temp_dir();
        let config = fixture_config(&dir);
        let links = Arc::new(LinkHub::new());
        let view = Arc::new(FixtureAuthorizationView::new(links.clone()));
        Onboarding::from_config(&config, view, links).unwrap()
    }

    #[tokio::test]
    async fn test_connect_with_fixture_backend() {
        let onboarding = fixture_onboarding();
        let mut session = Session::default();

        let outcome = onboarding
            .connect(&mut session, "  erp.acme.example/some/path ")
            .await
            .unwrap();

        assert_eq!(outcome.server_url, "https://erp.acme.example");
        assert_eq!(outcome.tokens.access_token, FIXTURE_ACCESS_TOKEN);
        assert_eq!(outcome.companies.len(), 4);
        assert_eq!(
            outcome.selected_company.map(|c| c.id),
            Some("geovi-it-ltd".to_string())
        );
        assert!(session.is_onboarded());
    }

    #[tokio::test]
    async fn test_connect_keeps_existing_selection() {
        let onboarding = fixture_onboarding();
        let mut session = Session::default();
        session.begin_connect("https://erp.acme.example");
        session.select_company("acme-ood");

        let outcome = onboarding
            .connect(&mut session, "https://erp.acme.example")
            .await
            .unwrap();
        assert_eq!(
            outcome.selected_company.map(|c| c.id),
            Some("acme-ood".to_string())
        );
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let onboarding = fixture_onboarding();
        let mut session = Session::default();

        for input in ["", "   ", "ftp://erp.example"] {
            assert_bpnr_error(onboarding.connect(&mut session, input).await, |e| {
                matches!(e, BpnrError::InvalidServerUrl(_))
            });
        }
        assert!(session.server_url.is_empty());
    }
}
