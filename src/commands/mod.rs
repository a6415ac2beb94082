/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes four top-level command modules:

- `discover`: Print the ERP discovery descriptor for a server
- `login`: Run the onboarding connect sequence and save the session
- `companies`: List companies for the connected server
- `session`: Show, select within, or clear the saved session
*/

use crate::auth::{AuthorizationView, FixtureAuthorizationView, LinkHub, SystemBrowser};
use crate::config::{Config, TransportKind};
use crate::error::{BpnrError, Result};
use std::sync::Arc;

// Companies listing and table output
pub mod companies;

// Session inspection and selection
pub mod session;

/// Picks the authorization view matching the configured transport.
///
/// The fixture backend has no login page, so fixture mode answers the
/// authorization request itself.
pub(crate) fn authorization_view(config: &Config, links: &Arc<LinkHub>) -> Arc<dyn AuthorizationView> {
    match config.http.transport {
        TransportKind::Fixture => Arc::new(FixtureAuthorizationView::new(links.clone())),
        TransportKind::Network => Arc::new(SystemBrowser),
    }
}

// Discover command handler
pub mod discover {
    //! Discovery handler.
    //!
    //! Normalizes the server input and prints the resulting descriptor as
    //! pretty JSON on stdout.

    use super::*;
    use crate::auth::discover;
    use crate::http::ApiClient;
    use crate::urls::normalize_server_url;

    /// Fetch and print the discovery descriptor for `server`
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration
    /// * `server` - Server URL or bare host name
    ///
    /// # Errors
    ///
    /// Returns `InvalidServerUrl` for unusable input, or a `Discovery` error.
    pub async fn run_discover(config: &Config, server: &str) -> Result<()> {
        let server_url = normalize_server_url(server)
            .ok_or_else(|| BpnrError::InvalidServerUrl(server.trim().to_string()))?;

        let api = ApiClient::from_config(&config.http)?;
        let discovery = discover(&api, &server_url).await?;

        println!("{}", serde_json::to_string_pretty(&discovery)?);
        Ok(())
    }
}

// Login command handler
pub mod login {
    //! Login handler.
    //!
    //! Runs the onboarding sequence against the chosen server.  Callback URLs
    //! pasted on stdin are fed into the incoming-URL hub, standing in for the
    //! platform deep-link handler.

    use super::*;
    use crate::commands::companies::print_companies_table;
    use crate::onboarding::Onboarding;
    use crate::session::Session;
    use colored::Colorize;
    use std::io::BufRead;

    /// Connect to a server, sign in, and save the session
    ///
    /// The server is taken from the argument, then `server.url` from config,
    /// then the server of the saved session.
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration
    /// * `server` - Optional server override
    /// * `callback_url` - Optional callback URL delivered at launch
    ///
    /// # Errors
    ///
    /// Returns an error if no server is known or any connect step fails.
    pub async fn run_login(
        config: &Config,
        server: Option<String>,
        callback_url: Option<String>,
    ) -> Result<()> {
        let session_path = config.session.resolve_path()?;
        let mut session = Session::load(&session_path)?;

        let input = server
            .or_else(|| config.server.url.clone())
            .or_else(|| (!session.server_url.is_empty()).then(|| session.server_url.clone()))
            .ok_or_else(|| {
                BpnrError::Config("no server given; pass one or set server.url".to_string())
            })?;

        let links = Arc::new(LinkHub::new());
        links.set_initial_url(callback_url);
        if config.http.transport == TransportKind::Network {
            spawn_stdin_feeder(links.clone());
            eprintln!(
                "{}",
                "After signing in, paste the callback URL here if the browser does not return to bpnr."
                    .dimmed()
            );
        }

        let view = authorization_view(config, &links);
        let onboarding = Onboarding::from_config(config, view, links)?;
        let outcome = onboarding.connect(&mut session, &input).await?;

        session.save(&session_path)?;

        println!(
            "{} {}",
            "Signed in to".green().bold(),
            outcome.server_url.cyan()
        );
        print_companies_table(&outcome.companies, session.selected_company_id());
        Ok(())
    }

    /// Publishes each non-empty stdin line to `links`.
    ///
    /// Runs on a detached OS thread; a blocking read on stdin would keep a
    /// runtime worker from shutting down.
    fn spawn_stdin_feeder(links: Arc<LinkHub>) {
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines().map_while(std::result::Result::ok) {
                let line = line.trim();
                if !line.is_empty() {
                    links.publish(line);
                }
            }
        });
    }
}
