//! BPNR - ERP discovery and OIDC login client library
//!
//! This library resolves a user-supplied ERP server into OIDC endpoints,
//! drives an authorization code login with PKCE, and loads the companies
//! available to the signed-in user.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: ERP discovery, PKCE material, redirect capture, and the login flow
//! - `http`: JSON API client over an injected transport (network or fixture)
//! - `companies`: Companies service
//! - `session`: Persisted and volatile session state
//! - `onboarding`: The connect sequence tying the above together
//! - `urls`: Server URL normalization
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bpnr::auth::{FixtureAuthorizationView, LinkHub};
//! use bpnr::config::TransportKind;
//! use bpnr::{Config, Onboarding, Session};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::load("config.yaml", &Default::default())?;
//!     config.http.transport = TransportKind::Fixture;
//!     config.validate()?;
//!
//!     let links = Arc::new(LinkHub::new());
//!     let view = Arc::new(FixtureAuthorizationView::new(links.clone()));
//!     let onboarding = Onboarding::from_config(&config, view, links)?;
//!
//!     let mut session = Session::default();
//!     onboarding.connect(&mut session, "erp.acme.example").await?;
//!     assert!(session.is_onboarded());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod companies;
pub mod config;
pub mod error;
pub mod http;
pub mod onboarding;
pub mod session;
pub mod urls;

// Re-export commonly used types
pub use auth::{ErpDiscovery, OidcTokens, PkceLoginFlow};
pub use companies::Company;
pub use config::Config;
pub use error::{BpnrError, Result};
pub use onboarding::{ConnectOutcome, Onboarding};
pub use session::Session;

#[cfg(test)]
pub mod test_utils;
