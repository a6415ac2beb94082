//! ERP discovery and OIDC login
//!
//! # Module layout
//!
//! - [`discovery`] -- ERP discovery document and OpenID configuration
//! - [`pkce`] -- PKCE S256 verifier, challenge, and state generation
//! - [`redirect`] -- incoming-URL hub, redirect wait, and redirect parsing
//! - [`view`] -- authorization views (system browser, fixture)
//! - [`flow`] -- the end-to-end authorization code flow

pub mod discovery;
pub mod flow;
pub mod pkce;
pub mod redirect;
pub mod view;

pub use discovery::{discover, ErpDiscovery, OpenIdConfiguration};
pub use flow::{OidcLoginParams, OidcTokens, PkceLoginFlow};
pub use redirect::LinkHub;
pub use view::{AuthorizationView, FixtureAuthorizationView, SystemBrowser};
