//! Authorization views
//!
//! An [`AuthorizationView`] presents the identity provider's login page to
//! the user.  On a desktop that means the system browser; in fixture mode
//! the view answers immediately by publishing a canned redirect.

use std::sync::Arc;

use crate::auth::redirect::LinkHub;
use crate::error::{BpnrError, Result};

/// Code placed in redirects produced by [`FixtureAuthorizationView`].
pub const FIXTURE_AUTHORIZATION_CODE: &str = "fixture-code";

/// Presents an authorization URL to the user.
///
/// `open` returns once the view has been launched; it does not wait for the
/// user to finish.  The redirect arrives separately through the
/// [`LinkHub`].
#[async_trait::async_trait]
pub trait AuthorizationView: Send + Sync + std::fmt::Debug {
    /// Launches the view for `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the view could not be launched at all.
    async fn open(&self, url: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// SystemBrowser
// ---------------------------------------------------------------------------

/// Opens the authorization URL in the system browser.
///
/// The URL is always printed to stderr so the user can copy it when no
/// browser is available.  Launching the browser is best effort.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

#[async_trait::async_trait]
impl AuthorizationView for SystemBrowser {
    async fn open(&self, url: &str) -> Result<()> {
        eprintln!("Open this URL to sign in:\n\n  {url}\n");
        try_open_browser(url);
        Ok(())
    }
}

fn try_open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let launcher = Some("open");
    #[cfg(target_os = "linux")]
    let launcher = Some("xdg-open");
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    let launcher: Option<&str> = None;

    if let Some(program) = launcher {
        if let Err(e) = std::process::Command::new(program).arg(url).spawn() {
            tracing::debug!("could not launch {}: {}", program, e);
        }
    }
}

// ---------------------------------------------------------------------------
// FixtureAuthorizationView
// ---------------------------------------------------------------------------

/// View that completes the login instantly for the fixture backend.
///
/// Reads `redirect_uri` and `state` from the authorization URL and publishes
/// `<redirect_uri>?code=fixture-code&state=<state>` to the hub.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use futures::StreamExt;
/// use bpnr::auth::redirect::LinkHub;
/// use bpnr::auth::view::{AuthorizationView, FixtureAuthorizationView};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> bpnr::error::Result<()> {
/// let hub = Arc::new(LinkHub::new());
/// let mut links = hub.subscribe();
///
/// FixtureAuthorizationView::new(hub.clone())
///     .open("https://idp.example/auth?redirect_uri=bpnr%3A%2F%2Fcb&state=s1")
///     .await?;
///
/// assert_eq!(
///     links.next().await.as_deref(),
///     Some("bpnr://cb?code=fixture-code&state=s1")
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FixtureAuthorizationView {
    links: Arc<LinkHub>,
}

impl FixtureAuthorizationView {
    /// Creates a view publishing to `links`.
    pub fn new(links: Arc<LinkHub>) -> Self {
        Self { links }
    }
}

#[async_trait::async_trait]
impl AuthorizationView for FixtureAuthorizationView {
    async fn open(&self, url: &str) -> Result<()> {
        let parsed = url::Url::parse(url)
            .map_err(|e| BpnrError::Configuration(format!("invalid authorization URL: {e}")))?;

        let mut redirect_uri = None;
        let mut state = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "redirect_uri" if redirect_uri.is_none() => redirect_uri = Some(value.into_owned()),
                "state" if state.is_none() => state = Some(value.into_owned()),
                _ => {}
            }
        }

        let redirect_uri = redirect_uri.ok_or_else(|| {
            BpnrError::Configuration("authorization URL has no redirect_uri".to_string())
        })?;

        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("code", FIXTURE_AUTHORIZATION_CODE)
            .append_pair("state", state.as_deref().unwrap_or_default())
            .finish();

        tracing::debug!("fixture view completing authorization");
        self.links.publish(format!("{redirect_uri}?{query}"));
        Ok(())
    }
}
