//! Authorization redirect capture
//!
//! After the authorization view is opened, the identity provider sends the
//! user back to the redirect URI (`bpnr://auth/callback?code=...&state=...`).
//! The redirect can reach the process in two ways:
//!
//! - as an event on the incoming-URL stream published through [`LinkHub`];
//! - as the URL the process was launched with ([`LinkHub::initial_url`]).
//!
//! [`wait_for_redirect`] races both sources against a deadline and returns
//! the first URL that starts with the redirect URI.  [`parse_redirect_url`]
//! then extracts the OAuth parameters from it.

use std::future::Future;
use std::time::Duration;

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use percent_encoding::percent_decode_str;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::BroadcastStream;

use crate::error::{BpnrError, Result};

/// Buffered URLs per subscriber before the oldest is dropped.
const LINK_CHANNEL_CAPACITY: usize = 16;

// ---------------------------------------------------------------------------
// RedirectResult
// ---------------------------------------------------------------------------

/// OAuth parameters carried by a redirect URL.
///
/// Every field is optional; validation happens in the login flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectResult {
    /// Authorization code
    pub code: Option<String>,
    /// Echoed `state` value
    pub state: Option<String>,
    /// OAuth error code reported by the provider
    pub error: Option<String>,
    /// Human-readable error description
    pub error_description: Option<String>,
}

/// Extracts `code`, `state`, `error`, and `error_description` from a
/// redirect URL.
///
/// Only the query component is inspected: everything after the first `?` up
/// to an optional `#`.  Keys and values are percent-decoded; a literal `+`
/// is kept as-is.  When a key repeats, the last occurrence wins.  A URL
/// without a query yields an empty result.
///
/// # Examples
///
/// ```
/// use bpnr::auth::redirect::parse_redirect_url;
///
/// let result = parse_redirect_url("bpnr://auth/callback?code=abc&state=x%2Fy#frag");
/// assert_eq!(result.code.as_deref(), Some("abc"));
/// assert_eq!(result.state.as_deref(), Some("x/y"));
/// assert!(result.error.is_none());
/// ```
pub fn parse_redirect_url(url: &str) -> RedirectResult {
    let mut result = RedirectResult::default();

    let Some((_, query)) = url.split_once('?') else {
        return result;
    };
    let query = query.split('#').next().unwrap_or_default();

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = percent_decode_str(key).decode_utf8_lossy();
        let slot = match key.as_ref() {
            "code" => &mut result.code,
            "state" => &mut result.state,
            "error" => &mut result.error,
            "error_description" => &mut result.error_description,
            _ => continue,
        };
        *slot = Some(percent_decode_str(value).decode_utf8_lossy().into_owned());
    }

    result
}

// ---------------------------------------------------------------------------
// LinkHub
// ---------------------------------------------------------------------------

/// Process-wide source of incoming URLs.
///
/// Stands in for the platform's deep-link mechanism: whatever receives a URL
/// destined for this application calls [`publish`](Self::publish), and any
/// number of subscribers see it.  Dropping a subscription stream
/// unsubscribes it.
///
/// # Examples
///
/// ```
/// use bpnr::auth::redirect::LinkHub;
///
/// let hub = LinkHub::new();
/// assert_eq!(hub.listener_count(), 0);
///
/// let stream = hub.subscribe();
/// assert_eq!(hub.listener_count(), 1);
///
/// drop(stream);
/// assert_eq!(hub.listener_count(), 0);
/// ```
#[derive(Debug)]
pub struct LinkHub {
    events: broadcast::Sender<String>,
    initial: watch::Sender<Option<String>>,
}

impl Default for LinkHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkHub {
    /// Creates a hub with no subscribers and no initial URL.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(LINK_CHANNEL_CAPACITY);
        let (initial, _) = watch::channel(None);
        Self { events, initial }
    }

    /// Delivers `url` to every current subscriber.
    ///
    /// Returns the number of subscribers that received it.  Publishing with
    /// no subscribers is not an error; the URL is simply dropped.
    pub fn publish(&self, url: impl Into<String>) -> usize {
        match self.events.send(url.into()) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!("incoming URL published with no listeners");
                0
            }
        }
    }

    /// Subscribes to URLs published from now on.
    ///
    /// URLs published before the call are not replayed.  A subscriber that
    /// falls more than the channel capacity behind silently skips the
    /// missed URLs.
    pub fn subscribe(&self) -> BoxStream<'static, String> {
        BroadcastStream::new(self.events.subscribe())
            .filter_map(|item| futures::future::ready(item.ok()))
            .boxed()
    }

    /// Records the URL the process was launched with.
    pub fn set_initial_url(&self, url: Option<String>) {
        self.initial.send_replace(url);
    }

    /// Returns the URL the process was launched with, if any.
    ///
    /// Reading does not consume it.
    pub fn initial_url(&self) -> Option<String> {
        self.initial.borrow().clone()
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }
}

// ---------------------------------------------------------------------------
// Waiting
// ---------------------------------------------------------------------------

/// Waits for the first URL starting with `redirect_uri` from either source.
///
/// `events` is the incoming-URL stream and `initial` resolves to the launch
/// URL.  URLs that do not start with `redirect_uri` are ignored.  A source
/// that ends without a match stays silent rather than failing, so the other
/// source or the deadline decides.
///
/// Both sources are dropped before this function returns, whichever way it
/// settles.  For a [`LinkHub`] subscription that means the listener count is
/// back where it was before subscribing.
///
/// # Errors
///
/// Returns [`BpnrError::Timeout`] if no matching URL arrives before
/// `deadline`.
pub async fn wait_for_redirect<S, F>(
    events: S,
    initial: F,
    redirect_uri: &str,
    deadline: Duration,
) -> Result<String>
where
    S: Stream<Item = String> + Unpin,
    F: Future<Output = Option<String>>,
{
    let from_events = first_matching(events, redirect_uri);
    let from_initial = async move {
        match initial.await {
            Some(url) if url.starts_with(redirect_uri) => url,
            _ => std::future::pending().await,
        }
    };

    let race = async move {
        tokio::select! {
            url = from_events => url,
            url = from_initial => url,
        }
    };

    tokio::time::timeout(deadline, race).await.map_err(|_| {
        let seconds = deadline.as_millis().div_ceil(1000) as u64;
        tracing::warn!(seconds, "login timed out waiting for redirect");
        BpnrError::Timeout { seconds }.into()
    })
}

async fn first_matching<S>(mut events: S, redirect_uri: &str) -> String
where
    S: Stream<Item = String> + Unpin,
{
    while let Some(url) = events.next().await {
        if url.starts_with(redirect_uri) {
            return url;
        }
        tracing::debug!(url = %url, "ignoring incoming URL");
    }
    std::future::pending().await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
