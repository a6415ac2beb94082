//! Error types for BPNR
//!
//! This module defines all error types used throughout the crate, using
//! `thiserror` for ergonomic error handling.  Every login attempt failure is
//! terminal: callers inspect the variant (via `downcast_ref`) to decide what
//! to show the user and restart from server entry.

use thiserror::Error;

/// Main error type for BPNR operations
///
/// The first group of variants covers the discovery and PKCE login taxonomy;
/// the remainder covers the supporting HTTP client, session, and
/// configuration layers.
#[derive(Error, Debug)]
pub enum BpnrError {
    /// ERP discovery document unreachable, malformed, or missing the issuer
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// OpenID Connect metadata is unreachable or incomplete
    #[error("OIDC configuration error: {0}")]
    Configuration(String),

    /// The identity provider reported an error on the redirect
    #[error("Authorization error: {error}{}", describe(.description))]
    Authorization {
        /// The `error` code returned by the identity provider
        error: String,
        /// Optional human-readable `error_description`
        description: Option<String>,
    },

    /// The redirect carried neither an error nor an authorization code
    #[error("Missing authorization code")]
    MissingCode,

    /// The redirect `state` does not belong to this login attempt
    #[error("Invalid login state")]
    StateMismatch,

    /// No matching redirect arrived before the deadline
    #[error("Login timed out after {seconds}s")]
    Timeout {
        /// The deadline that elapsed, in seconds
        seconds: u64,
    },

    /// Token endpoint failure or a response without `access_token`
    #[error("Token exchange error: {0}")]
    TokenExchange(String),

    /// Required cryptographic primitives are unavailable
    #[error("Environment error: {0}")]
    Environment(String),

    /// Companies endpoint returned nothing usable
    #[error("Companies error: {0}")]
    Companies(String),

    /// User-supplied server URL could not be normalized
    #[error("Invalid server URL: {0}")]
    InvalidServerUrl(String),

    /// Non-success HTTP status from the API client
    #[error("HTTP {status}")]
    Http {
        /// Response status code
        status: u16,
        /// Response body, when it could be read
        body: Option<String>,
    },

    /// Transport-level failure (connection refused, timeout, bad body)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session persistence errors
    #[error("Session error: {0}")]
    Session(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn describe(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

/// Result type alias for BPNR operations
///
/// Uses `anyhow::Error` as the error type, allowing rich context while
/// preserving the underlying [`BpnrError`] for `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;

/// Returns the [`BpnrError`] carried by an `anyhow::Error`, if any.
///
/// # Examples
///
/// ```
/// use bpnr::error::{kind, BpnrError};
///
/// let err: anyhow::Error = BpnrError::MissingCode.into();
/// assert!(matches!(kind(&err), Some(BpnrError::MissingCode)));
/// ```
pub fn kind(err: &anyhow::Error) -> Option<&BpnrError> {
    err.downcast_ref::<BpnrError>()
}
