//! Configuration management for BPNR
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Precedence, lowest to highest: built-in defaults, YAML file, `BPNR_*`
//! environment variables, command-line flags.

use crate::error::{BpnrError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for BPNR
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// ERP server selection
    #[serde(default)]
    pub server: ServerConfig,
    /// OIDC login parameters
    #[serde(default)]
    pub auth: AuthConfig,
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
    /// Session persistence settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// ERP server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server URL used when a command does not name one explicitly
    #[serde(default)]
    pub url: Option<String>,
}

/// OIDC login configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Client id used when the discovery document does not advertise one
    #[serde(default = "default_client_id")]
    pub default_client_id: String,

    /// Redirect URI registered with the identity provider
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Space-separated scopes requested during login
    #[serde(default = "default_scope")]
    pub scope: String,

    /// How long to wait for the authorization redirect (seconds)
    #[serde(default = "default_login_timeout")]
    pub login_timeout_seconds: u64,
}

fn default_client_id() -> String {
    "bpnr-mobile".to_string()
}

fn default_redirect_uri() -> String {
    "bpnr://auth/callback".to_string()
}

fn default_scope() -> String {
    "openid profile offline_access".to_string()
}

fn default_login_timeout() -> u64 {
    300
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            default_client_id: default_client_id(),
            redirect_uri: default_redirect_uri(),
            scope: default_scope(),
            login_timeout_seconds: default_login_timeout(),
        }
    }
}

impl AuthConfig {
    /// Login redirect deadline as a [`Duration`].
    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_seconds)
    }
}

/// Which [`Transport`](crate::http::Transport) the API client uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Real network requests
    #[default]
    Network,
    /// In-process fixture backend
    #[serde(alias = "mock")]
    #[value(alias = "mock")]
    Fixture,
}

impl std::str::FromStr for TransportKind {
    type Err = BpnrError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "network" => Ok(TransportKind::Network),
            "fixture" | "mock" => Ok(TransportKind::Fixture),
            other => Err(BpnrError::Config(format!("unknown transport: {other}"))),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout (seconds)
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,

    /// Transport strategy
    #[serde(default)]
    pub transport: TransportKind,
}

fn default_http_timeout() -> u64 {
    15
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            transport: TransportKind::default(),
        }
    }
}

impl HttpConfig {
    /// Per-request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Override for the session file location
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl SessionConfig {
    /// Resolves the session file path.
    ///
    /// Uses the configured path when set, otherwise `session.json` inside the
    /// platform data directory.
    ///
    /// # Errors
    ///
    /// Returns [`BpnrError::Session`] if no home directory can be determined
    /// and no explicit path is configured.
    pub fn resolve_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let dirs = directories::ProjectDirs::from("com", "bpnr", "bpnr").ok_or_else(|| {
            BpnrError::Session("cannot determine a data directory for the session".to_string())
        })?;
        Ok(dirs.data_dir().join("session.json"))
    }
}

impl Config {
    /// Load configuration from file, environment variables, and CLI overrides
    ///
    /// A missing file is not an error; defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns [`BpnrError::Config`] if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BpnrError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| BpnrError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("BPNR_SERVER_URL") {
            self.server.url = Some(url);
        }

        if let Ok(client_id) = std::env::var("BPNR_CLIENT_ID") {
            self.auth.default_client_id = client_id;
        }

        if let Ok(redirect_uri) = std::env::var("BPNR_REDIRECT_URI") {
            self.auth.redirect_uri = redirect_uri;
        }

        if let Ok(scope) = std::env::var("BPNR_SCOPE") {
            self.auth.scope = scope;
        }

        if let Ok(timeout) = std::env::var("BPNR_LOGIN_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.auth.login_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid BPNR_LOGIN_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(timeout) = std::env::var("BPNR_HTTP_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.http.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid BPNR_HTTP_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(transport) = std::env::var("BPNR_TRANSPORT") {
            match transport.parse() {
                Ok(kind) => self.http.transport = kind,
                Err(e) => tracing::warn!("Invalid BPNR_TRANSPORT: {}", e),
            }
        }

        if let Ok(path) = std::env::var("BPNR_SESSION_PATH") {
            self.session.path = Some(PathBuf::from(path));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(kind) = cli.transport {
            self.http.transport = kind;
        }
        if let Some(path) = &cli.session_path {
            self.session.path = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`BpnrError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.auth.default_client_id.trim().is_empty() {
            return Err(BpnrError::Config("auth.default_client_id must not be empty".into()).into());
        }

        if self.auth.scope.trim().is_empty() {
            return Err(BpnrError::Config("auth.scope must not be empty".into()).into());
        }

        if url::Url::parse(&self.auth.redirect_uri).is_err() {
            return Err(BpnrError::Config(format!(
                "auth.redirect_uri is not an absolute URI: {}",
                self.auth.redirect_uri
            ))
            .into());
        }

        if self.auth.login_timeout_seconds == 0 {
            return Err(
                BpnrError::Config("auth.login_timeout_seconds must be positive".into()).into(),
            );
        }

        if self.http.timeout_seconds == 0 {
            return Err(BpnrError::Config("http.timeout_seconds must be positive".into()).into());
        }

        Ok(())
    }
}
