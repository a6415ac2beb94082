//! Client session state
//!
//! A [`Session`] has a persisted part and a volatile part:
//!
//! | Field                            | Persisted |
//! |----------------------------------|-----------|
//! | `server_url`                     | yes       |
//! | `discovery`                      | yes       |
//! | `selected_company_by_server_url` | yes       |
//! | `access_token`, `refresh_token`  | no        |
//! | `companies`                      | no        |
//!
//! Tokens never touch disk.  A session loaded from a file therefore never
//! reports as onboarded until a fresh login has run in the same process.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::auth::{ErpDiscovery, OidcTokens};
use crate::companies::Company;
use crate::error::{BpnrError, Result};

/// Connection state for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Normalized origin of the connected ERP server; empty when unset
    #[serde(default)]
    pub server_url: String,

    /// Discovery descriptor for `server_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery: Option<ErpDiscovery>,

    /// Selected company id, keyed by server URL
    #[serde(default)]
    pub selected_company_by_server_url: BTreeMap<String, String>,

    /// Access token from the last login in this process
    #[serde(skip)]
    pub access_token: Option<String>,

    /// Refresh token from the last login in this process
    #[serde(skip)]
    pub refresh_token: Option<String>,

    /// Companies loaded in this process
    #[serde(skip)]
    pub companies: Vec<Company>,
}

impl Session {
    /// Loads the persisted part of a session.
    ///
    /// A missing file yields an empty session.
    ///
    /// # Errors
    ///
    /// Returns [`BpnrError::Session`] if the file exists but cannot be read
    /// or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no session file at {}", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            BpnrError::Session(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            BpnrError::Session(format!("failed to parse {}: {e}", path.display())).into()
        })
    }

    /// Writes the persisted part of the session, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O or serialization error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        tracing::debug!("session saved to {}", path.display());
        Ok(())
    }

    /// Removes the session file if it exists.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if an existing file cannot be removed.
    pub fn remove(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Starts connecting to `server_url`.
    ///
    /// Clears tokens, companies, and discovery so nothing from a previous
    /// server survives a failed connect.  Company selections are kept.
    pub fn begin_connect(&mut self, server_url: &str) {
        self.server_url = server_url.to_string();
        self.discovery = None;
        self.clear_credentials();
    }

    /// Drops tokens and the loaded company list.
    pub fn clear_credentials(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.companies.clear();
    }

    /// Records the discovery descriptor for the current server.
    pub fn commit_discovery(&mut self, discovery: ErpDiscovery) {
        self.discovery = Some(discovery);
    }

    /// Records tokens from a successful login.
    pub fn commit_tokens(&mut self, tokens: &OidcTokens) {
        self.access_token = Some(tokens.access_token.clone());
        self.refresh_token = tokens.refresh_token.clone();
    }

    /// Replaces the loaded company list.
    pub fn set_companies(&mut self, companies: Vec<Company>) {
        self.companies = companies;
    }

    /// Selects `company_id` for the current server.
    ///
    /// An empty id clears the selection.  Without a server URL this does
    /// nothing.
    pub fn select_company(&mut self, company_id: &str) {
        if self.server_url.is_empty() {
            return;
        }
        if company_id.is_empty() {
            self.selected_company_by_server_url.remove(&self.server_url);
        } else {
            self.selected_company_by_server_url
                .insert(self.server_url.clone(), company_id.to_string());
        }
    }

    /// The selected company id for the current server, or `""`.
    pub fn selected_company_id(&self) -> &str {
        if self.server_url.is_empty() {
            return "";
        }
        self.selected_company_by_server_url
            .get(&self.server_url)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// The selected company, falling back to the first loaded company.
    pub fn selected_company(&self) -> Option<&Company> {
        let selected = self.selected_company_id();
        self.companies
            .iter()
            .find(|c| c.id == selected)
            .or_else(|| self.companies.first())
    }

    /// True when a server, discovery, access token, and a selected company
    /// that is present in the loaded list are all set.
    pub fn is_onboarded(&self) -> bool {
        let selected = self.selected_company_id();
        let has_company = !selected.is_empty() && self.companies.iter().any(|c| c.id == selected);

        !self.server_url.is_empty()
            && self.discovery.is_some()
            && self.access_token.is_some()
            && has_company
    }
}
