//! Companies command for BPNR
//!
//! Lists the companies available on the connected server and marks the
//! selected one.

use crate::companies::{fetch_companies, Company};
use crate::config::Config;
use crate::error::{BpnrError, Result};
use crate::http::ApiClient;
use crate::session::Session;
use prettytable::{cell, row, Table};

/// List companies for the server in the saved session
///
/// Tokens are never persisted, so the caller passes one explicitly.
///
/// # Arguments
///
/// * `config` - Global configuration
/// * `token` - Bearer access token
///
/// # Errors
///
/// Returns a `Session` error if no server has been discovered yet, or the
/// error from the companies endpoint.
pub async fn list_companies(config: &Config, token: &str) -> Result<()> {
    let session = Session::load(&config.session.resolve_path()?)?;
    let discovery = session.discovery.as_ref().ok_or_else(|| {
        BpnrError::Session("not connected to a server; run `bpnr login` first".to_string())
    })?;

    let api = ApiClient::from_config(&config.http)?;
    let companies = fetch_companies(&api, &discovery.api_base_url, token).await?;

    print_companies_table(&companies, session.selected_company_id());
    Ok(())
}

/// Print companies as a table, marking `selected_id` with `*`
pub fn print_companies_table(companies: &[Company], selected_id: &str) {
    let mut table = Table::new();
    table.add_row(row!["", "Company ID", "Name"]);

    for company in companies {
        let marker = if company.id == selected_id { "*" } else { "" };
        table.add_row(row![marker, company.id, company.name]);
    }

    println!("\nAvailable companies:\n");
    table.printstd();
    println!();
}
