//! Session commands for BPNR

use crate::config::Config;
use crate::error::{BpnrError, Result};
use crate::session::Session;
use colored::Colorize;
use prettytable::{cell, row, Table};

/// Print the saved session
///
/// # Errors
///
/// Returns an error if the session file exists but cannot be read.
pub fn show_session(config: &Config) -> Result<()> {
    let path = config.session.resolve_path()?;
    let session = Session::load(&path)?;

    if session.server_url.is_empty() {
        println!("{}", "No saved session".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["Server", session.server_url]);
    if let Some(discovery) = &session.discovery {
        table.add_row(row!["Issuer", discovery.oidc_issuer]);
        table.add_row(row!["API base", discovery.api_base_url]);
        table.add_row(row!["Realm", discovery.realm.as_deref().unwrap_or("-")]);
        table.add_row(row!["Client ID", discovery.client_id.as_deref().unwrap_or("-")]);
        if let Some(modules) = &discovery.modules {
            table.add_row(row!["Modules", modules.join(", ")]);
        }
    }
    let selected = match session.selected_company_id() {
        "" => "-",
        id => id,
    };
    table.add_row(row!["Selected company", selected]);

    println!("\nSession ({}):\n", path.display());
    table.printstd();
    println!();
    Ok(())
}

/// Select a company for the server in the saved session
///
/// # Errors
///
/// Returns a `Session` error if no server is connected.
pub fn select_company(config: &Config, company_id: &str) -> Result<()> {
    let path = config.session.resolve_path()?;
    let mut session = Session::load(&path)?;

    if session.server_url.is_empty() {
        return Err(BpnrError::Session(
            "not connected to a server; run `bpnr login` first".to_string(),
        )
        .into());
    }

    session.select_company(company_id);
    session.save(&path)?;

    if company_id.is_empty() {
        println!("Cleared company selection for {}", session.server_url.cyan());
    } else {
        println!(
            "Selected {} for {}",
            company_id.green().bold(),
            session.server_url.cyan()
        );
    }
    Ok(())
}

/// Delete the saved session
///
/// # Errors
///
/// Returns an I/O error if the file cannot be removed.
pub fn clear_session(config: &Config) -> Result<()> {
    let path = config.session.resolve_path()?;
    Session::remove(&path)?;
    println!("Session cleared");
    Ok(())
}
