//! Command-line interface definition for BPNR
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for discovery, login, companies, and the session.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::TransportKind;

/// BPNR - ERP discovery and OIDC login client
///
/// Connects to an ERP server, signs in through the identity provider it
/// advertises, and lists the companies available to the user.
#[derive(Parser, Debug, Clone)]
#[command(name = "bpnr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// HTTP transport override (network, fixture)
    #[arg(long, global = true, value_enum)]
    pub transport: Option<TransportKind>,

    /// Session file override
    #[arg(long, global = true)]
    pub session_path: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for BPNR
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Fetch and print the ERP discovery descriptor for a server
    Discover {
        /// Server URL or host name
        server: String,
    },

    /// Connect to a server and sign in
    ///
    /// Paste the callback URL shown by the browser on stdin when the
    /// redirect cannot reach the process by itself.
    Login {
        /// Server URL or host name; defaults to `server.url` from config
        server: Option<String>,

        /// Callback URL delivered at launch
        #[arg(long)]
        callback_url: Option<String>,
    },

    /// List companies for the connected server
    Companies {
        /// Access token to authenticate with
        #[arg(long, env = "BPNR_ACCESS_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Inspect or modify the saved session
    Session {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// Session subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// Show the saved session
    Show,

    /// Select a company for the connected server
    Select {
        /// Company id; an empty string clears the selection
        company_id: String,
    },

    /// Delete the saved session
    Clear,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            transport: None,
            session_path: None,
            command: Commands::Session {
                command: SessionCommand::Show,
            },
        }
    }
}
