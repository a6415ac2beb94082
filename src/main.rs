//! BPNR - ERP discovery and OIDC login CLI
//!
#![doc = "BPNR - ERP discovery and OIDC login CLI"]
#![doc = "Main entry point for the bpnr application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bpnr::cli::{Cli, Commands, SessionCommand};
use bpnr::commands;
use bpnr::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Discover { server } => {
            tracing::debug!("Discovering {}", server);
            commands::discover::run_discover(&config, &server).await
        }
        Commands::Login {
            server,
            callback_url,
        } => {
            tracing::info!("Starting login");
            if callback_url.is_some() {
                tracing::debug!("Launch callback URL supplied");
            }
            commands::login::run_login(&config, server, callback_url).await
        }
        Commands::Companies { token } => commands::companies::list_companies(&config, &token).await,
        Commands::Session { command } => match command {
            SessionCommand::Show => commands::session::show_session(&config),
            SessionCommand::Select { company_id } => {
                commands::session::select_company(&config, &company_id)
            }
            SessionCommand::Clear => commands::session::clear_session(&config),
        },
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "bpnr=debug" } else { "bpnr=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
