//! policydesk - command-line front end for the brokerage admin API.
//!
//! Signs in once, keeps the credential pair in the OS keyring (or a cache
//! file) and renews it transparently while listing and inspecting customers,
//! branches, agents, policies, quotes and reports.

mod commands;
mod output;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Commands;
use policydesk_core::{ApiClient, Config, Session, SessionLost, StoreKind};

#[derive(Parser)]
#[command(name = "policydesk")]
#[command(about = "Admin client for the policydesk brokerage API")]
#[command(version)]
struct Cli {
    /// API base URL (overrides POLICYDESK_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Keep credentials in memory only for this run
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=policydesk_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn session_lost(reason: SessionLost) {
    eprintln!(
        "Session expired ({}). Please run `policydesk login` again.",
        reason
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load_with_env()?;
    if let Some(url) = cli.api_url {
        config.api_url = Some(url);
    }
    if cli.ephemeral {
        config.token_store = Some(StoreKind::Memory);
    }
    debug!(api_url = %config.api_url(), store = ?config.store_kind(), "Configuration loaded");

    let session = Arc::new(Session::restore(config.open_token_store()?));
    let client = ApiClient::from_config(&config, session)?.on_session_lost(Arc::new(session_lost));

    info!("policydesk starting");
    cli.command.execute(&client, &config, cli.json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    use commands::{PolicyCommands, StatusArg};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_policy_filters() {
        let cli = Cli::try_parse_from([
            "policydesk",
            "policies",
            "list",
            "--status",
            "expired",
            "--customer",
            "4",
            "--page",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Policies {
                command: PolicyCommands::List { list, status, customer, agent },
            } => {
                assert_eq!(status, Some(StatusArg::Expired));
                assert_eq!(customer, Some(4));
                assert_eq!(agent, None);
                assert_eq!(list.page, Some(2));
            }
            _ => panic!("expected policies list"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = ["policydesk", "whoami", "--json", "--api-url", "http://x/api"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.json);
        assert_eq!(cli.api_url.as_deref(), Some("http://x/api"));
    }

    #[test]
    fn test_two_factor_subcommand_name() {
        assert!(Cli::try_parse_from(["policydesk", "2fa", "verify", "123456"]).is_ok());
    }
}
