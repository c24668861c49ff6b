//! # Command Line Interface
//!
//! `console-mcp serve` runs the MCP server over stdio; `console-mcp config`
//! manages the connection settings file.

pub mod config;
pub mod config_cmd;
pub mod output;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use crate::client::{ClientConfig, ConsoleClient};
use crate::config::ObservabilityConfig;
use crate::mcp::{McpHandler, McpStdioServer, ToolContext};
use crate::observability::init_logging;

#[derive(Parser)]
#[command(name = "console-mcp")]
#[command(about = "MCP server for the console platform")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Console base URL
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Access token for the console API
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Service account client id (client credentials grant)
    #[arg(long, global = true)]
    pub client_id: Option<String>,

    /// Service account client secret (client credentials grant)
    #[arg(long, global = true)]
    pub client_secret: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve MCP over stdin/stdout
    Serve,

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: config_cmd::ConfigCommands,
    },
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&ObservabilityConfig::from_env().with_verbose(cli.verbose));

    match cli.command {
        Commands::Serve => {
            let client = create_console_client(
                cli.host,
                config::CredentialFlags {
                    token: cli.token,
                    client_id: cli.client_id,
                    client_secret: cli.client_secret,
                },
                cli.timeout,
                cli.verbose,
            )?;

            info!(
                app_name = crate::APP_NAME,
                version = crate::VERSION,
                host = %client.base_url(),
                "Starting console MCP server"
            );

            let handler = McpHandler::new(ToolContext::new(Arc::new(client)));
            McpStdioServer::new(handler).run().await?
        }
        Commands::Config { command } => config_cmd::handle_config_command(command)?,
    }

    Ok(())
}

/// Create the console client from flags, the config file and the environment
fn create_console_client(
    host: Option<String>,
    credentials: config::CredentialFlags,
    timeout: Option<u64>,
    verbose: bool,
) -> anyhow::Result<ConsoleClient> {
    let file_config = config::CliConfig::load()?;

    let client_config = ClientConfig {
        base_url: config::resolve_host(host, &file_config),
        credentials: config::resolve_credentials(credentials, &file_config)?,
        timeout: config::resolve_timeout(timeout, &file_config)?,
        verbose,
    };

    Ok(ConsoleClient::new(client_config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "console-mcp",
            "serve",
            "--host",
            "https://console.example.com",
            "--client-id",
            "id",
            "--client-secret",
            "secret",
            "-v",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Serve));
        assert_eq!(cli.host.as_deref(), Some("https://console.example.com"));
        assert_eq!(cli.client_id.as_deref(), Some("id"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_config_show_output_format() {
        let cli = Cli::try_parse_from(["console-mcp", "config", "show", "-o", "yaml"]).unwrap();

        match cli.command {
            Commands::Config { command: config_cmd::ConfigCommands::Show { output: format } } => {
                assert_eq!(format, output::OutputFormat::Yaml)
            }
            _ => panic!("expected config show"),
        }
    }
}
