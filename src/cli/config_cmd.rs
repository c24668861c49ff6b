//! Configuration management CLI commands
//!
//! Inspect and edit ~/.console-mcp/config.toml

use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

use super::config::CliConfig;
use super::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current configuration (secrets masked)
    Show {
        /// Output format (json, yaml, or table)
        #[arg(short, long, default_value = "table")]
        output: OutputFormat,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (host, token, client_id, client_secret, or timeout)
        key: String,

        /// Configuration value
        value: String,
    },

    /// Print the configuration file path
    Path,
}

pub fn handle_config_command(command: ConfigCommands) -> Result<()> {
    let path = CliConfig::config_path()?;

    match command {
        ConfigCommands::Show { output } => show_config(&path, output),
        ConfigCommands::Set { key, value } => {
            set_config(&path, &key, &value)?;
            println!("Set '{}' in {}", key, path.display());
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn show_config(path: &Path, format: OutputFormat) -> Result<()> {
    if !path.exists() {
        println!("No configuration file found at: {}", path.display());
        println!("\nRun 'console-mcp config set <key> <value>' to create one");
        return Ok(());
    }

    let config = CliConfig::load_from_path(path)?;
    output::print_output(&config.redacted(), format)
}

fn set_config(path: &Path, key: &str, value: &str) -> Result<CliConfig> {
    let mut config = CliConfig::load_from_path(path)?;
    config.set(key, value)?;
    config.save_to_path(path)?;
    Ok(config)
}
