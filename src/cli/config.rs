//! Configuration file handling for console-mcp
//!
//! Manages loading and saving configuration from ~/.console-mcp/config.toml
//! and resolving connection settings from multiple sources.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::client::Credentials;
use crate::errors::ConsoleError;

/// Console used when no host is configured anywhere
pub const DEFAULT_HOST: &str = "https://console.cloud.mia-platform.eu";

/// Request timeout in seconds when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_HOST: &str = "CONSOLE_MCP_HOST";
pub const ENV_TOKEN: &str = "CONSOLE_MCP_TOKEN";
pub const ENV_CLIENT_ID: &str = "CONSOLE_MCP_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "CONSOLE_MCP_CLIENT_SECRET";

/// Configuration stored in ~/.console-mcp/config.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Console base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Pre-issued access token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Service account client id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Service account client secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl CliConfig {
    /// Get the default configuration file path (~/.console-mcp/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Unable to determine home directory")?;

        Ok(PathBuf::from(home).join(".console-mcp").join("config.toml"))
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_path()?)
    }

    /// Load configuration from a specific path; a missing file is an empty config
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_path()?)
    }

    /// Save configuration to a specific path, creating parent directories
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Update one setting by its file key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim().to_string();
        match key {
            "host" => self.host = Some(value),
            "token" => self.token = Some(value),
            "client_id" => self.client_id = Some(value),
            "client_secret" => self.client_secret = Some(value),
            "timeout" => {
                let secs = value
                    .parse::<u64>()
                    .with_context(|| format!("Invalid timeout '{}': expected seconds", value))?;
                if secs == 0 {
                    anyhow::bail!("Invalid timeout '0': must be at least 1 second");
                }
                self.timeout = Some(secs);
            }
            other => anyhow::bail!(
                "Unknown configuration key '{}'. Valid keys: host, token, client_id, client_secret, timeout",
                other
            ),
        }
        Ok(())
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "********".to_string());
        Self { token: mask(&self.token), client_secret: mask(&self.client_secret), ..self.clone() }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn env_var(key: &str) -> Option<String> {
    non_empty(std::env::var(key).ok())
}

/// Resolve the console host
///
/// Checks sources in the following priority order:
/// 1. --host command line flag
/// 2. ~/.console-mcp/config.toml
/// 3. CONSOLE_MCP_HOST environment variable
/// 4. Default: https://console.cloud.mia-platform.eu
pub fn resolve_host(host_flag: Option<String>, config: &CliConfig) -> String {
    if let Some(host) = non_empty(host_flag) {
        debug!("Using host from --host flag: {}", host);
        return host;
    }

    if let Some(host) = non_empty(config.host.clone()) {
        debug!("Using host from config file: {}", host);
        return host;
    }

    if let Some(host) = env_var(ENV_HOST) {
        debug!("Using host from {} environment variable: {}", ENV_HOST, host);
        return host;
    }

    debug!("Using default host: {}", DEFAULT_HOST);
    DEFAULT_HOST.to_string()
}

/// Resolve the timeout
///
/// Checks sources in the following priority order:
/// 1. --timeout command line flag
/// 2. ~/.console-mcp/config.toml
/// 3. Default: 30 seconds
///
/// A zero timeout from any source is rejected.
pub fn resolve_timeout(
    timeout_flag: Option<u64>,
    config: &CliConfig,
) -> std::result::Result<u64, ConsoleError> {
    let timeout = if let Some(timeout) = timeout_flag {
        debug!("Using timeout from --timeout flag: {} seconds", timeout);
        timeout
    } else if let Some(timeout) = config.timeout {
        debug!("Using timeout from config file: {} seconds", timeout);
        timeout
    } else {
        debug!("Using default timeout: {} seconds", DEFAULT_TIMEOUT_SECS);
        DEFAULT_TIMEOUT_SECS
    };

    if timeout == 0 {
        return Err(ConsoleError::config("timeout must be at least 1 second"));
    }
    Ok(timeout)
}

/// Command line credential flags
#[derive(Debug, Clone, Default)]
pub struct CredentialFlags {
    pub token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Resolve credentials
///
/// Each source is checked for a token first, then for a complete client id and
/// secret pair, in the following priority order:
/// 1. --token / --client-id / --client-secret flags
/// 2. ~/.console-mcp/config.toml
/// 3. CONSOLE_MCP_TOKEN / CONSOLE_MCP_CLIENT_ID / CONSOLE_MCP_CLIENT_SECRET
pub fn resolve_credentials(
    flags: CredentialFlags,
    config: &CliConfig,
) -> std::result::Result<Credentials, ConsoleError> {
    let sources = [
        ("command line flags", flags.token, flags.client_id, flags.client_secret),
        (
            "config file",
            config.token.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        ),
        ("environment", env_var(ENV_TOKEN), env_var(ENV_CLIENT_ID), env_var(ENV_CLIENT_SECRET)),
    ];

    for (source, token, client_id, client_secret) in sources {
        if let Some(token) = non_empty(token) {
            debug!("Using access token from {}", source);
            return Ok(Credentials::Token(token));
        }
        if let (Some(client_id), Some(client_secret)) =
            (non_empty(client_id), non_empty(client_secret))
        {
            debug!("Using client credentials from {}", source);
            return Ok(Credentials::ClientCredentials { client_id, client_secret });
        }
    }

    Err(ConsoleError::config(
        "No console credentials found. Please provide either a token or a client id and secret via:\n\
         - --token, or --client-id and --client-secret flags\n\
         - ~/.console-mcp/config.toml\n\
         - CONSOLE_MCP_TOKEN, or CONSOLE_MCP_CLIENT_ID and CONSOLE_MCP_CLIENT_SECRET environment variables",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn full_config() -> CliConfig {
        CliConfig {
            host: Some("https://console.example.com".to_string()),
            token: None,
            client_id: Some("svc".to_string()),
            client_secret: Some("secret".to_string()),
            timeout: Some(60),
        }
    }

    #[test]
    fn test_config_serialization_skips_unset_fields() {
        let config = CliConfig { token: Some("abc".to_string()), ..Default::default() };

        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("token = \"abc\""));
        assert!(!toml_str.contains("host"));
        assert!(!toml_str.contains("timeout"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            host = "https://console.example.com"
            client_id = "svc"
            client_secret = "secret"
            timeout = 60
        "#;

        let config: CliConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config, full_config());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        full_config().save_to_path(&config_path).unwrap();
        assert!(config_path.exists());

        let loaded = CliConfig::load_from_path(&config_path).unwrap();
        assert_eq!(loaded, full_config());
    }

    #[test]
    fn test_config_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = CliConfig::load_from_path(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(loaded, CliConfig::default());
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "timeout = \"soon\"").unwrap();

        let err = CliConfig::load_from_path(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_set_known_and_unknown_keys() {
        let mut config = CliConfig::default();
        config.set("host", " https://console.example.com ").unwrap();
        config.set("timeout", "45").unwrap();
        assert_eq!(config.host.as_deref(), Some("https://console.example.com"));
        assert_eq!(config.timeout, Some(45));

        assert!(config.set("timeout", "later").is_err());
        assert!(config.set("timeout", "0").is_err());
        assert_eq!(config.timeout, Some(45));
        assert!(config.set("colour", "blue").is_err());
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let config = CliConfig { token: Some("abc".to_string()), ..full_config() };
        let shown = config.redacted();
        assert_eq!(shown.token.as_deref(), Some("********"));
        assert_eq!(shown.client_secret.as_deref(), Some("********"));
        assert_eq!(shown.client_id.as_deref(), Some("svc"));
    }

    #[test]
    fn test_flag_overrides_config_file() {
        assert_eq!(
            resolve_host(Some("https://flag.example.com".to_string()), &full_config()),
            "https://flag.example.com"
        );
        assert_eq!(resolve_host(None, &full_config()), "https://console.example.com");
        assert_eq!(resolve_timeout(Some(5), &full_config()).unwrap(), 5);
        assert_eq!(resolve_timeout(None, &full_config()).unwrap(), 60);
        assert_eq!(resolve_timeout(None, &CliConfig::default()).unwrap(), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let err = resolve_timeout(Some(0), &full_config()).unwrap_err();
        assert!(matches!(err, ConsoleError::Config(_)));

        let zero_in_file = CliConfig { timeout: Some(0), ..CliConfig::default() };
        assert!(resolve_timeout(None, &zero_in_file).is_err());
        assert_eq!(resolve_timeout(Some(10), &zero_in_file).unwrap(), 10);
    }

    #[test]
    fn test_token_flag_wins_over_client_credentials() {
        let flags = CredentialFlags { token: Some("flag-token".to_string()), ..Default::default() };
        let credentials = resolve_credentials(flags, &full_config()).unwrap();
        assert_eq!(credentials, Credentials::Token("flag-token".to_string()));
    }

    #[test]
    fn test_client_credentials_from_config_file() {
        let credentials = resolve_credentials(CredentialFlags::default(), &full_config()).unwrap();
        assert_eq!(
            credentials,
            Credentials::ClientCredentials {
                client_id: "svc".to_string(),
                client_secret: "secret".to_string()
            }
        );
    }

    #[test]
    fn test_incomplete_flag_pair_falls_through() {
        let flags = CredentialFlags { client_id: Some("other".to_string()), ..Default::default() };
        let credentials = resolve_credentials(flags, &full_config()).unwrap();
        assert!(matches!(
            credentials,
            Credentials::ClientCredentials { ref client_id, .. } if client_id == "svc"
        ));
    }
}
