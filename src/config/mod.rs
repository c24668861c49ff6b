//! # Configuration Management
//!
//! Process-level settings read from the environment. Connection settings for
//! the console (host, credentials, timeout) live in [`crate::cli::config`],
//! where flags, the config file and the environment are merged.

use serde::{Deserialize, Serialize};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Service name attached to log records
    pub service_name: String,

    /// Default filter directive (trace, debug, info, warn, error)
    pub log_level: String,

    /// Emit JSON records instead of human-readable lines
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: crate::APP_NAME.to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Read `CONSOLE_MCP_LOG_LEVEL` and `CONSOLE_MCP_LOG_JSON`, falling back
    /// to the defaults for anything unset or empty
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let log_level = lookup("CONSOLE_MCP_LOG_LEVEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.log_level);
        let json_logging =
            lookup("CONSOLE_MCP_LOG_JSON").map(|v| parse_flag(&v)).unwrap_or(defaults.json_logging);

        Self { service_name: defaults.service_name, log_level, json_logging }
    }

    /// Raise the level to `debug` for `-v`, unless a more verbose level is set
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        if verbose && matches!(self.log_level.as_str(), "info" | "warn" | "error") {
            self.log_level = "debug".to_string();
        }
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
