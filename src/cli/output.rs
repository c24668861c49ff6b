//! Output formatting for CLI commands (JSON, YAML, or a key/value table)

use anyhow::{Context, Result};
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            "table" => Ok(OutputFormat::Table),
            _ => anyhow::bail!(
                "Unsupported output format: '{}'. Use 'json', 'yaml', or 'table'.",
                s
            ),
        }
    }
}

/// Render a serializable value in the requested format.
///
/// `Table` renders the top-level fields of a JSON object as `key value`
/// rows; other shapes fall back to JSON.
pub fn render<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).context("Failed to serialize to JSON")
        }
        OutputFormat::Yaml => serde_yaml::to_string(data).context("Failed to serialize to YAML"),
        OutputFormat::Table => {
            let value = serde_json::to_value(data).context("Failed to serialize to JSON")?;
            match value.as_object() {
                Some(fields) => Ok(key_value_table(
                    fields.iter().map(|(k, v)| (k.as_str(), display_value(v))),
                )),
                None => serde_json::to_string_pretty(&value).context("Failed to serialize to JSON"),
            }
        }
    }
}

pub fn print_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    println!("{}", render(data, format)?.trim_end());
    Ok(())
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "<not set>".to_string(),
        other => other.to_string(),
    }
}

fn key_value_table<'a>(rows: impl Iterator<Item = (&'a str, String)>) -> String {
    let mut table = format!("{:<15} {}\n{}\n", "Key", "Value", "-".repeat(65));
    for (key, value) in rows {
        table.push_str(&format!("{:<15} {}\n", key, value));
    }
    table
}
