//! # console-mcp
//!
//! An MCP (Model Context Protocol) server that exposes a console platform's
//! REST backend to AI agents as tools: browse tenants, projects and the
//! marketplace, add marketplace plugins to a project configuration, deploy,
//! and inspect the running workloads.
//!
//! ## Architecture
//!
//! ```text
//! stdio JSON-RPC → McpHandler → tools → ConfigurationMerger / DeployPipelineWatcher
//!                                   ↓                 ↓
//!                             ConsoleClient (reqwest, bearer / client credentials)
//! ```
//!
//! ## Core Components
//!
//! - **MCP server** ([`mcp`]): line-delimited JSON-RPC 2.0 over stdio
//! - **Configuration merger** ([`services::ConfigurationMerger`]): fetch, guard
//!   and save project configurations without clobbering existing resources
//! - **Pipeline watcher** ([`services::DeployPipelineWatcher`]): poll a deploy
//!   pipeline until it reaches a final status or the time budget runs out
//! - **Console client** ([`client::ConsoleClient`]): authenticated HTTP access
//!   to the backend

pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod errors;
pub mod mcp;
pub mod observability;
pub mod services;

pub use errors::{ConsoleError, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
