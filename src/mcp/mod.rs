//! MCP (Model Context Protocol) Server Implementation
//!
//! Provides the stdio MCP server that exposes console operations as tools.

pub mod cancellation;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod server;
pub mod tools;

pub use cancellation::CancellationManager;
pub use error::McpError;
pub use handler::McpHandler;
pub use protocol::*;
pub use server::McpStdioServer;
pub use tools::ToolContext;
