//! MCP Error Types

use crate::errors::ConsoleError;
use crate::mcp::protocol::{error_codes, JsonRpcError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unsupported protocol version: {client}. Supported versions: {}", supported.join(", "))]
    UnsupportedProtocolVersion { client: String, supported: Vec<String> },
}

impl McpError {
    /// Convert to JSON-RPC error code
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::ParseError(_) => error_codes::PARSE_ERROR,
            McpError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            McpError::MethodNotFound(_) | McpError::ToolNotFound(_) => {
                error_codes::METHOD_NOT_FOUND
            }
            McpError::InvalidParams(_) | McpError::UnsupportedProtocolVersion { .. } => {
                error_codes::INVALID_PARAMS
            }
            McpError::InternalError(_) | McpError::SerializationError(_) => {
                error_codes::INTERNAL_ERROR
            }
        }
    }

    /// Convert to JsonRpcError
    pub fn to_json_rpc_error(&self) -> JsonRpcError {
        let data = match self {
            McpError::UnsupportedProtocolVersion { supported, .. } => {
                Some(serde_json::json!({ "supported": supported }))
            }
            _ => None,
        };
        JsonRpcError { code: self.error_code(), message: self.to_string(), data }
    }
}

impl From<McpError> for JsonRpcError {
    fn from(error: McpError) -> Self {
        error.to_json_rpc_error()
    }
}

/// Caller mistakes become invalid params; everything else is internal
impl From<ConsoleError> for McpError {
    fn from(error: ConsoleError) -> Self {
        match error {
            ConsoleError::Validation(message) => McpError::InvalidParams(message),
            other => McpError::InternalError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(McpError::ParseError("test".to_string()).error_code(), error_codes::PARSE_ERROR);
        assert_eq!(
            McpError::InvalidRequest("test".to_string()).error_code(),
            error_codes::INVALID_REQUEST
        );
        assert_eq!(
            McpError::MethodNotFound("test".to_string()).error_code(),
            error_codes::METHOD_NOT_FOUND
        );
        assert_eq!(
            McpError::ToolNotFound("test".to_string()).error_code(),
            error_codes::METHOD_NOT_FOUND
        );
        assert_eq!(
            McpError::InvalidParams("test".to_string()).error_code(),
            error_codes::INVALID_PARAMS
        );
        assert_eq!(
            McpError::InternalError("test".to_string()).error_code(),
            error_codes::INTERNAL_ERROR
        );
    }

    #[test]
    fn test_to_json_rpc_error() {
        let json_rpc_error = McpError::ToolNotFound("deploy_everything".to_string()).to_json_rpc_error();

        assert_eq!(json_rpc_error.code, error_codes::METHOD_NOT_FOUND);
        assert_eq!(json_rpc_error.message, "Tool not found: deploy_everything");
        assert!(json_rpc_error.data.is_none());
    }

    #[test]
    fn test_unsupported_version_lists_supported() {
        let error = McpError::UnsupportedProtocolVersion {
            client: "2023-01-01".to_string(),
            supported: vec!["2024-11-05".to_string(), "2025-06-18".to_string()],
        };
        let json_rpc_error: JsonRpcError = error.into();

        assert_eq!(json_rpc_error.code, error_codes::INVALID_PARAMS);
        assert!(json_rpc_error.message.contains("2023-01-01"));
        assert_eq!(json_rpc_error.data.unwrap()["supported"][1], "2025-06-18");
    }

    #[test]
    fn test_console_error_conversion() {
        let invalid: McpError = ConsoleError::validation("service name cannot be empty").into();
        assert_eq!(invalid.error_code(), error_codes::INVALID_PARAMS);

        let conflict: McpError = ConsoleError::conflict("service", "api").into();
        assert_eq!(conflict.error_code(), error_codes::INTERNAL_ERROR);
        assert!(conflict.to_string().contains("service 'api' already exists"));
    }
}
