//! # Error Handling
//!
//! Error types for the console MCP server, built with `thiserror`.
//!
//! The merge and poll cores never wrap or swallow these: a backend failure,
//! a service conflict, or a poll timeout reaches the tool layer as-is.

/// Custom result type for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;

/// Main error type for console operations
#[derive(thiserror::Error, Debug)]
pub enum ConsoleError {
    /// Configuration errors (missing credentials, unreadable config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication errors while obtaining an access token
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The request never produced an HTTP response (DNS, connect, TLS, timeout)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success response from the console backend
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Invalid input supplied by the caller
    #[error("Validation error: {0}")]
    Validation(String),

    /// A resource with the same kind and name already exists
    #[error("{resource_type} '{name}' already exists")]
    Conflict { resource_type: String, name: String },

    /// Operation exceeded its wall-clock budget
    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    /// Operation abandoned through its cancellation token
    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },
}

impl ConsoleError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create an HTTP error from a backend response
    pub fn http<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Http { status, message: message.into() }
    }

    /// Create a conflict error for an existing resource
    pub fn conflict<T: Into<String>, N: Into<String>>(resource_type: T, name: N) -> Self {
        Self::Conflict { resource_type: resource_type.into(), name: name.into() }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration_ms: u64) -> Self {
        Self::Timeout { operation: operation.into(), duration_ms }
    }

    /// Create a cancellation error
    pub fn cancelled<S: Into<String>>(operation: S) -> Self {
        Self::Cancelled { operation: operation.into() }
    }

    /// Create a serialization error with context
    pub fn serialization<S: Into<String>>(source: serde_json::Error, context: S) -> Self {
        Self::Serialization { source, context: context.into() }
    }

    /// HTTP status code carried by the error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
