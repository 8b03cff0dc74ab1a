//! Error types for ng-agent

use serde_json::{json, Value};
use thiserror::Error;

/// Main error type for viewer, table and orchestration operations
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing tool arguments
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown file, summary, snapshot or tool
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed shareable link
    #[error("State parse error: {0}")]
    StateParse(String),

    /// Reasoning collaborator failure (transport, HTTP status, timeout)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Upload over the size cap
    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create a state parse error
    pub fn state_parse(msg: impl Into<String>) -> Self {
        Error::StateParse(msg.into())
    }

    /// Create an upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Error::Upstream(msg.into())
    }

    /// Create a capacity error
    pub fn capacity(msg: impl Into<String>) -> Self {
        Error::Capacity(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// Short machine-readable tag for the error class
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::NotFound(_) => "not_found",
            Error::StateParse(_) => "state_parse",
            Error::Upstream(_) => "upstream",
            Error::Capacity(_) => "capacity",
            Error::Serialization(_) => "serialization",
            Error::Io(_) => "io",
            Error::Internal(_) => "internal",
        }
    }

    /// Render as the structured `{error, kind}` payload handed back to callers
    /// and to the model.
    pub fn to_tool_result(&self) -> Value {
        json!({
            "error": self.to_string(),
            "kind": self.kind(),
        })
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal(err.to_string())
    }
}
