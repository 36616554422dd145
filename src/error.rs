//! Error types for the barnsworthburning MCP server.

use thiserror::Error;

/// Server error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned status {0}")]
    UpstreamStatus(reqwest::StatusCode),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// A schema violation in the upstream response: the JSON path of the
/// offending value plus what the decoder expected there.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("at {path}: expected {expected}, found {found}")]
pub struct SchemaError {
    pub path: String,
    pub expected: String,
    pub found: String,
}

impl SchemaError {
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// JSON-RPC error codes used by the MCP transport.
#[derive(Debug, Clone, Copy)]
#[repr(i32)]
pub enum RpcErrorCode {
    ParseError = -32700,
    MethodNotFound = -32601,
    InvalidParams = -32602,
}
