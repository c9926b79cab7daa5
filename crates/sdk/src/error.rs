//! Error types for the Glider SDK.

use reqwest::StatusCode;

/// Result type for SDK operations.
pub type McpResult<T> = Result<T, McpError>;

/// Errors raised while talking to the MCP server.
///
/// The public operations of [`McpClient`](crate::McpClient) never return these
/// directly; they render them into a failed
/// [`CallToolResult`](crate::CallToolResult) or a boolean.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON-RPC error object in the response.
    #[error("{message} (code: {code})")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The tool ran and reported its own failure.
    #[error("{0}")]
    Tool(String),

    /// Event stream carried no usable JSON-RPC response.
    #[error("{0}")]
    Stream(String),

    /// Serialization/deserialization error.
    #[error("Invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// Request exceeded its timeout.
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Request was aborted by a disconnect.
    #[error("Request aborted")]
    Cancelled,

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl McpError {
    /// Whether the transport to the server failed: refused, reset, or closed
    /// before a complete response. Timeouts are not connection errors.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Http(e) if !e.is_timeout() && (e.is_connect() || e.is_request() || e.is_body())
        )
    }

    /// Create an API error from a status code and response body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = if body.is_empty() {
            status.canonical_reason().unwrap_or_default().to_string()
        } else {
            body.to_string()
        };

        Self::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_uses_body() {
        let err = McpError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "Server error");
        assert_eq!(err.to_string(), "HTTP 500: Server error");
    }

    #[test]
    fn test_api_error_falls_back_to_reason() {
        let err = McpError::from_response(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
    }

    #[test]
    fn test_rpc_error_message_includes_code() {
        let err = McpError::Rpc {
            code: -32600,
            message: "Invalid Request".to_string(),
            data: None,
        };
        assert_eq!(err.to_string(), "Invalid Request (code: -32600)");
    }

    #[test]
    fn test_non_network_errors_are_not_connection_errors() {
        assert!(!McpError::Timeout(100).is_connection_error());
        assert!(!McpError::Tool("failed".to_string()).is_connection_error());
    }
}
