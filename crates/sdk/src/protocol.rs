// MCP protocol types (JSON-RPC 2.0 over HTTP)

use crate::error::{McpError, McpResult};
use glider_core::ToolParams;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// `tools/call` request with a fresh unique id
    pub fn call_tool(name: impl Into<String>, arguments: ToolParams) -> Self {
        let params = CallToolParams {
            name: name.into(),
            arguments,
        };
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            METHOD_TOOLS_CALL,
            Some(params.into_value()),
        )
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Whether this message is a final response rather than a progress frame
    pub fn is_final(&self) -> bool {
        self.result.is_some() || self.error.is_some()
    }

    /// Reduce a `tools/call` response to the data it carries.
    ///
    /// A JSON-RPC `error` wins over everything else. A result flagged
    /// `isError` becomes [`McpError::Tool`] with the first content text.
    /// Otherwise the first content item's `text` is decoded as JSON when
    /// possible (raw text when not), falling back to its `data` field.
    pub fn into_tool_output(self) -> McpResult<Option<Value>> {
        if let Some(error) = self.error {
            return Err(McpError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        // Read the raw value so an off-schema result never hides `isError`
        let result = self.result.unwrap_or(Value::Null);
        let first = result
            .get("content")
            .and_then(Value::as_array)
            .and_then(|content| content.first());

        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            let text = first
                .and_then(|c| c.get("text"))
                .and_then(content_text)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(McpError::Tool(text));
        }

        Ok(first.and_then(content_data))
    }
}

/// `text` as a message; non-string values are rendered as JSON
fn content_text(text: &Value) -> Option<String> {
    match text {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Data carried by one content item: `text` decoded as JSON when possible,
/// raw text when not, otherwise its `data` field
fn content_data(content: &Value) -> Option<Value> {
    match content.get("text") {
        Some(Value::String(text)) if !text.is_empty() => {
            Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone())))
        }
        Some(Value::Null) | Some(Value::String(_)) | None => content.get("data").cloned(),
        Some(other) => Some(other.clone()),
    }
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Call tool request params
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: ToolParams,
}

impl CallToolParams {
    fn into_value(self) -> Value {
        let mut params = serde_json::Map::new();
        params.insert("name".to_string(), Value::String(self.name));
        params.insert("arguments".to_string(), Value::Object(self.arguments));
        Value::Object(params)
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_loaded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_path: Option<String>,
}

impl HealthResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Whether a raw `/health` body reports `status: "ok"`. Other fields are ignored.
pub fn is_healthy(body: &Value) -> bool {
    body.get("status").and_then(Value::as_str) == Some("ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> JsonRpcResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_call_tool_request_shape() {
        let arguments = json!({"pattern": "*Manager"}).as_object().cloned().unwrap();
        let request = JsonRpcRequest::call_tool("find_types", arguments);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["jsonrpc"], json!("2.0"));
        assert_eq!(value["method"], json!("tools/call"));
        assert_eq!(value["params"]["name"], json!("find_types"));
        assert_eq!(value["params"]["arguments"], json!({"pattern": "*Manager"}));
        assert!(value["id"].is_string());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = JsonRpcRequest::call_tool("server_status", ToolParams::new());
        let b = JsonRpcRequest::call_tool("server_status", ToolParams::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_text_content_parsed_as_json() {
        let output = response(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "result": {"content": [{"type": "text", "text": "{\"data\":\"test\"}"}]}
        }))
        .into_tool_output()
        .unwrap();

        assert_eq!(output, Some(json!({"data": "test"})));
    }

    #[test]
    fn test_plain_text_content_kept_raw() {
        let output = response(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "result": {"content": [{"type": "text", "text": "Solution loaded"}]}
        }))
        .into_tool_output()
        .unwrap();

        assert_eq!(output, Some(json!("Solution loaded")));
    }

    #[test]
    fn test_data_field_used_without_text() {
        let output = response(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "result": {"content": [{"type": "image", "data": "aGVsbG8="}]}
        }))
        .into_tool_output()
        .unwrap();

        assert_eq!(output, Some(json!("aGVsbG8=")));
    }

    #[test]
    fn test_rpc_error() {
        let err = response(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "error": {"code": -32601, "message": "Method not found"}
        }))
        .into_tool_output()
        .unwrap_err();

        assert_eq!(err.to_string(), "Method not found (code: -32601)");
    }

    #[test]
    fn test_tool_error_uses_content_text() {
        let err = response(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "result": {"isError": true, "content": [{"type": "text", "text": "No solution loaded"}]}
        }))
        .into_tool_output()
        .unwrap_err();

        assert!(matches!(err, McpError::Tool(ref text) if text == "No solution loaded"));
    }

    #[test]
    fn test_tool_error_without_content() {
        let err = response(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "result": {"isError": true, "content": []}
        }))
        .into_tool_output()
        .unwrap_err();

        assert_eq!(err.to_string(), "Unknown error");
    }

    #[test]
    fn test_tool_error_with_non_string_text() {
        let err = response(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "result": {"isError": true, "content": [{"type": "text", "text": 42}]}
        }))
        .into_tool_output()
        .unwrap_err();

        assert!(matches!(err, McpError::Tool(ref text) if text == "42"));
    }

    #[test]
    fn test_tool_error_with_off_schema_content() {
        let err = response(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "result": {"isError": true, "content": "not a list"}
        }))
        .into_tool_output()
        .unwrap_err();

        assert_eq!(err.to_string(), "Unknown error");
    }

    #[test]
    fn test_is_healthy_ignores_other_fields() {
        assert!(is_healthy(&json!({"status": "ok", "version": 2, "timestamp": 1700000000})));
        assert!(!is_healthy(&json!({"status": "error"})));
        assert!(!is_healthy(&json!({"version": "1.0.0"})));
        assert!(!is_healthy(&json!("ok")));
    }

    #[test]
    fn test_health_response() {
        let health: HealthResponse = serde_json::from_value(json!({
            "status": "ok",
            "version": "1.2.0",
            "solutionLoaded": true,
            "solutionPath": "/src/App.sln"
        }))
        .unwrap();

        assert!(health.is_ok());
        assert_eq!(health.solution_loaded, Some(true));
        assert_eq!(health.solution_path.as_deref(), Some("/src/App.sln"));
    }
}
