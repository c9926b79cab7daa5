//! Client-facing tool call result and the seam used by the playground.

use async_trait::async_trait;
use glider_core::ToolParams;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Outcome of a single tool call.
///
/// `success == true` never carries an `error`; `success == false` always does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock milliseconds.
    pub duration: u64,
}

impl CallToolResult {
    pub fn success(data: Option<Value>, elapsed: Duration) -> Self {
        Self {
            success: true,
            data,
            error: None,
            duration: elapsed.as_millis() as u64,
        }
    }

    pub fn failure(error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            duration: elapsed.as_millis() as u64,
        }
    }

    /// Decode `data` into a typed value. `None` when absent or shaped differently.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.data
            .as_ref()
            .and_then(|data| serde_json::from_value(data.clone()).ok())
    }
}

/// Anything that can run a named tool against a Glider server.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Run `tool_name`; never fails, errors are folded into the result.
    async fn call_tool(&self, tool_name: &str, params: ToolParams) -> CallToolResult;

    fn base_url(&self) -> String;

    fn set_base_url(&self, url: &str);
}
