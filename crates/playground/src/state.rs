//! Tool invocation state: the selected tool, its parameters, execution phase
//! and the last response.
//!
//! Every mutation publishes a fresh [`PlaygroundState`] on a watch channel so
//! a UI can render from [`Playground::subscribe`].

use chrono::Utc;
use glider_core::{HistoryLog, NewHistoryEntry, ToolCatalog, ToolMetadata, ToolParams};
use glider_sdk::{CallToolResult, ConnectionStatus, ToolInvoker};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Tool selected on startup and after a reset
pub const DEFAULT_TOOL_ID: &str = "server_status";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    #[default]
    Idle,
    Executing,
    Success,
    Error,
}

/// Last tool call outcome as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaygroundResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration: u64,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl PlaygroundResponse {
    pub fn from_result(result: CallToolResult) -> Self {
        Self {
            success: result.success,
            data: result.data,
            error: result.error,
            duration: result.duration,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundState {
    pub connection_status: ConnectionStatus,
    pub server_url: String,
    pub selected_tool_id: String,
    pub tool_params: ToolParams,
    pub execution_state: ExecutionState,
    pub last_response: Option<PlaygroundResponse>,
}

/// Shared handle over the playground state. Clones see the same state.
#[derive(Clone)]
pub struct Playground {
    catalog: Arc<ToolCatalog>,
    invoker: Arc<dyn ToolInvoker>,
    history: Arc<HistoryLog>,
    state: Arc<watch::Sender<PlaygroundState>>,
}

impl Playground {
    pub fn new(
        catalog: Arc<ToolCatalog>,
        invoker: Arc<dyn ToolInvoker>,
        history: Arc<HistoryLog>,
    ) -> Self {
        let initial = PlaygroundState {
            connection_status: ConnectionStatus::Disconnected,
            server_url: invoker.base_url(),
            selected_tool_id: default_tool_id(&catalog),
            tool_params: ToolParams::new(),
            execution_state: ExecutionState::Idle,
            last_response: None,
        };
        let (state, _) = watch::channel(initial);

        Self {
            catalog,
            invoker,
            history,
            state: Arc::new(state),
        }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<PlaygroundState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PlaygroundState {
        self.state.borrow().clone()
    }

    pub fn selected_tool_id(&self) -> String {
        self.state.borrow().selected_tool_id.clone()
    }

    pub fn selected_tool(&self) -> Option<&ToolMetadata> {
        let id = self.selected_tool_id();
        self.catalog.get(&id)
    }

    pub fn tool_params(&self) -> ToolParams {
        self.state.borrow().tool_params.clone()
    }

    pub fn execution_state(&self) -> ExecutionState {
        self.state.borrow().execution_state
    }

    pub fn is_executing(&self) -> bool {
        self.execution_state() == ExecutionState::Executing
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.state.borrow().connection_status
    }

    pub fn is_connected(&self) -> bool {
        self.connection_status() == ConnectionStatus::Connected
    }

    pub fn last_response(&self) -> Option<PlaygroundResponse> {
        self.state.borrow().last_response.clone()
    }

    pub fn server_url(&self) -> String {
        self.state.borrow().server_url.clone()
    }

    /// Select a tool and reset its parameters to the declared defaults.
    ///
    /// Unknown ids leave the state untouched. The last response is kept so
    /// outputs can be compared across tools.
    pub fn select_tool(&self, tool_id: &str) -> bool {
        let Some(tool) = self.catalog.get(tool_id) else {
            debug!(tool = tool_id, "Ignoring unknown tool");
            return false;
        };

        let defaults = tool.default_params();
        self.state.send_modify(|state| {
            state.selected_tool_id = tool_id.to_string();
            state.tool_params = defaults;
        });
        true
    }

    pub fn set_param(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.state.send_modify(|state| {
            state.tool_params.insert(name, value);
        });
    }

    /// Shallow merge; later keys win.
    pub fn set_params(&self, params: ToolParams) {
        self.state.send_modify(|state| {
            state.tool_params.extend(params);
        });
    }

    pub fn reset_params(&self) {
        if let Some(defaults) = self.selected_tool().map(ToolMetadata::default_params) {
            self.state.send_modify(|state| state.tool_params = defaults);
        }
    }

    pub fn set_connection_status(&self, status: ConnectionStatus) {
        self.state.send_modify(|state| state.connection_status = status);
    }

    /// Change the server URL and retarget the invoker.
    pub fn set_server_url(&self, url: &str) {
        self.invoker.set_base_url(url);
        self.state.send_modify(|state| state.server_url = url.to_string());
    }

    pub fn set_execution_state(&self, execution_state: ExecutionState) {
        self.state.send_modify(|state| state.execution_state = execution_state);
    }

    pub fn set_response(&self, response: Option<PlaygroundResponse>) {
        self.state.send_modify(|state| state.last_response = response);
    }

    /// Drop the last response and return to idle. History is untouched.
    pub fn clear_response(&self) {
        self.state.send_modify(|state| {
            state.last_response = None;
            state.execution_state = ExecutionState::Idle;
        });
    }

    pub fn reset_playground(&self) {
        let tool_id = default_tool_id(&self.catalog);
        self.state.send_modify(|state| {
            state.selected_tool_id = tool_id;
            state.tool_params = ToolParams::new();
            state.execution_state = ExecutionState::Idle;
            state.last_response = None;
        });
    }

    /// Select `tool_id` and merge the params of its `index`th example.
    ///
    /// No-op when either the tool or the example does not exist.
    pub fn load_example(&self, tool_id: &str, index: usize) -> bool {
        let Some(example) = self
            .catalog
            .get(tool_id)
            .and_then(|tool| tool.examples.get(index))
        else {
            return false;
        };

        let params = example.params.clone();
        self.select_tool(tool_id);
        self.set_params(params);
        true
    }

    /// Run the selected tool with the current parameters.
    ///
    /// Moves through `executing` to `success` or `error`, stores the
    /// response and appends a history entry either way.
    pub async fn execute(&self) -> PlaygroundResponse {
        let (tool_id, params) = {
            let state = self.state.borrow();
            (state.selected_tool_id.clone(), state.tool_params.clone())
        };
        let (tool_name, display_name) = match self.catalog.get(&tool_id) {
            Some(tool) => (tool.name.clone(), tool.display_name.clone()),
            None => (tool_id.clone(), tool_id.clone()),
        };

        self.state.send_modify(|state| {
            state.execution_state = ExecutionState::Executing;
        });
        info!(tool = %tool_name, "Executing tool");

        let result = self.invoker.call_tool(&tool_name, params.clone()).await;
        let response = PlaygroundResponse::from_result(result);

        let execution_state = if response.success {
            ExecutionState::Success
        } else {
            ExecutionState::Error
        };
        self.state.send_modify(|state| {
            state.execution_state = execution_state;
            state.last_response = Some(response.clone());
        });

        self.history.add_entry(NewHistoryEntry {
            tool_id,
            tool_name: display_name,
            params,
            success: response.success,
            error: response.error.clone(),
            duration: response.duration,
        });

        response
    }
}

fn default_tool_id(catalog: &ToolCatalog) -> String {
    if catalog.contains(DEFAULT_TOOL_ID) {
        return DEFAULT_TOOL_ID.to_string();
    }
    catalog
        .all()
        .first()
        .map(|tool| tool.id.clone())
        .unwrap_or_else(|| DEFAULT_TOOL_ID.to_string())
}
