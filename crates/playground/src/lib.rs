//! Playground for the Glider MCP server: tool invocation state, file
//! configuration and application wiring behind the `glider-playground` binary.

pub mod config;
pub mod state;

pub use config::{AppState, PlaygroundConfig};
pub use state::{ExecutionState, Playground, PlaygroundResponse, PlaygroundState, DEFAULT_TOOL_ID};
