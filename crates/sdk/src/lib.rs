//! # Glider SDK
//!
//! Rust client for the Glider MCP server: JSON-RPC 2.0 tool calls over HTTP,
//! Server-Sent-Event responses and connection monitoring.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use glider_sdk::{McpClient, McpResult, ToolParams};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> McpResult<()> {
//!     // Build client
//!     let client = McpClient::builder()
//!         .base_url("http://localhost:5001")
//!         .build()?;
//!
//!     // Connect and start health monitoring
//!     if !client.connect().await {
//!         eprintln!("Server unreachable: {}", client.status());
//!         return Ok(());
//!     }
//!
//!     // Call a tool
//!     let mut params = ToolParams::new();
//!     params.insert("pattern".to_string(), json!("*Service"));
//!     let result = client.call_tool("find_types", params).await;
//!     println!("success={} in {}ms", result.success, result.duration);
//!
//!     client.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! ## Status Subscriptions
//!
//! ```rust,no_run
//! use glider_sdk::McpClient;
//!
//! # async fn example() -> glider_sdk::McpResult<()> {
//! let client = McpClient::builder().build()?;
//!
//! let subscription = client.on_status_change(|status| {
//!     println!("Connection is now {}", status);
//! });
//!
//! client.connect().await;
//! subscription.unsubscribe();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod invoker;
pub mod protocol;
pub mod status;
pub mod transport;

// Re-export main client
pub use client::{clean_params, McpClient, McpClientBuilder};
pub use config::ClientConfig;
pub use error::{McpError, McpResult};
pub use invoker::{CallToolResult, ToolInvoker};
pub use protocol::HealthResponse;
pub use status::{ConnectionStatus, StatusCallback, Subscription};

// Re-export core types for convenience
pub use glider_core::ToolParams;
