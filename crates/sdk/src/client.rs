//! Main client for the Glider SDK.

use crate::config::ClientConfig;
use crate::error::{McpError, McpResult};
use crate::invoker::{CallToolResult, ToolInvoker};
use crate::protocol::{self, HealthResponse, JsonRpcRequest};
use crate::status::{self, ConnectionStatus, StatusCallback, StatusListeners, Subscription};
use crate::transport::http::{HEALTH_PATH, MCP_PATH};
use crate::transport::HttpTransport;
use async_trait::async_trait;
use glider_core::ToolParams;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Client for a Glider MCP server.
///
/// Cheap to clone; every clone shares the same connection status,
/// subscribers and health poll.
#[derive(Clone)]
pub struct McpClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: HttpTransport,
    base_url: RwLock<String>,
    timeout: Duration,
    health_timeout: Duration,
    health_check_interval: Duration,
    status: Mutex<ConnectionStatus>,
    listeners: Arc<Mutex<StatusListeners>>,
    /// Token of the current connect attempt and the poll it started.
    session: Mutex<Option<CancellationToken>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drop `null` and `""` arguments. `0` and `false` are real values and stay.
pub fn clean_params(params: ToolParams) -> ToolParams {
    params
        .into_iter()
        .filter(|(_, value)| !value.is_null() && value.as_str() != Some(""))
        .collect()
}

impl McpClient {
    /// Create a new client builder.
    pub fn builder() -> McpClientBuilder {
        McpClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn new(config: ClientConfig) -> McpResult<Self> {
        Self::builder().config(config).build()
    }

    pub fn status(&self) -> ConnectionStatus {
        *lock(&self.inner.status)
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    pub fn base_url(&self) -> String {
        self.inner.base_url()
    }

    /// Retarget the client. The URL is used verbatim as a prefix.
    pub fn set_base_url(&self, url: &str) {
        if url.is_empty() {
            warn!("Ignoring empty base URL");
            return;
        }
        let mut base_url = self
            .inner
            .base_url
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *base_url = url.to_string();
        debug!(base_url = %url, "Base URL changed");
    }

    /// `true` only for a 2xx health response whose `status` is `"ok"`.
    pub async fn check_health(&self) -> bool {
        match self.inner.fetch_health::<Value>().await {
            Ok(body) => protocol::is_healthy(&body),
            Err(_) => false,
        }
    }

    /// Decoded `/health` body, `None` on any failure.
    pub async fn server_status(&self) -> Option<HealthResponse> {
        match self.inner.fetch_health::<HealthResponse>().await {
            Ok(health) => Some(health),
            Err(e) => {
                debug!(error = %e, "Server status unavailable");
                None
            }
        }
    }

    /// Probe the server and start the health poll on success.
    ///
    /// Returns `false` without side effects while another connect is pending.
    pub async fn connect(&self) -> bool {
        self.inner.connect().await
    }

    /// Stop polling, abort a pending connect and go `disconnected`. Idempotent.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Run a tool. Failures of any kind come back as `success: false`.
    pub async fn call_tool(&self, tool_name: &str, params: ToolParams) -> CallToolResult {
        self.inner.call_tool(tool_name, params).await
    }

    /// Register a callback for status transitions.
    pub fn on_status_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(ConnectionStatus) + Send + Sync + 'static,
    {
        let id = lock(&self.inner.listeners).insert(Arc::new(callback));
        Subscription::new(id, &self.inner.listeners)
    }
}

impl fmt::Debug for McpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpClient")
            .field("base_url", &self.base_url())
            .field("status", &self.status())
            .finish()
    }
}

#[async_trait]
impl ToolInvoker for McpClient {
    async fn call_tool(&self, tool_name: &str, params: ToolParams) -> CallToolResult {
        self.inner.call_tool(tool_name, params).await
    }

    fn base_url(&self) -> String {
        self.inner.base_url()
    }

    fn set_base_url(&self, url: &str) {
        McpClient::set_base_url(self, url);
    }
}

impl ClientInner {
    fn base_url(&self) -> String {
        self.base_url
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn fetch_health<T: DeserializeOwned>(&self) -> McpResult<T> {
        let url = HttpTransport::endpoint(&self.base_url(), HEALTH_PATH)?;
        self.http.get_json(url, self.health_timeout).await
    }

    /// Health as a boolean. Only a malformed base URL or cancellation is an error.
    async fn probe_health(&self, session: &CancellationToken) -> McpResult<bool> {
        tokio::select! {
            _ = session.cancelled() => Err(McpError::Cancelled),
            result = self.fetch_health::<Value>() => match result {
                Ok(body) => Ok(protocol::is_healthy(&body)),
                Err(e @ McpError::InvalidUrl(_)) => Err(e),
                Err(e) => {
                    debug!(error = %e, "Health check failed");
                    Ok(false)
                }
            },
        }
    }

    /// Set the status and notify subscribers on an actual transition.
    fn set_status(&self, next: ConnectionStatus) {
        let previous = std::mem::replace(&mut *lock(&self.status), next);
        if previous != next {
            self.publish(next);
        }
    }

    /// Like [`set_status`](Self::set_status), unless `session` was cancelled.
    fn transition_if_live(&self, session: &CancellationToken, next: ConnectionStatus) -> bool {
        let previous = {
            let mut status = lock(&self.status);
            if session.is_cancelled() {
                return false;
            }
            std::mem::replace(&mut *status, next)
        };
        if previous != next {
            self.publish(next);
        }
        true
    }

    fn publish(&self, next: ConnectionStatus) {
        // Skip stale news: another transition already replaced this one.
        if *lock(&self.status) != next {
            return;
        }
        info!(status = %next, "Connection status changed");
        status::notify(&self.listeners, next);
    }

    async fn connect(self: &Arc<Self>) -> bool {
        let session = {
            let mut status = lock(&self.status);
            if *status == ConnectionStatus::Connecting {
                debug!("Connect already in progress");
                return false;
            }
            *status = ConnectionStatus::Connecting;

            let session = CancellationToken::new();
            if let Some(previous) = lock(&self.session).replace(session.clone()) {
                previous.cancel();
            }
            session
        };
        self.publish(ConnectionStatus::Connecting);

        let next = match self.probe_health(&session).await {
            Ok(true) => ConnectionStatus::Connected,
            Ok(false) => ConnectionStatus::Disconnected,
            Err(McpError::Cancelled) => {
                debug!("Connect aborted");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Connect failed");
                ConnectionStatus::Error
            }
        };

        if !self.transition_if_live(&session, next) {
            return false;
        }

        if next == ConnectionStatus::Connected {
            info!(base_url = %self.base_url(), "Connected to Glider server");
            self.start_polling(session);
            true
        } else {
            false
        }
    }

    fn disconnect(&self) {
        if let Some(session) = lock(&self.session).take() {
            session.cancel();
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    /// Spawn the periodic health poll bound to `session`.
    ///
    /// The task only holds a weak reference, so dropping every client handle
    /// ends it as well.
    fn start_polling(self: &Arc<Self>, session: CancellationToken) {
        let weak = Arc::downgrade(self);
        let period = self.health_check_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = session.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let Some(inner) = weak.upgrade() else { break };
                let healthy = matches!(inner.probe_health(&session).await, Ok(true));
                inner.apply_poll_result(&session, healthy);
            }

            debug!("Health polling stopped");
        });
    }

    fn apply_poll_result(&self, session: &CancellationToken, healthy: bool) {
        let next = {
            let mut status = lock(&self.status);
            if session.is_cancelled() {
                return;
            }
            let next = match (*status, healthy) {
                (ConnectionStatus::Connected, false) => ConnectionStatus::Disconnected,
                (current, true) if current != ConnectionStatus::Connected => {
                    ConnectionStatus::Connected
                }
                _ => return,
            };
            *status = next;
            next
        };

        if healthy {
            info!("Glider server reachable again");
        } else {
            warn!("Glider server stopped answering health checks");
        }
        self.publish(next);
    }

    async fn call_tool(&self, tool_name: &str, params: ToolParams) -> CallToolResult {
        let started = Instant::now();

        match self.request_tool(tool_name, params).await {
            Ok(data) => {
                debug!(tool = tool_name, "Tool call succeeded");
                CallToolResult::success(data, started.elapsed())
            }
            Err(e) => {
                warn!(tool = tool_name, error = %e, "Tool call failed");
                if e.is_connection_error() {
                    self.set_status(ConnectionStatus::Disconnected);
                }
                CallToolResult::failure(e.to_string(), started.elapsed())
            }
        }
    }

    async fn request_tool(&self, tool_name: &str, params: ToolParams) -> McpResult<Option<Value>> {
        let url = HttpTransport::endpoint(&self.base_url(), MCP_PATH)?;
        let request = JsonRpcRequest::call_tool(tool_name, clean_params(params));
        let response = self.http.post_rpc(url, &request, self.timeout).await?;
        response.into_tool_output()
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        if let Some(session) = lock(&self.session).take() {
            session.cancel();
        }
    }
}

/// Builder for creating an McpClient.
pub struct McpClientBuilder {
    config: ClientConfig,
    callbacks: Vec<StatusCallback>,
}

impl McpClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            callbacks: Vec::new(),
        }
    }

    /// Start from an existing configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the base URL of the Glider server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the tool call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn health_timeout(mut self, timeout: Duration) -> Self {
        self.config.health_timeout = timeout;
        self
    }

    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.config.health_check_interval = interval;
        self
    }

    /// Register a status subscriber up front.
    pub fn on_status_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(ConnectionStatus) + Send + Sync + 'static,
    {
        self.callbacks.push(Arc::new(callback));
        self
    }

    /// Build the client.
    pub fn build(self) -> McpResult<McpClient> {
        if self.config.base_url.is_empty() {
            return Err(McpError::Config("base_url is required".to_string()));
        }
        if self.config.health_check_interval.is_zero() {
            return Err(McpError::Config(
                "health_check_interval must be greater than zero".to_string(),
            ));
        }

        let mut listeners = StatusListeners::default();
        for callback in self.callbacks {
            listeners.insert(callback);
        }

        let inner = ClientInner {
            http: HttpTransport::new()?,
            base_url: RwLock::new(self.config.base_url),
            timeout: self.config.timeout,
            health_timeout: self.config.health_timeout,
            health_check_interval: self.config.health_check_interval,
            status: Mutex::new(ConnectionStatus::Disconnected),
            listeners: Arc::new(Mutex::new(listeners)),
            session: Mutex::new(None),
        };

        Ok(McpClient {
            inner: Arc::new(inner),
        })
    }
}

impl Default for McpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
