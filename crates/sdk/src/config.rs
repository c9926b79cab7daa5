//! Configuration types for the Glider SDK.

use std::time::Duration;

/// Origin of a locally running Glider server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5001";

/// Tool calls can load whole solutions, so the default is generous.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout applied to every `/health` request.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Period of the background health poll while connected.
pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for the MCP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Glider server, used verbatim as a prefix for `/health` and `/mcp`.
    pub base_url: String,
    /// Timeout for tool calls.
    pub timeout: Duration,
    /// Timeout for health checks.
    pub health_timeout: Duration,
    /// Interval between background health checks.
    pub health_check_interval: Duration,
}

impl ClientConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            health_timeout: HEALTH_CHECK_TIMEOUT,
            health_check_interval: HEALTH_CHECK_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();

        assert_eq!(config.base_url, "http://localhost:5001");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.health_timeout, Duration::from_secs(5));
        assert_eq!(config.health_check_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_client_config_new() {
        let config = ClientConfig::new("http://custom:8080");

        assert_eq!(config.base_url, "http://custom:8080");
        // Other defaults should still be present
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }
}
