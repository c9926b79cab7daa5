use anyhow::{Context, Result};
use glider_core::storage::RedbKeyValueStore;
use glider_core::{HistoryLog, ToolCatalog};
use glider_sdk::{ConnectionStatus, McpClient, Subscription};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::state::Playground;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaygroundConfig {
    #[serde(skip)]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_health_check_interval_secs")]
    pub health_check_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_history_file")]
    pub history_file: String,
}

fn default_base_url() -> String {
    glider_sdk::config::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    glider_sdk::config::DEFAULT_TIMEOUT.as_secs()
}

fn default_health_check_interval_secs() -> u64 {
    glider_sdk::config::HEALTH_CHECK_INTERVAL.as_secs()
}

fn default_history_file() -> String {
    "history.redb".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            health_check_interval_secs: default_health_check_interval_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
        }
    }
}

impl PlaygroundConfig {
    pub fn load(config_path: &Path, data_dir: PathBuf) -> Result<Self> {
        // Create data directory if it doesn't exist
        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        // Load config file if it exists, otherwise use defaults
        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")?
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Self {
                data_dir: data_dir.clone(),
                server: Default::default(),
                storage: Default::default(),
            }
        };

        config.data_dir = data_dir;

        Ok(config)
    }

    /// Get the history database path
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.history_file)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.server.health_check_interval_secs)
    }
}

/// Process-wide instances, created once and handed to every command
#[derive(Clone)]
pub struct AppState {
    pub client: McpClient,
    pub catalog: Arc<ToolCatalog>,
    pub history: Arc<HistoryLog>,
    pub playground: Playground,
}

impl AppState {
    pub fn new(config: &PlaygroundConfig) -> Result<Self> {
        let client = McpClient::builder()
            .base_url(config.server.base_url.clone())
            .timeout(config.timeout())
            .health_check_interval(config.health_check_interval())
            .build()
            .context("Failed to create MCP client")?;

        let catalog = Arc::new(ToolCatalog::builtin().context("Failed to load tool catalog")?);

        let store = RedbKeyValueStore::new(config.history_path())
            .context("Failed to open history store")?;
        let history = Arc::new(HistoryLog::load(Arc::new(store)));

        let playground = Playground::new(
            catalog.clone(),
            Arc::new(client.clone()),
            history.clone(),
        );

        Ok(Self {
            client,
            catalog,
            history,
            playground,
        })
    }

    /// Mirror client status transitions into the playground state.
    pub fn link_connection_status(&self) -> Subscription {
        let playground = self.playground.clone();
        let subscription = self
            .client
            .on_status_change(move |status: ConnectionStatus| {
                playground.set_connection_status(status)
            });
        self.playground.set_connection_status(self.client.status());
        subscription
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config =
            PlaygroundConfig::load(&dir.path().join("glider.toml"), dir.path().join("data"))
                .unwrap();

        assert_eq!(config.server.base_url, "http://localhost:5001");
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.health_check_interval(), Duration::from_secs(5));
        assert_eq!(config.history_path(), dir.path().join("data/history.redb"));
        assert!(dir.path().join("data").is_dir());
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("glider.toml");
        std::fs::write(
            &path,
            "[server]\nbase_url = \"http://10.0.0.5:5001\"\ntimeout_secs = 30\n\n[storage]\nhistory_file = \"calls.redb\"\n",
        )
        .unwrap();

        let config = PlaygroundConfig::load(&path, dir.path().to_path_buf()).unwrap();

        assert_eq!(config.server.base_url, "http://10.0.0.5:5001");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        // Unset keys keep their defaults
        assert_eq!(config.server.health_check_interval_secs, 5);
        assert_eq!(config.history_path(), dir.path().join("calls.redb"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("glider.toml");
        std::fs::write(&path, "[server\nbase_url = ").unwrap();

        assert!(PlaygroundConfig::load(&path, dir.path().to_path_buf()).is_err());
    }

    #[tokio::test]
    async fn test_app_state_wires_history_and_status() {
        let dir = TempDir::new().unwrap();
        let config =
            PlaygroundConfig::load(&dir.path().join("glider.toml"), dir.path().to_path_buf())
                .unwrap();

        let state = AppState::new(&config).unwrap();
        assert_eq!(state.playground.server_url(), "http://localhost:5001");
        assert!(state.history.is_empty());

        let subscription = state.link_connection_status();
        state.client.disconnect();
        assert_eq!(
            state.playground.connection_status(),
            ConnectionStatus::Disconnected
        );
        subscription.unsubscribe();
        assert!(config.history_path().exists());
    }
}
