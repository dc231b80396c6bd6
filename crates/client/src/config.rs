//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

impl ClientConfig {
    pub fn load(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| "Failed to parse config file")?;
        Ok(config)
    }

    pub fn save(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = directories::ProjectDirs::from("chat", "tinychat", "tinychat-client") {
            config_dir.config_dir().join("client.toml")
        } else {
            PathBuf::from("client.toml")
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ConnectionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub poll_interval_ms: u64,
    pub shutdown_grace_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            shutdown_grace_ms: 2000,
        }
    }
}

impl SyncSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub show_timestamps: bool,
    pub warn_on_name_collision: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            show_timestamps: false,
            warn_on_name_collision: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serialization() {
        let config = ClientConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: ClientConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(config.connection.base_url, deserialized.connection.base_url);
        assert_eq!(deserialized.sync.poll_interval(), Duration::from_secs(1));
        assert_eq!(deserialized.sync.shutdown_grace(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            "[connection]\nbase_url = \"http://chat.example:9000\"\n\n[sync]\npoll_interval_ms = 250\n",
        )
        .unwrap();
        assert_eq!(config.connection.base_url, "http://chat.example:9000");
        assert_eq!(config.connection.timeout_secs, 10);
        assert_eq!(config.sync.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.sync.shutdown_grace_ms, 2000);
        assert!(config.ui.warn_on_name_collision);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = std::env::temp_dir().join("tinychat_config_test");
        let path = temp_dir.join("client.toml");

        let mut config = ClientConfig::default();
        config.ui.show_timestamps = true;
        config.save(&path).unwrap();

        let loaded = ClientConfig::load(&path).unwrap();
        assert!(loaded.ui.show_timestamps);

        std::fs::remove_dir_all(&temp_dir).ok();
    }
}
