// File: directory/src/config/manager.rs
use super::Config;
use crate::constants::defaults;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::fs;
use tracing::info;

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_path: String) -> Result<Self> {
        let config = Self::load_configuration(&config_path).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    /// Load from `REGISTRY_CONFIG_PATH`, falling back to `config/main.toml`.
    pub async fn from_env() -> Result<Self> {
        let config_path = std::env::var(defaults::CONFIG_PATH_ENV)
            .unwrap_or_else(|_| defaults::CONFIG_PATH.to_string());
        Self::new(config_path).await
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_path: &str) -> Result<Config> {
        let content = fs::read_to_string(config_path)
            .await
            .map_err(|e| anyhow!("Failed to read config {}: {}", config_path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config {}: {}", config_path, e))?;

        config
            .validate()
            .map_err(|e| anyhow!("Invalid config {}: {}", config_path, e))?;

        info!(
            "Loaded configuration from {} (listen {}, database {})",
            config_path,
            config.bind_address(),
            config.database_path
        );

        Ok(config)
    }
}
