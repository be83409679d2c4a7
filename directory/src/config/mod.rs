// File: directory/src/config/mod.rs
pub mod manager;
use serde::{Deserialize, Serialize};
use std::time::Duration;
pub use manager::ConfigManager;

use crate::constants::defaults;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,
    // Periodic sweep over all live instances; absent or 0 disables it
    pub health_check_interval_seconds: Option<u64>,
    pub probe_path: Option<String>,
}

fn default_host() -> String {
    defaults::HOST.to_string()
}

fn default_port() -> u16 {
    defaults::PORT
}

fn default_database_path() -> String {
    defaults::DATABASE_PATH.to_string()
}

fn default_request_timeout() -> u64 {
    defaults::REQUEST_TIMEOUT_SECONDS
}

fn default_probe_timeout() -> u64 {
    defaults::PROBE_TIMEOUT_SECONDS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            request_timeout_seconds: default_request_timeout(),
            probe_timeout_seconds: default_probe_timeout(),
            health_check_interval_seconds: None,
            probe_path: None,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    pub fn health_check_interval(&self) -> Option<Duration> {
        self.health_check_interval_seconds
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
    }

    pub fn probe_path(&self) -> &str {
        self.probe_path.as_deref().unwrap_or(defaults::PROBE_PATH)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be non-zero".to_string());
        }
        if self.request_timeout_seconds == 0 {
            return Err("request_timeout_seconds must be non-zero".to_string());
        }
        if self.probe_timeout_seconds == 0 {
            return Err("probe_timeout_seconds must be non-zero".to_string());
        }
        if self.database_path.trim().is_empty() {
            return Err("database_path must not be empty".to_string());
        }
        Ok(())
    }
}
