//! Reachability probes for service instances

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;

use crate::database::{ObservedHealth, ServiceInstance};

/// Where an instance can be reached.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeTarget {
    pub instance_id: Uuid,
    pub host: String,
    pub port: u16,
    pub url: String,
}

impl ProbeTarget {
    /// The instance URL when registered, otherwise `http://host:port{probe_path}`.
    pub fn endpoint(&self, probe_path: &str) -> String {
        if !self.url.is_empty() {
            return self.url.clone();
        }
        let path = if probe_path.starts_with('/') {
            probe_path.to_string()
        } else {
            format!("/{}", probe_path)
        };
        format!("http://{}:{}{}", self.host, self.port, path)
    }
}

impl From<&ServiceInstance> for ProbeTarget {
    fn from(instance: &ServiceInstance) -> Self {
        Self {
            instance_id: instance.instance_id,
            host: instance.host.clone(),
            port: instance.port,
            url: instance.url.clone(),
        }
    }
}

/// Classifies an instance endpoint as up, down, or unknown.
///
/// `Unknown` means the probe itself could not reach a verdict (timeout,
/// resolver failure), not that the instance answered negatively.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, target: &ProbeTarget) -> ObservedHealth;
}

pub struct HttpProbe {
    client: HttpClient,
    timeout: Duration,
    probe_path: String,
}

impl HttpProbe {
    pub fn new(probe_timeout: Duration, probe_path: impl Into<String>) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(probe_timeout)
            .no_proxy()
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP probe client: {}", e))?;

        Ok(Self {
            client,
            timeout: probe_timeout,
            probe_path: probe_path.into(),
        })
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, target: &ProbeTarget) -> ObservedHealth {
        let endpoint = target.endpoint(&self.probe_path);

        let outcome = match timeout(self.timeout, self.client.get(&endpoint).send()).await {
            Err(_) => ObservedHealth::Unknown,
            Ok(Ok(response)) if response.status().is_success() => ObservedHealth::Up,
            Ok(Ok(response)) => {
                debug!("Probe of {} returned HTTP {}", endpoint, response.status());
                ObservedHealth::Down
            }
            Ok(Err(e)) if e.is_timeout() => ObservedHealth::Unknown,
            Ok(Err(e)) if e.is_connect() => {
                debug!("Probe of {} could not connect: {}", endpoint, e);
                ObservedHealth::Down
            }
            Ok(Err(e)) => {
                debug!("Probe of {} failed: {}", endpoint, e);
                ObservedHealth::Unknown
            }
        };

        debug!("Probe of instance {} at {}: {}", target.instance_id, endpoint, outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(url: &str) -> ProbeTarget {
        ProbeTarget {
            instance_id: Uuid::new_v4(),
            host: "10.0.0.1".into(),
            port: 9090,
            url: url.into(),
        }
    }

    #[test]
    fn endpoint_prefers_registered_url() {
        assert_eq!(
            target("https://api.example.com/ping").endpoint("/health"),
            "https://api.example.com/ping"
        );
    }

    #[test]
    fn endpoint_falls_back_to_host_and_port() {
        assert_eq!(target("").endpoint("/health"), "http://10.0.0.1:9090/health");
        assert_eq!(target("").endpoint("status"), "http://10.0.0.1:9090/status");
    }
}
