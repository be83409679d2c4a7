// File: directory/src/web/mod.rs
pub mod handlers;
pub mod server;

pub use server::{create_router, start_web_server};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::database::{Database, NewServiceInstance, ObservedHealth, ServiceDetails};
use crate::errors::{DirectoryError, DirectoryResult};
use crate::health::{HealthMonitor, HealthProbe};
use crate::services::{HistoryArchive, InstanceStore, ServiceStore, StatisticsAggregator};

// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub services: Arc<ServiceStore>,
    pub instances: Arc<InstanceStore>,
    pub archive: Arc<HistoryArchive>,
    pub health_monitor: Arc<HealthMonitor>,
    pub statistics: Arc<StatisticsAggregator>,
}

impl AppState {
    /// Wire every component onto one store handle.
    pub fn new(config: Arc<Config>, database: Arc<Database>, probe: Arc<dyn HealthProbe>) -> Self {
        let services = Arc::new(ServiceStore::new(database.clone()));
        let instances = Arc::new(InstanceStore::new(database.clone()));
        let archive = Arc::new(HistoryArchive::new(database.clone()));
        let health_monitor = Arc::new(HealthMonitor::new(
            database,
            services.clone(),
            instances.clone(),
            probe,
        ));
        let statistics = Arc::new(StatisticsAggregator::new(
            services.clone(),
            instances.clone(),
            archive.clone(),
        ));

        Self {
            config,
            services,
            instances,
            archive,
            health_monitor,
            statistics,
        }
    }
}

// === Request bodies ===

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceRequest {
    pub service_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner_info: String,
    #[serde(default)]
    pub industry_category: String,
    #[serde(default)]
    pub client_rating: f64,
}

impl ServiceRequest {
    pub fn validate(self) -> DirectoryResult<ServiceDetails> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DirectoryError::Validation("name must not be empty".to_string()));
        }
        if !self.client_rating.is_finite() {
            return Err(DirectoryError::Validation(
                "client_rating must be a number".to_string(),
            ));
        }

        Ok(ServiceDetails {
            service_id: self.service_id,
            name: name.to_string(),
            description: self.description,
            owner_info: self.owner_info,
            industry_category: self.industry_category,
            client_rating: self.client_rating,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInstanceRequest {
    pub service_id: Uuid,
    #[serde(default)]
    pub version: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub api_spec: String,
}

impl CreateInstanceRequest {
    pub fn validate(self) -> DirectoryResult<NewServiceInstance> {
        if self.host.trim().is_empty() {
            return Err(DirectoryError::Validation("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(DirectoryError::Validation("port must be non-zero".to_string()));
        }

        Ok(NewServiceInstance {
            service_id: self.service_id,
            version: self.version.trim().to_string(),
            host: self.host.trim().to_string(),
            port: self.port,
            url: self.url.trim().to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            api_spec: self.api_spec,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthUpdateRequest {
    pub status: String,
}

impl HealthUpdateRequest {
    /// Only observed states are accepted; `starting` is rejected here.
    pub fn validate(self) -> DirectoryResult<ObservedHealth> {
        match self.status.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(ObservedHealth::Up),
            "down" => Ok(ObservedHealth::Down),
            "unknown" => Ok(ObservedHealth::Unknown),
            other => Err(DirectoryError::Validation(format!(
                "status must be one of up, down, unknown (got '{}')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsageRequest {
    pub transactions: i64,
    #[serde(alias = "average_response_time")]
    pub avg_response_time_ms: f64,
}

impl UsageRequest {
    pub fn validate(self) -> DirectoryResult<(i64, f64)> {
        if self.transactions < 0 {
            return Err(DirectoryError::Validation(
                "transactions must not be negative".to_string(),
            ));
        }
        if !self.avg_response_time_ms.is_finite() || self.avg_response_time_ms < 0.0 {
            return Err(DirectoryError::Validation(
                "avg_response_time_ms must be a non-negative number".to_string(),
            ));
        }
        Ok((self.transactions, self.avg_response_time_ms))
    }
}

// === Response bodies ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceHealthCheck {
    pub instance_id: Uuid,
    pub status: ObservedHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealthCheck {
    pub service_id: Uuid,
    pub status: ObservedHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealthUpdate {
    pub service_id: Uuid,
    pub status: ObservedHealth,
    pub instances_updated: u64,
}
