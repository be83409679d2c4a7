//! Database record types (entities).
//!
//! This module contains the three persisted entities plus the health state
//! carried by a live instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Health state
// ============================================================================

/// Health of a live instance. `Starting` is only ever assigned on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Starting,
    Up,
    Down,
    Unknown,
}

/// A health state that can be observed after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservedHealth {
    Up,
    Down,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Starting => "starting",
            HealthStatus::Up => "up",
            HealthStatus::Down => "down",
            HealthStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starting" => Ok(HealthStatus::Starting),
            "up" => Ok(HealthStatus::Up),
            "down" => Ok(HealthStatus::Down),
            "unknown" => Ok(HealthStatus::Unknown),
            other => Err(format!("unrecognised health status '{}'", other)),
        }
    }
}

impl From<ObservedHealth> for HealthStatus {
    fn from(observed: ObservedHealth) -> Self {
        match observed {
            ObservedHealth::Up => HealthStatus::Up,
            ObservedHealth::Down => HealthStatus::Down,
            ObservedHealth::Unknown => HealthStatus::Unknown,
        }
    }
}

impl fmt::Display for ObservedHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        HealthStatus::from(*self).fmt(f)
    }
}

// ============================================================================
// Services
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub service_id: Uuid,
    pub name: String,
    pub description: String,
    pub owner_info: String,
    pub industry_category: String,
    pub client_rating: f64,
    pub transaction_count: i64,
    #[serde(rename = "average_response_time")]
    pub avg_response_time: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for registration and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDetails {
    #[serde(default)]
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

// ============================================================================
// Instances
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub service_id: Uuid,
    pub instance_id: Uuid,
    pub version: String,
    pub host: String,
    pub port: u16,
    pub url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub api_spec: String,
    pub health_status: HealthStatus,
    pub transaction_count: i64,
    #[serde(rename = "average_response_time")]
    pub avg_response_time: f64,
    pub created_at: DateTime<Utc>,
    pub last_checked: DateTime<Utc>,
}

/// Caller-supplied fields for creating an instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewServiceInstance {
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

// ============================================================================
// History
// ============================================================================

pub const METRIC_HEALTH_STATUS: &str = "health_status";
pub const METRIC_TRANSACTION_COUNT: &str = "transaction_count";
pub const METRIC_AVG_RESPONSE_TIME: &str = "avg_response_time";

/// Immutable snapshot of a retired instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub history_id: Uuid,
    pub service_id: Uuid,
    pub instance_id: Uuid,
    pub version: String,
    pub url: String,
    pub metrics: Map<String, Value>,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Capture the terminal state of `instance` as of `stopped_at`.
    pub fn from_instance(instance: &ServiceInstance, stopped_at: DateTime<Utc>) -> Self {
        let mut metrics = Map::new();
        metrics.insert(
            METRIC_HEALTH_STATUS.to_string(),
            Value::String(instance.health_status.to_string()),
        );
        metrics.insert(
            METRIC_TRANSACTION_COUNT.to_string(),
            Value::from(instance.transaction_count),
        );
        metrics.insert(
            METRIC_AVG_RESPONSE_TIME.to_string(),
            Value::from(instance.avg_response_time),
        );

        Self {
            history_id: Uuid::new_v4(),
            service_id: instance.service_id,
            instance_id: instance.instance_id,
            version: instance.version.clone(),
            url: instance.url.clone(),
            metrics,
            started_at: instance.created_at,
            stopped_at,
        }
    }

    pub fn health_status(&self) -> Option<HealthStatus> {
        self.metrics
            .get(METRIC_HEALTH_STATUS)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    pub fn transaction_count(&self) -> i64 {
        self.metrics
            .get(METRIC_TRANSACTION_COUNT)
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    pub fn avg_response_time(&self) -> f64 {
        self.metrics
            .get(METRIC_AVG_RESPONSE_TIME)
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }
}
