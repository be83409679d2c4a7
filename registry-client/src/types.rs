// File: registry-client/src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

// === REQUEST STRUCTURES ===

/// Registration body. `service_id` is assigned by the directory when absent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceRegistration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub owner_info: String,
    pub industry_category: String,
    pub client_rating: f64,
}

impl ServiceRegistration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthUpdateBody {
    pub status: HealthStatus,
}

// === RESPONSE STRUCTURES ===

/// Envelope every directory endpoint responds with
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(default)]
    pub retryable: Option<bool>,
}

/// Observed health of a service. `starting` is assigned by the directory
/// alone, so a client can neither send nor receive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
    Unknown,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Up => "up",
            HealthStatus::Down => "down",
            HealthStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Service {
    pub service_id: Uuid,
    pub name: String,
    pub description: String,
    pub owner_info: String,
    pub industry_category: String,
    pub client_rating: f64,
    pub transaction_count: i64,
    pub average_response_time: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceStatistics {
    pub service_id: Uuid,
    pub transaction_count: i64,
    pub average_response_time: f64,
    #[serde(default)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServiceHealthCheck {
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServiceHealthUpdate {
    pub instances_updated: u64,
}
