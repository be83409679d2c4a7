// File: directory/src/services/statistics.rs
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::database::{HealthStatus, HistoryRecord, ServiceInstance};
use crate::errors::DirectoryResult;
use crate::services::{HistoryArchive, InstanceStore, ServiceStore};

/// Point-in-time usage statistics for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatistics {
    pub service_id: Uuid,
    pub transaction_count: i64,
    /// Transaction-weighted mean, in milliseconds
    #[serde(rename = "average_response_time")]
    pub avg_response_time: f64,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl ServiceStatistics {
    /// Combine live counters with the metrics captured at retirement.
    ///
    /// Counts add up. Response time is the mean of each source's average
    /// weighted by its transaction count, so idle instances do not dilute it.
    /// An instance present in both inputs (retired between the two reads) is
    /// counted once, from its history record.
    pub fn aggregate(
        service_id: Uuid,
        live: &[ServiceInstance],
        history: &[HistoryRecord],
    ) -> Self {
        let archived: HashSet<Uuid> = history.iter().map(|r| r.instance_id).collect();

        let mut transaction_count: i64 = 0;
        let mut weighted_sum = 0.0;
        let mut by_health: [(HealthStatus, u64); 4] = [
            (HealthStatus::Starting, 0),
            (HealthStatus::Up, 0),
            (HealthStatus::Down, 0),
            (HealthStatus::Unknown, 0),
        ];
        let mut live_count = 0u64;

        for instance in live.iter().filter(|i| !archived.contains(&i.instance_id)) {
            live_count += 1;
            transaction_count += instance.transaction_count;
            weighted_sum += instance.avg_response_time * instance.transaction_count as f64;
            if let Some(slot) = by_health
                .iter_mut()
                .find(|(status, _)| *status == instance.health_status)
            {
                slot.1 += 1;
            }
        }

        for record in history {
            let count = record.transaction_count();
            transaction_count += count;
            weighted_sum += record.avg_response_time() * count as f64;
        }

        let avg_response_time = if transaction_count > 0 {
            weighted_sum / transaction_count as f64
        } else {
            0.0
        };

        let mut details = Map::new();
        details.insert("live_instances".into(), Value::from(live_count));
        details.insert("retired_instances".into(), Value::from(history.len() as u64));
        for (status, count) in by_health {
            details.insert(format!("instances_{}", status), Value::from(count));
        }
        details.insert("generated_at".into(), Value::from(Utc::now().to_rfc3339()));

        Self {
            service_id,
            transaction_count,
            avg_response_time,
            details,
        }
    }
}

/// Read-only view deriving per-service statistics.
pub struct StatisticsAggregator {
    services: Arc<ServiceStore>,
    instances: Arc<InstanceStore>,
    archive: Arc<HistoryArchive>,
}

impl StatisticsAggregator {
    pub fn new(
        services: Arc<ServiceStore>,
        instances: Arc<InstanceStore>,
        archive: Arc<HistoryArchive>,
    ) -> Self {
        Self {
            services,
            instances,
            archive,
        }
    }

    #[instrument(skip(self))]
    pub async fn retrieve_statistics(
        &self,
        service_id: Uuid,
    ) -> DirectoryResult<ServiceStatistics> {
        self.services.get(service_id).await?;

        // Live rows first: an instance retired between the reads then shows up
        // in both and is deduplicated, never in neither.
        let live = self.instances.list_for_service(service_id).await?;
        let history = self.archive.list_for_service(service_id).await?;

        debug!(
            "Aggregating {} live and {} retired instances for {}",
            live.len(),
            history.len(),
            service_id
        );
        Ok(ServiceStatistics::aggregate(service_id, &live, &history))
    }
}
