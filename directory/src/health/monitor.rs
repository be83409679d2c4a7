// File: directory/src/health/monitor.rs
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::probe::{HealthProbe, ProbeTarget};
use crate::database::{Database, HealthStatus, ObservedHealth, ServiceInstance};
use crate::errors::{DirectoryError, DirectoryResult, StorageContext};
use crate::services::{InstanceStore, ServiceStore};

/// Drives instance health from `starting` into `up`/`down`/`unknown`.
///
/// Concurrent updates for one instance are last-write-wins on the wall-clock
/// `last_checked`: an update stamped earlier than the stored check is dropped.
pub struct HealthMonitor {
    database: Arc<Database>,
    services: Arc<ServiceStore>,
    instances: Arc<InstanceStore>,
    probe: Arc<dyn HealthProbe>,
}

impl HealthMonitor {
    pub fn new(
        database: Arc<Database>,
        services: Arc<ServiceStore>,
        instances: Arc<InstanceStore>,
        probe: Arc<dyn HealthProbe>,
    ) -> Self {
        Self {
            database,
            services,
            instances,
            probe,
        }
    }

    #[instrument(skip(self))]
    pub async fn update_health(
        &self,
        instance_id: Uuid,
        status: ObservedHealth,
    ) -> DirectoryResult<ServiceInstance> {
        let checked_at = Utc::now();
        let changed = self
            .database
            .update_instance_health(instance_id, HealthStatus::from(status), checked_at)
            .await
            .storage("updating instance health")?;

        // Either absent/retired, or a newer check already landed.
        let instance = self.instances.get(instance_id).await?;
        if changed == 0 {
            debug!(
                "Dropped stale health update for {} (stored check {} is newer)",
                instance_id, instance.last_checked
            );
        } else {
            info!("Instance {} health is now {}", instance_id, status);
        }
        Ok(instance)
    }

    /// Probe the instance endpoint and record the outcome.
    #[instrument(skip(self))]
    pub async fn perform_health_check(&self, instance_id: Uuid) -> DirectoryResult<ObservedHealth> {
        let instance = self.instances.get(instance_id).await?;
        let outcome = self.probe.probe(&ProbeTarget::from(&instance)).await;
        self.update_health(instance_id, outcome).await?;
        Ok(outcome)
    }

    /// Apply one status to every live instance of a service.
    #[instrument(skip(self))]
    pub async fn update_service_health(
        &self,
        service_id: Uuid,
        status: ObservedHealth,
    ) -> DirectoryResult<u64> {
        self.services.get(service_id).await?;

        let updated = self
            .database
            .update_service_instances_health(service_id, HealthStatus::from(status), Utc::now())
            .await
            .storage("updating service health")?;

        info!(
            "Service {} health set to {} on {} instances",
            service_id, status, updated
        );
        Ok(updated)
    }

    /// Probe every live instance of a service and report the aggregate.
    #[instrument(skip(self))]
    pub async fn check_service(&self, service_id: Uuid) -> DirectoryResult<ObservedHealth> {
        self.services.get(service_id).await?;
        let live = self.instances.list_for_service(service_id).await?;

        let outcomes = self.check_instances(&live).await;
        Ok(aggregate_health(outcomes.into_iter().map(|(_, status)| status)))
    }

    /// Probe all live instances. Used by the periodic sweep.
    pub async fn check_all_instances(&self) -> DirectoryResult<Vec<(Uuid, ObservedHealth)>> {
        let live = self.instances.list_all().await?;
        Ok(self.check_instances(&live).await)
    }

    async fn check_instances(&self, live: &[ServiceInstance]) -> Vec<(Uuid, ObservedHealth)> {
        let checks = live.iter().map(|instance| async move {
            let outcome = self.probe.probe(&ProbeTarget::from(instance)).await;
            match self.update_health(instance.instance_id, outcome).await {
                Ok(_) => Some((instance.instance_id, outcome)),
                // Retired while the probe was in flight
                Err(DirectoryError::NotFound { .. })
                | Err(DirectoryError::OrphanPending { .. }) => {
                    debug!("Instance {} retired during health check", instance.instance_id);
                    None
                }
                Err(e) => {
                    warn!(
                        "Failed to record health for {}: {}",
                        instance.instance_id, e
                    );
                    Some((instance.instance_id, outcome))
                }
            }
        });

        join_all(checks).await.into_iter().flatten().collect()
    }
}

/// `up` if any instance is up, else `down` if any is down, else `unknown`.
pub fn aggregate_health(statuses: impl IntoIterator<Item = ObservedHealth>) -> ObservedHealth {
    let mut any_down = false;
    for status in statuses {
        match status {
            ObservedHealth::Up => return ObservedHealth::Up,
            ObservedHealth::Down => any_down = true,
            ObservedHealth::Unknown => {}
        }
    }
    if any_down {
        ObservedHealth::Down
    } else {
        ObservedHealth::Unknown
    }
}
