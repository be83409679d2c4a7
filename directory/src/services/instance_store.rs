// File: directory/src/services/instance_store.rs
//! Live instance ownership and retirement.
//!
//! Retirement hands an instance over to the history archive. Inside one
//! transaction the live row is locked, its terminal state is written to
//! `service_instance_history`, and only then is the live row deleted. The
//! archive insert is deduplicated on `instance_id`, so a replay after a
//! partial failure completes the delete without writing a second record.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::database::{
    history, instances, Database, HealthStatus, HistoryRecord, NewServiceInstance, ServiceInstance,
};
use crate::constants::limits::{MAX_LATITUDE, MAX_LONGITUDE};
use crate::errors::{DirectoryError, DirectoryResult, StorageContext};

/// Owns the `service_instances` rows.
pub struct InstanceStore {
    database: Arc<Database>,
}

impl InstanceStore {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    #[instrument(skip(self, request), fields(service_id = %request.service_id))]
    pub async fn create(&self, request: NewServiceInstance) -> DirectoryResult<ServiceInstance> {
        validate_new_instance(&request)?;

        if self
            .database
            .get_service(request.service_id)
            .await
            .storage("checking parent service")?
            .is_none()
        {
            return Err(DirectoryError::not_found("Service", request.service_id));
        }

        let now = Utc::now();
        let instance = ServiceInstance {
            service_id: request.service_id,
            instance_id: Uuid::new_v4(),
            version: request.version,
            host: request.host.trim().to_string(),
            port: request.port,
            url: request.url.trim().to_string(),
            latitude: request.latitude,
            longitude: request.longitude,
            api_spec: request.api_spec,
            health_status: HealthStatus::Starting,
            transaction_count: 0,
            avg_response_time: 0.0,
            created_at: now,
            last_checked: now,
        };

        match self.database.insert_instance(&instance).await {
            Ok(()) => {}
            // Parent service deleted between the check and the insert
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                return Err(DirectoryError::not_found("Service", request.service_id));
            }
            Err(e) => return Err(e).storage("inserting service instance"),
        }

        info!(
            "Created instance {} of service {} at {}:{}",
            instance.instance_id, instance.service_id, instance.host, instance.port
        );
        Ok(instance)
    }

    /// Fetch a live instance. An archived row still awaiting removal is
    /// reported as `OrphanPending`, never as live.
    pub async fn get(&self, instance_id: Uuid) -> DirectoryResult<ServiceInstance> {
        match self
            .database
            .get_instance(instance_id)
            .await
            .storage("loading service instance")?
        {
            Some((_, true)) => Err(DirectoryError::OrphanPending { instance_id }),
            Some((instance, false)) => Ok(instance),
            None => Err(DirectoryError::not_found("Service instance", instance_id)),
        }
    }

    pub async fn list_for_service(
        &self,
        service_id: Uuid,
    ) -> DirectoryResult<Vec<ServiceInstance>> {
        self.database
            .get_live_instances_for_service(service_id)
            .await
            .storage("listing service instances")
    }

    pub async fn list_all(&self) -> DirectoryResult<Vec<ServiceInstance>> {
        self.database
            .get_all_live_instances()
            .await
            .storage("listing live instances")
    }

    /// Retire a live instance into the history archive.
    ///
    /// A second call for the same id fails with `NotFound`. Dropping the
    /// returned future before it completes rolls the transaction back and
    /// leaves the instance live and unarchived.
    #[instrument(skip(self))]
    pub async fn retire(&self, instance_id: Uuid) -> DirectoryResult<HistoryRecord> {
        let mut tx = self
            .database
            .pool()
            .begin()
            .await
            .storage("starting retirement")?;

        let instance = instances::lock_instance(&mut tx, instance_id)
            .await
            .storage("locking service instance")?
            .ok_or_else(|| DirectoryError::not_found("Service instance", instance_id))?;

        let stopped_at = Utc::now().max(instance.created_at);
        let composed = HistoryRecord::from_instance(&instance, stopped_at);

        let (record, previously_archived) =
            if history::insert_history_record(&mut tx, &composed)
                .await
                .storage("archiving service instance")?
            {
                (composed, false)
            } else {
                // Archived by an earlier attempt; only the delete is left to do.
                let existing = history::find_history_record(&mut tx, instance_id)
                    .await
                    .storage("loading existing history record")?
                    .ok_or_else(|| DirectoryError::OrphanPending { instance_id })?;
                warn!(
                    "Instance {} already archived as {}; completing removal",
                    instance_id, existing.history_id
                );
                (existing, true)
            };

        let removal = async {
            let deleted = instances::delete_instance(&mut tx, instance_id).await?;
            if deleted != 1 {
                return Err(sqlx::Error::RowNotFound);
            }
            tx.commit().await
        }
        .await;

        match removal {
            Ok(()) => {
                info!(
                    "Retired instance {} of service {} (history {})",
                    instance_id, record.service_id, record.history_id
                );
                Ok(record)
            }
            // The archive row was durable before this attempt; only the live
            // delete is unconfirmed.
            Err(e) if previously_archived => {
                error!("Removal of archived instance {} failed: {}", instance_id, e);
                Err(DirectoryError::OrphanPending { instance_id })
            }
            Err(e) => {
                error!("Retirement of instance {} rolled back: {}", instance_id, e);
                Err(e).storage("removing retired service instance")
            }
        }
    }

    /// Fold a usage sample into the instance's running counters.
    #[instrument(skip(self))]
    pub async fn record_usage(
        &self,
        instance_id: Uuid,
        transactions: i64,
        avg_response_time_ms: f64,
    ) -> DirectoryResult<ServiceInstance> {
        if transactions < 0 {
            return Err(DirectoryError::Validation(
                "transactions must not be negative".to_string(),
            ));
        }
        if !avg_response_time_ms.is_finite() || avg_response_time_ms < 0.0 {
            return Err(DirectoryError::Validation(
                "avg_response_time must be a non-negative number".to_string(),
            ));
        }

        let updated = self
            .database
            .record_instance_usage(instance_id, transactions, avg_response_time_ms)
            .await
            .storage("recording instance usage")?;

        match updated {
            Some(instance) => {
                debug!(
                    "Instance {} now at {} transactions",
                    instance_id, instance.transaction_count
                );
                Ok(instance)
            }
            None => Err(self.absent_or_orphaned(instance_id).await),
        }
    }

    /// Complete the removal of instances archived by an interrupted
    /// retirement. Returns the reconciled instance ids.
    pub async fn reconcile_orphans(&self) -> DirectoryResult<Vec<Uuid>> {
        let reconciled = self
            .database
            .reconcile_orphaned_instances()
            .await
            .storage("reconciling orphaned instances")?;
        if !reconciled.is_empty() {
            warn!("Reconciled {} orphaned instances", reconciled.len());
        }
        Ok(reconciled)
    }

    /// Classify an instance that a conditional write did not touch.
    pub(crate) async fn absent_or_orphaned(&self, instance_id: Uuid) -> DirectoryError {
        match self.get(instance_id).await {
            Ok(_) => DirectoryError::Conflict(format!(
                "instance '{}' changed concurrently",
                instance_id
            )),
            Err(e) => e,
        }
    }
}

fn validate_new_instance(request: &NewServiceInstance) -> DirectoryResult<()> {
    if request.host.trim().is_empty() {
        return Err(DirectoryError::Validation("host must not be empty".to_string()));
    }
    if request.port == 0 {
        return Err(DirectoryError::Validation("port must be non-zero".to_string()));
    }
    if !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&request.latitude) {
        return Err(DirectoryError::Validation(format!(
            "latitude must be between -{0} and {0}",
            MAX_LATITUDE
        )));
    }
    if !(-MAX_LONGITUDE..=MAX_LONGITUDE).contains(&request.longitude) {
        return Err(DirectoryError::Validation(format!(
            "longitude must be between -{0} and {0}",
            MAX_LONGITUDE
        )));
    }
    let url = request.url.trim();
    if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(DirectoryError::Validation(format!(
            "url '{}' must be an http(s) URL",
            url
        )));
    }
    Ok(())
}
