// File: directory/src/services/service_store.rs
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::constants::limits;
use crate::database::{Database, Service, ServiceDetails};
use crate::errors::{DirectoryError, DirectoryResult, StorageContext};

/// Owns the `services` rows: registration, update, lookup, listing, deletion.
pub struct ServiceStore {
    database: Arc<Database>,
}

impl ServiceStore {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    #[instrument(skip(self, details), fields(name = %details.name))]
    pub async fn register(&self, details: ServiceDetails) -> DirectoryResult<Service> {
        validate_details(&details)?;

        let service_id = details.service_id.unwrap_or_else(Uuid::new_v4);
        if self
            .database
            .get_service(service_id)
            .await
            .storage("checking for an existing service")?
            .is_some()
        {
            return Err(DirectoryError::Conflict(format!(
                "service '{}' is already registered",
                service_id
            )));
        }

        let now = Utc::now();
        let service = Service {
            service_id,
            name: details.name.trim().to_string(),
            description: details.description,
            owner_info: details.owner_info,
            industry_category: details.industry_category,
            client_rating: details.client_rating,
            transaction_count: 0,
            avg_response_time: 0.0,
            created_at: now,
            updated_at: now,
        };

        match self.database.insert_service(&service).await {
            Ok(()) => {}
            // Lost a race with a concurrent registration of the same id
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(DirectoryError::Conflict(format!(
                    "service '{}' is already registered",
                    service_id
                )));
            }
            Err(e) => return Err(e).storage("inserting service"),
        }

        info!("Registered service {} ({})", service.name, service.service_id);
        Ok(service)
    }

    #[instrument(skip(self, details))]
    pub async fn update(
        &self,
        service_id: Uuid,
        details: ServiceDetails,
    ) -> DirectoryResult<Service> {
        validate_details(&details)?;
        if let Some(body_id) = details.service_id {
            if body_id != service_id {
                return Err(DirectoryError::Validation(format!(
                    "service_id '{}' does not match '{}'",
                    body_id, service_id
                )));
            }
        }

        let details = ServiceDetails {
            name: details.name.trim().to_string(),
            ..details
        };

        // Stored timestamps may come from another clock; never move updated_at
        // behind created_at.
        let existing = self.get(service_id).await?;
        let updated_at = Utc::now().max(existing.created_at);

        let updated = self
            .database
            .update_service(service_id, &details, updated_at)
            .await
            .storage("updating service")?
            .ok_or_else(|| DirectoryError::not_found("Service", service_id))?;

        info!("Updated service {}", service_id);
        Ok(updated)
    }

    pub async fn get(&self, service_id: Uuid) -> DirectoryResult<Service> {
        self.database
            .get_service(service_id)
            .await
            .storage("loading service")?
            .ok_or_else(|| DirectoryError::not_found("Service", service_id))
    }

    pub async fn list(&self) -> DirectoryResult<Vec<Service>> {
        self.database
            .get_all_services()
            .await
            .storage("listing services")
    }

    /// Remove the service row. Instances are not cascaded: a service that
    /// still has live instances cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete(&self, service_id: Uuid) -> DirectoryResult<()> {
        match self.database.delete_service(service_id).await {
            Ok(true) => {
                info!("Deleted service {}", service_id);
                Ok(())
            }
            Ok(false) => Err(DirectoryError::not_found("Service", service_id)),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                warn!("Refusing to delete service {} with live instances", service_id);
                Err(DirectoryError::Conflict(format!(
                    "service '{}' still has live instances",
                    service_id
                )))
            }
            Err(e) => Err(e).storage("deleting service"),
        }
    }
}

fn validate_details(details: &ServiceDetails) -> DirectoryResult<()> {
    if details.name.trim().is_empty() {
        return Err(DirectoryError::Validation("name must not be empty".to_string()));
    }
    if !details.client_rating.is_finite()
        || !(limits::MIN_CLIENT_RATING..=limits::MAX_CLIENT_RATING).contains(&details.client_rating)
    {
        return Err(DirectoryError::Validation(format!(
            "client_rating must be between {} and {}",
            limits::MIN_CLIENT_RATING,
            limits::MAX_CLIENT_RATING
        )));
    }
    Ok(())
}
