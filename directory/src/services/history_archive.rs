// File: directory/src/services/history_archive.rs
use std::sync::Arc;
use uuid::Uuid;

use crate::database::{Database, HistoryRecord};
use crate::errors::{DirectoryError, DirectoryResult, StorageContext};

/// Read side of the append-only history of retired instances.
///
/// Records are only ever written by `InstanceStore::retire`, inside the same
/// transaction that removes the live row.
pub struct HistoryArchive {
    database: Arc<Database>,
}

impl HistoryArchive {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Most recently retired first.
    pub async fn list_for_service(&self, service_id: Uuid) -> DirectoryResult<Vec<HistoryRecord>> {
        self.database
            .get_history_for_service(service_id)
            .await
            .storage("listing service history")
    }

    pub async fn list_for_instance(
        &self,
        instance_id: Uuid,
    ) -> DirectoryResult<Vec<HistoryRecord>> {
        self.database
            .get_history_for_instance(instance_id)
            .await
            .storage("listing instance history")
    }

    /// The terminal record of a retired instance.
    pub async fn get_for_instance(&self, instance_id: Uuid) -> DirectoryResult<HistoryRecord> {
        self.list_for_instance(instance_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DirectoryError::not_found("History record for instance", instance_id))
    }
}
