//! Test database utilities for in-memory SQLite testing

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use directory::config::Config;
use directory::database::{Database, ServiceInstance};
use directory::health::{HealthMonitor, HealthProbe};
use directory::services::{HistoryArchive, InstanceStore, ServiceStore, StatisticsAggregator};
use directory::web::AppState;

/// In-memory store with every component wired onto it
pub struct TestDatabase {
    pub database: Arc<Database>,
    pub services: Arc<ServiceStore>,
    pub instances: Arc<InstanceStore>,
    pub archive: Arc<HistoryArchive>,
    _storage_dir: Option<TempDir>,
}

impl TestDatabase {
    /// Create a new in-memory test database
    pub async fn new() -> Result<Self> {
        let database = Arc::new(Database::in_memory().await?);
        Ok(Self::wire(database, None))
    }

    /// File-backed store with the full connection pool, removed on drop
    pub async fn on_disk() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("directory.db");
        let database = Arc::new(Database::new(&path.to_string_lossy()).await?);
        Ok(Self::wire(database, Some(dir)))
    }

    fn wire(database: Arc<Database>, storage_dir: Option<TempDir>) -> Self {
        Self {
            services: Arc::new(ServiceStore::new(database.clone())),
            instances: Arc::new(InstanceStore::new(database.clone())),
            archive: Arc::new(HistoryArchive::new(database.clone())),
            database,
            _storage_dir: storage_dir,
        }
    }

    /// Get the database pool
    pub fn pool(&self) -> &SqlitePool {
        self.database.pool()
    }

    pub fn health_monitor(&self, probe: Arc<dyn HealthProbe>) -> HealthMonitor {
        HealthMonitor::new(
            self.database.clone(),
            self.services.clone(),
            self.instances.clone(),
            probe,
        )
    }

    pub fn statistics(&self) -> StatisticsAggregator {
        StatisticsAggregator::new(
            self.services.clone(),
            self.instances.clone(),
            self.archive.clone(),
        )
    }

    pub fn app_state(&self, probe: Arc<dyn HealthProbe>) -> AppState {
        AppState::new(Arc::new(Config::default()), self.database.clone(), probe)
    }

    /// Write a history row for `instance` without removing the live row,
    /// as a crash between the two writes would leave it.
    pub async fn archive_without_delete(&self, instance: &ServiceInstance) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO service_instance_history (
                history_id, service_id, instance_id, version, url, metrics, started_at, stopped_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(instance.service_id.to_string())
        .bind(instance.instance_id.to_string())
        .bind(&instance.version)
        .bind(&instance.url)
        .bind(format!(
            r#"{{"health_status":"{}"}}"#,
            instance.health_status
        ))
        .bind(instance.created_at)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Number of history rows recorded for `instance_id`
    pub async fn history_count(&self, instance_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM service_instance_history WHERE instance_id = ?",
        )
        .bind(instance_id.to_string())
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }
}
