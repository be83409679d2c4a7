//! Database layer for the service directory.
//!
//! This module provides SQLite persistence for:
//! - Services (registered capabilities)
//! - Service instances (live, addressable deployments)
//! - Instance history (append-only snapshots of retired instances)
//!
//! The module is organized into submodules:
//! - `records` - All record types (entities)
//! - `services` - Service row operations
//! - `instances` - Live instance row operations
//! - `history` - History row operations

pub(crate) mod history;
pub(crate) mod instances;
mod records;
mod services;

pub use records::*;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::constants::database as db_constants;

/// Explicitly constructed store handle shared by every component.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Expose pool for integration test queries
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn new(database_path: &str) -> Result<Self> {
        info!("Initializing database at {}", database_path);

        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                debug!("Ensuring parent directory exists: {:?}", parent);
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    error!("Failed to create parent directory {:?}: {}", parent, e);
                    return Err(e.into());
                }
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path);
        let options = SqliteConnectOptions::from_str(&database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(db_constants::BUSY_TIMEOUT_SECONDS));

        let pool = match SqlitePoolOptions::new()
            .max_connections(db_constants::MAX_CONNECTIONS)
            .connect_with(options)
            .await
        {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to connect to database {}: {}", database_url, e);
                return Err(e.into());
            }
        };

        Self::from_pool(pool).await
    }

    /// Isolated in-memory store on a single connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: Pool<Sqlite>) -> Result<Self> {
        let database = Self { pool };

        if let Err(e) = database.initialize_tables().await {
            error!("Database table initialization failed: {}", e);
            return Err(e);
        }

        // Live rows that already have a history record were left behind by an
        // interrupted retirement; finish them before serving requests.
        match database.reconcile_orphaned_instances().await {
            Ok(ids) if !ids.is_empty() => {
                warn!("Completed retirement of {} orphaned instances on startup", ids.len())
            }
            Ok(_) => debug!("No orphaned instances found"),
            Err(e) => {
                error!("Failed to reconcile orphaned instances: {}", e);
                warn!("Continuing with startup; affected instances report OrphanPending");
            }
        }

        database.test_database().await?;
        info!("Database initialized");
        Ok(database)
    }

    async fn initialize_tables(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS services (
                service_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                owner_info TEXT NOT NULL DEFAULT '',
                industry_category TEXT NOT NULL DEFAULT '',
                client_rating REAL NOT NULL DEFAULT 0,
                transaction_count INTEGER NOT NULL DEFAULT 0,
                avg_response_time REAL NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS service_instances (
                instance_id TEXT PRIMARY KEY,
                service_id TEXT NOT NULL REFERENCES services(service_id),
                version TEXT NOT NULL DEFAULT '',
                host TEXT NOT NULL,
                port INTEGER NOT NULL,
                url TEXT NOT NULL DEFAULT '',
                latitude REAL NOT NULL DEFAULT 0,
                longitude REAL NOT NULL DEFAULT 0,
                api_spec TEXT NOT NULL DEFAULT '',
                health_status TEXT NOT NULL,
                transaction_count INTEGER NOT NULL DEFAULT 0,
                avg_response_time REAL NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                last_checked DATETIME NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_instances_service ON service_instances(service_id)",
            // service_id is a logical reference: history outlives a deleted service.
            r#"
            CREATE TABLE IF NOT EXISTS service_instance_history (
                history_id TEXT PRIMARY KEY,
                service_id TEXT NOT NULL,
                instance_id TEXT NOT NULL UNIQUE,
                version TEXT NOT NULL DEFAULT '',
                url TEXT NOT NULL DEFAULT '',
                metrics TEXT NOT NULL,
                started_at DATETIME NOT NULL,
                stopped_at DATETIME NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_history_service ON service_instance_history(service_id, stopped_at DESC)",
        ];

        for sql in statements {
            if let Err(e) = sqlx::query(sql).execute(&self.pool).await {
                error!("Failed to apply schema statement: {}", e);
                error!("SQL was: {}", sql);
                return Err(e.into());
            }
        }

        debug!("Schema ready");
        Ok(())
    }

    async fn test_database(&self) -> Result<()> {
        let row = sqlx::query("SELECT COUNT(*) AS services FROM services")
            .fetch_one(&self.pool)
            .await?;
        let services: i64 = row.try_get("services")?;
        debug!("Database reachable, {} registered services", services);
        Ok(())
    }
}

pub(crate) fn decode_uuid(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Uuid, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
