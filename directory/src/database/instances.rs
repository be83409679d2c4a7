//! Live instance row operations.
//!
//! An instance row that already has a history record is archived, not live:
//! every read and update here excludes such rows.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::{debug, info};
use uuid::Uuid;

use super::records::{HealthStatus, ServiceInstance};
use super::{decode_uuid, Database};

const INSTANCE_COLUMNS: &str = "instance_id, service_id, version, host, port, url, latitude, \
     longitude, api_spec, health_status, transaction_count, avg_response_time, created_at, \
     last_checked";

const ARCHIVED: &str = "EXISTS (SELECT 1 FROM service_instance_history h \
     WHERE h.instance_id = service_instances.instance_id)";

const NOT_ARCHIVED: &str = "NOT EXISTS (SELECT 1 FROM service_instance_history h \
     WHERE h.instance_id = service_instances.instance_id)";

impl Database {
    pub async fn insert_instance(&self, instance: &ServiceInstance) -> Result<(), sqlx::Error> {
        debug!(
            "Inserting instance {} for service {}",
            instance.instance_id, instance.service_id
        );

        sqlx::query(
            r#"
            INSERT INTO service_instances (
                instance_id, service_id, version, host, port, url, latitude, longitude,
                api_spec, health_status, transaction_count, avg_response_time,
                created_at, last_checked
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(instance.instance_id.to_string())
        .bind(instance.service_id.to_string())
        .bind(&instance.version)
        .bind(&instance.host)
        .bind(i64::from(instance.port))
        .bind(&instance.url)
        .bind(instance.latitude)
        .bind(instance.longitude)
        .bind(&instance.api_spec)
        .bind(instance.health_status.as_str())
        .bind(instance.transaction_count)
        .bind(instance.avg_response_time)
        .bind(instance.created_at)
        .bind(instance.last_checked)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up an instance row and whether it has already been archived.
    pub async fn get_instance(
        &self,
        instance_id: Uuid,
    ) -> Result<Option<(ServiceInstance, bool)>, sqlx::Error> {
        let sql = format!(
            "SELECT {}, {} AS archived FROM service_instances WHERE instance_id = ?",
            INSTANCE_COLUMNS, ARCHIVED
        );
        let row = sqlx::query(&sql)
            .bind(instance_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let archived: i64 = row.try_get("archived")?;
                Ok(Some((row_to_instance(&row)?, archived != 0)))
            }
            None => Ok(None),
        }
    }

    pub async fn get_live_instances_for_service(
        &self,
        service_id: Uuid,
    ) -> Result<Vec<ServiceInstance>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM service_instances WHERE service_id = ? AND {} ORDER BY created_at",
            INSTANCE_COLUMNS, NOT_ARCHIVED
        );
        let rows = sqlx::query(&sql)
            .bind(service_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_instance).collect()
    }

    pub async fn get_all_live_instances(&self) -> Result<Vec<ServiceInstance>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM service_instances WHERE {} ORDER BY created_at",
            INSTANCE_COLUMNS, NOT_ARCHIVED
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_instance).collect()
    }

    /// Last-write-wins on `last_checked`: an update older than the stored
    /// check time is ignored. Returns the number of rows changed.
    pub async fn update_instance_health(
        &self,
        instance_id: Uuid,
        status: HealthStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE service_instances
            SET health_status = ?, last_checked = ?
            WHERE instance_id = ? AND last_checked <= ? AND {}
            "#,
            NOT_ARCHIVED
        );
        let result = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(checked_at)
            .bind(instance_id.to_string())
            .bind(checked_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_service_instances_health(
        &self,
        service_id: Uuid,
        status: HealthStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE service_instances
            SET health_status = ?, last_checked = ?
            WHERE service_id = ? AND last_checked <= ? AND {}
            "#,
            NOT_ARCHIVED
        );
        let result = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(checked_at)
            .bind(service_id.to_string())
            .bind(checked_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Fold a usage sample into the instance and its service in one
    /// transaction. `None` when the instance is not live.
    pub async fn record_instance_usage(
        &self,
        instance_id: Uuid,
        transactions: i64,
        avg_response_time: f64,
    ) -> Result<Option<ServiceInstance>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE service_instances
            SET avg_response_time = CASE
                    WHEN transaction_count + ? > 0
                    THEN (avg_response_time * transaction_count + ? * ?) / (transaction_count + ?)
                    ELSE 0
                END,
                transaction_count = transaction_count + ?
            WHERE instance_id = ? AND {}
            RETURNING {}
            "#,
            NOT_ARCHIVED, INSTANCE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(transactions)
            .bind(avg_response_time)
            .bind(transactions)
            .bind(transactions)
            .bind(transactions)
            .bind(instance_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;

        let instance = match row {
            Some(row) => row_to_instance(&row)?,
            None => return Ok(None),
        };

        sqlx::query(
            r#"
            UPDATE services
            SET avg_response_time = CASE
                    WHEN transaction_count + ? > 0
                    THEN (avg_response_time * transaction_count + ? * ?) / (transaction_count + ?)
                    ELSE 0
                END,
                transaction_count = transaction_count + ?
            WHERE service_id = ?
            "#,
        )
        .bind(transactions)
        .bind(avg_response_time)
        .bind(transactions)
        .bind(transactions)
        .bind(transactions)
        .bind(instance.service_id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(instance))
    }

    /// Delete live rows whose history record already exists.
    pub async fn reconcile_orphaned_instances(&self) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            DELETE FROM service_instances
            WHERE instance_id IN (SELECT instance_id FROM service_instance_history)
            RETURNING instance_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let ids = rows
            .iter()
            .map(|row| decode_uuid(row, "instance_id"))
            .collect::<Result<Vec<_>, _>>()?;

        for id in &ids {
            info!("Completed pending removal of archived instance {}", id);
        }
        Ok(ids)
    }
}

/// Take the write lock on a live row and read it.
///
/// SQLite has no `SELECT ... FOR UPDATE`; the no-op update acquires the writer
/// lock before the row is read so a concurrent retirement cannot interleave.
pub(crate) async fn lock_instance(
    conn: &mut SqliteConnection,
    instance_id: Uuid,
) -> Result<Option<ServiceInstance>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE service_instances
        SET instance_id = instance_id
        WHERE instance_id = ?
        RETURNING {}
        "#,
        INSTANCE_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(instance_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_instance).transpose()
}

pub(crate) async fn delete_instance(
    conn: &mut SqliteConnection,
    instance_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM service_instances WHERE instance_id = ?")
        .bind(instance_id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

fn row_to_instance(row: &SqliteRow) -> Result<ServiceInstance, sqlx::Error> {
    let port: i64 = row.try_get("port")?;
    let port = u16::try_from(port).map_err(|e| sqlx::Error::ColumnDecode {
        index: "port".to_string(),
        source: Box::new(e),
    })?;

    let health: String = row.try_get("health_status")?;
    let health_status = health
        .parse::<HealthStatus>()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: "health_status".to_string(),
            source: e.into(),
        })?;

    Ok(ServiceInstance {
        service_id: decode_uuid(row, "service_id")?,
        instance_id: decode_uuid(row, "instance_id")?,
        version: row.try_get("version")?,
        host: row.try_get("host")?,
        port,
        url: row.try_get("url")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        api_spec: row.try_get("api_spec")?,
        health_status,
        transaction_count: row.try_get("transaction_count")?,
        avg_response_time: row.try_get("avg_response_time")?,
        created_at: row.try_get("created_at")?,
        last_checked: row.try_get("last_checked")?,
    })
}
