//! History row operations.
//!
//! History rows are written once and never updated or deleted here.

use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;
use uuid::Uuid;

use super::records::HistoryRecord;
use super::{decode_uuid, Database};

const HISTORY_COLUMNS: &str =
    "history_id, service_id, instance_id, version, url, metrics, started_at, stopped_at";

impl Database {
    pub async fn get_history_for_service(
        &self,
        service_id: Uuid,
    ) -> Result<Vec<HistoryRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM service_instance_history WHERE service_id = ? ORDER BY stopped_at DESC",
            HISTORY_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(service_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_history).collect()
    }

    pub async fn get_history_for_instance(
        &self,
        instance_id: Uuid,
    ) -> Result<Vec<HistoryRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM service_instance_history WHERE instance_id = ? ORDER BY stopped_at DESC",
            HISTORY_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(instance_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_history).collect()
    }
}

/// Append `record`. Returns `false` when the instance is already archived.
pub(crate) async fn insert_history_record(
    conn: &mut SqliteConnection,
    record: &HistoryRecord,
) -> Result<bool, sqlx::Error> {
    debug!(
        "Archiving instance {} as history {}",
        record.instance_id, record.history_id
    );

    let metrics = serde_json::to_string(&record.metrics)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO service_instance_history (
            history_id, service_id, instance_id, version, url, metrics, started_at, stopped_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(instance_id) DO NOTHING
        "#,
    )
    .bind(record.history_id.to_string())
    .bind(record.service_id.to_string())
    .bind(record.instance_id.to_string())
    .bind(&record.version)
    .bind(&record.url)
    .bind(metrics)
    .bind(record.started_at)
    .bind(record.stopped_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn find_history_record(
    conn: &mut SqliteConnection,
    instance_id: Uuid,
) -> Result<Option<HistoryRecord>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM service_instance_history WHERE instance_id = ?",
        HISTORY_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(instance_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_history).transpose()
}

fn row_to_history(row: &SqliteRow) -> Result<HistoryRecord, sqlx::Error> {
    let raw_metrics: String = row.try_get("metrics")?;
    let metrics: Map<String, Value> =
        serde_json::from_str(&raw_metrics).map_err(|e| sqlx::Error::ColumnDecode {
            index: "metrics".to_string(),
            source: Box::new(e),
        })?;

    Ok(HistoryRecord {
        history_id: decode_uuid(row, "history_id")?,
        service_id: decode_uuid(row, "service_id")?,
        instance_id: decode_uuid(row, "instance_id")?,
        version: row.try_get("version")?,
        url: row.try_get("url")?,
        metrics,
        started_at: row.try_get("started_at")?,
        stopped_at: row.try_get("stopped_at")?,
    })
}
