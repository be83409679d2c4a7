//! Service row operations.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::records::{Service, ServiceDetails};
use super::{decode_uuid, Database};

const SERVICE_COLUMNS: &str = "service_id, name, description, owner_info, industry_category, \
     client_rating, transaction_count, avg_response_time, created_at, updated_at";

impl Database {
    pub async fn insert_service(&self, service: &Service) -> Result<(), sqlx::Error> {
        debug!("Inserting service {}", service.service_id);

        sqlx::query(
            r#"
            INSERT INTO services (
                service_id, name, description, owner_info, industry_category,
                client_rating, transaction_count, avg_response_time, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(service.service_id.to_string())
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.owner_info)
        .bind(&service.industry_category)
        .bind(service.client_rating)
        .bind(service.transaction_count)
        .bind(service.avg_response_time)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replace the mutable fields; `None` when the service does not exist.
    pub async fn update_service(
        &self,
        service_id: Uuid,
        details: &ServiceDetails,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Service>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE services
            SET name = ?, description = ?, owner_info = ?, industry_category = ?,
                client_rating = ?, updated_at = ?
            WHERE service_id = ?
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&details.name)
            .bind(&details.description)
            .bind(&details.owner_info)
            .bind(&details.industry_category)
            .bind(details.client_rating)
            .bind(updated_at)
            .bind(service_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_service).transpose()
    }

    pub async fn get_service(&self, service_id: Uuid) -> Result<Option<Service>, sqlx::Error> {
        let sql = format!("SELECT {} FROM services WHERE service_id = ?", SERVICE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(service_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_service).transpose()
    }

    pub async fn get_all_services(&self) -> Result<Vec<Service>, sqlx::Error> {
        let sql = format!("SELECT {} FROM services ORDER BY created_at, name", SERVICE_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_service).collect()
    }

    pub async fn delete_service(&self, service_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM services WHERE service_id = ?")
            .bind(service_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_service(row: &SqliteRow) -> Result<Service, sqlx::Error> {
    Ok(Service {
        service_id: decode_uuid(row, "service_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        owner_info: row.try_get("owner_info")?,
        industry_category: row.try_get("industry_category")?,
        client_rating: row.try_get("client_rating")?,
        transaction_count: row.try_get("transaction_count")?,
        avg_response_time: row.try_get("avg_response_time")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
