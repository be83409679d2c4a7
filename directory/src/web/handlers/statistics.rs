// Statistics endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};
use uuid::Uuid;

use super::common::{api_error, ApiResponse, ApiResult};
use crate::errors::with_deadline;
use crate::services::ServiceStatistics;
use crate::web::AppState;

/// Usage statistics across live and retired instances of a service
pub async fn get_service_statistics(
    Path(service_id): Path<Uuid>,
    State(state): State<AppState>,
) -> ApiResult<ServiceStatistics> {
    with_deadline(
        "get_service_statistics",
        state.config.request_timeout(),
        state.statistics.retrieve_statistics(service_id),
    )
    .await
    .map(|statistics| Json(ApiResponse::success(statistics)))
    .map_err(|e| api_error("retrieve service statistics", e))
}
