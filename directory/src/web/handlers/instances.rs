// Service instance lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use super::common::{api_error, ApiError, ApiResponse, ApiResult};
use crate::database::ServiceInstance;
use crate::errors::with_deadline;
use crate::web::{AppState, CreateInstanceRequest, UsageRequest};

pub async fn create_service_instance(
    State(state): State<AppState>,
    Json(request): Json<CreateInstanceRequest>,
) -> ApiResult<ServiceInstance> {
    let new_instance = request
        .validate()
        .map_err(|e| api_error("create service instance", e))?;

    let instance = with_deadline(
        "create_service_instance",
        state.config.request_timeout(),
        state.instances.create(new_instance),
    )
    .await
    .map_err(|e| api_error("create service instance", e))?;

    Ok(Json(ApiResponse::success(instance)))
}

pub async fn get_service_instance(
    Path(instance_id): Path<Uuid>,
    State(state): State<AppState>,
) -> ApiResult<ServiceInstance> {
    with_deadline(
        "get_service_instance",
        state.config.request_timeout(),
        state.instances.get(instance_id),
    )
    .await
    .map(|instance| Json(ApiResponse::success(instance)))
    .map_err(|e| api_error("get service instance", e))
}

/// Retire an instance into the history archive. 204 on success.
pub async fn retire_service_instance(
    Path(instance_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    with_deadline(
        "retire_service_instance",
        state.config.request_timeout(),
        state.instances.retire(instance_id),
    )
    .await
    .map_err(|e| api_error("retire service instance", e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Fold a usage sample into the instance counters
pub async fn record_instance_usage(
    Path(instance_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<UsageRequest>,
) -> ApiResult<ServiceInstance> {
    let (transactions, avg_response_time_ms) = request
        .validate()
        .map_err(|e| api_error("record instance usage", e))?;

    with_deadline(
        "record_instance_usage",
        state.config.request_timeout(),
        state
            .instances
            .record_usage(instance_id, transactions, avg_response_time_ms),
    )
    .await
    .map(|instance| Json(ApiResponse::success(instance)))
    .map_err(|e| api_error("record instance usage", e))
}
