// Service registration endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use super::common::{api_error, ApiError, ApiResponse, ApiResult};
use crate::database::{HistoryRecord, Service, ServiceInstance};
use crate::errors::with_deadline;
use crate::web::{AppState, ServiceRequest};

/// Register a new service
pub async fn register_service(
    State(state): State<AppState>,
    Json(request): Json<ServiceRequest>,
) -> ApiResult<Service> {
    let details = request
        .validate()
        .map_err(|e| api_error("register service", e))?;

    let service = with_deadline(
        "register_service",
        state.config.request_timeout(),
        state.services.register(details),
    )
    .await
    .map_err(|e| api_error("register service", e))?;

    Ok(Json(ApiResponse::success(service)))
}

pub async fn list_services(State(state): State<AppState>) -> ApiResult<Vec<Service>> {
    with_deadline(
        "list_services",
        state.config.request_timeout(),
        state.services.list(),
    )
    .await
    .map(|services| Json(ApiResponse::success(services)))
    .map_err(|e| api_error("list services", e))
}

pub async fn get_service(
    Path(service_id): Path<Uuid>,
    State(state): State<AppState>,
) -> ApiResult<Service> {
    with_deadline(
        "get_service",
        state.config.request_timeout(),
        state.services.get(service_id),
    )
    .await
    .map(|service| Json(ApiResponse::success(service)))
    .map_err(|e| api_error("get service", e))
}

/// Replace the mutable fields of a service
pub async fn update_service(
    Path(service_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<ServiceRequest>,
) -> ApiResult<Service> {
    let details = request
        .validate()
        .map_err(|e| api_error("update service", e))?;

    with_deadline(
        "update_service",
        state.config.request_timeout(),
        state.services.update(service_id, details),
    )
    .await
    .map(|service| Json(ApiResponse::success(service)))
    .map_err(|e| api_error("update service", e))
}

/// Deregister a service. Rejected with 409 while it still has live instances.
pub async fn delete_service(
    Path(service_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    with_deadline(
        "delete_service",
        state.config.request_timeout(),
        state.services.delete(service_id),
    )
    .await
    .map_err(|e| api_error("delete service", e))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_service_instances(
    Path(service_id): Path<Uuid>,
    State(state): State<AppState>,
) -> ApiResult<Vec<ServiceInstance>> {
    let instances = state.instances.clone();
    let services = state.services.clone();
    with_deadline(
        "list_service_instances",
        state.config.request_timeout(),
        async move {
            services.get(service_id).await?;
            instances.list_for_service(service_id).await
        },
    )
    .await
    .map(|instances| Json(ApiResponse::success(instances)))
    .map_err(|e| api_error("list service instances", e))
}

pub async fn list_service_history(
    Path(service_id): Path<Uuid>,
    State(state): State<AppState>,
) -> ApiResult<Vec<HistoryRecord>> {
    with_deadline(
        "list_service_history",
        state.config.request_timeout(),
        state.archive.list_for_service(service_id),
    )
    .await
    .map(|records| Json(ApiResponse::success(records)))
    .map_err(|e| api_error("list service history", e))
}
