// Health monitoring endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::info;
use uuid::Uuid;

use super::common::{api_error, ApiResponse, ApiResult};
use crate::database::ServiceInstance;
use crate::errors::with_deadline;
use crate::web::{
    AppState, HealthUpdateRequest, InstanceHealthCheck, ServiceHealthCheck, ServiceHealthUpdate,
};

/// Record an externally observed health status for one instance
pub async fn update_instance_health(
    Path(instance_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<HealthUpdateRequest>,
) -> ApiResult<ServiceInstance> {
    let status = request
        .validate()
        .map_err(|e| api_error("update instance health", e))?;

    with_deadline(
        "update_instance_health",
        state.config.request_timeout(),
        state.health_monitor.update_health(instance_id, status),
    )
    .await
    .map(|instance| Json(ApiResponse::success(instance)))
    .map_err(|e| api_error("update instance health", e))
}

/// Probe one instance now and record the result
pub async fn check_instance_health(
    Path(instance_id): Path<Uuid>,
    State(state): State<AppState>,
) -> ApiResult<InstanceHealthCheck> {
    info!("Manual health check requested for instance {}", instance_id);
    with_deadline(
        "check_instance_health",
        state.config.request_timeout(),
        state.health_monitor.perform_health_check(instance_id),
    )
    .await
    .map(|status| {
        Json(ApiResponse::success(InstanceHealthCheck {
            instance_id,
            status,
        }))
    })
    .map_err(|e| api_error("check instance health", e))
}

/// Apply one status to every live instance of a service
pub async fn update_service_health(
    Path(service_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<HealthUpdateRequest>,
) -> ApiResult<ServiceHealthUpdate> {
    let status = request
        .validate()
        .map_err(|e| api_error("update service health", e))?;

    with_deadline(
        "update_service_health",
        state.config.request_timeout(),
        state.health_monitor.update_service_health(service_id, status),
    )
    .await
    .map(|instances_updated| {
        Json(ApiResponse::success(ServiceHealthUpdate {
            service_id,
            status,
            instances_updated,
        }))
    })
    .map_err(|e| api_error("update service health", e))
}

/// Probe every live instance of a service and report the aggregate
pub async fn check_service_health(
    Path(service_id): Path<Uuid>,
    State(state): State<AppState>,
) -> ApiResult<ServiceHealthCheck> {
    info!("Manual health check requested for service {}", service_id);
    with_deadline(
        "check_service_health",
        state.config.request_timeout(),
        state.health_monitor.check_service(service_id),
    )
    .await
    .map(|status| Json(ApiResponse::success(ServiceHealthCheck { service_id, status })))
    .map_err(|e| api_error("check service health", e))
}
