// Common types and utilities for API handlers

use axum::{http::StatusCode, response::Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::errors::DirectoryError;

pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

// Helper type for API responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            retryable: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: String, retryable: bool) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            retryable: Some(retryable),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

pub fn status_for(error: &DirectoryError) -> StatusCode {
    match error {
        DirectoryError::Validation(_) => StatusCode::BAD_REQUEST,
        DirectoryError::NotFound { .. } => StatusCode::NOT_FOUND,
        DirectoryError::Conflict(_) => StatusCode::CONFLICT,
        DirectoryError::OrphanPending { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DirectoryError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        DirectoryError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}

/// Log `error` and turn it into the JSON error envelope.
pub fn api_error(operation: &str, error: DirectoryError) -> ApiError {
    let status = status_for(&error);
    if status.is_server_error() {
        error!("Failed to {}: {}", operation, error);
    } else {
        warn!("Rejected {}: {}", operation, error);
    }
    (
        status,
        Json(ApiResponse::error(error.to_string(), error.is_retryable())),
    )
}
