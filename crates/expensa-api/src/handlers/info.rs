use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::constants::{OPENAPI_PATH, SERVICE_NAME, UPLOAD_BILL_PATH};
use crate::error::HttpAppError;
use crate::state::AppState;
use expensa_core::AppError;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    /// Active storage backend, `external` or `inline`
    pub storage: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub status: String,
    pub endpoints: Vec<String>,
}

/// Liveness check with the storage backend chosen at startup
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Server is running", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Server is running".to_string(),
        storage: state.storage_backend().to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "Service description", body = ServiceInfo))
)]
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        endpoints: vec![
            "GET /health".to_string(),
            format!("POST {}", UPLOAD_BILL_PATH),
            format!("GET {}", OPENAPI_PATH),
        ],
    })
}

pub async fn not_found(State(state): State<Arc<AppState>>) -> HttpAppError {
    HttpAppError::new(AppError::NotFound("Route not found".to_string()))
        .with_details(state.expose_error_details)
}
