use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    Json,
};
use expensa_core::StorageBackend;
use serde::Serialize;
use utoipa::ToSchema;

use crate::constants::UPLOAD_SUCCESS_MESSAGE;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::upload::{InboundUpload, UploadOutcome};
use crate::state::AppState;

/// Reference to a stored bill, ready to be attached to an expense record.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    /// Public object URL, or a `data:` URI when stored inline
    pub url: String,
    pub filename: String,
    /// Payload size in bytes
    pub size: usize,
    #[schema(value_type = String, example = "external")]
    pub storage: StorageBackend,
}

impl From<UploadOutcome> for UploadResponse {
    fn from(outcome: UploadOutcome) -> Self {
        Self {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            url: outcome.reference.url,
            filename: outcome.filename,
            size: outcome.size,
            storage: outcome.storage,
        }
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Upload a bill
///
/// Accepts a `multipart/form-data` body with a file part (JPG, PNG or PDF, at most
/// the configured size) and returns a reference that can be stored on an expense.
/// Only the first file part is used.
#[utoipa::path(
    post,
    path = "/api/upload/bill",
    tag = "upload",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "Invalid upload, file too large or unsupported type", body = ErrorResponse),
        (status = 401, description = "Missing, malformed or expired token", body = ErrorResponse),
        (status = 500, description = "Storage backend failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "upload_bill"))]
pub async fn upload_bill(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let (parts, body) = request.into_parts();
    let content_length = header_str(&parts.headers, header::CONTENT_LENGTH)
        .and_then(|v| v.trim().parse::<u64>().ok());

    let upload = InboundUpload {
        authorization: header_str(&parts.headers, header::AUTHORIZATION),
        content_type: header_str(&parts.headers, header::CONTENT_TYPE),
        content_length,
        body: Body::into_data_stream(body),
    };

    let outcome = state
        .orchestrator
        .process(upload)
        .await
        .map_err(|rejection| {
            HttpAppError::from(rejection).with_details(state.expose_error_details)
        })?;

    Ok(Json(outcome.into()))
}
