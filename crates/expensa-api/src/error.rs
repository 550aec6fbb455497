//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Domain errors from the
//! processing and storage crates convert into [`HttpAppError`] so every rejection
//! renders the same body shape and is logged at the level its metadata asks for.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use expensa_core::models::{content_types_label, size_label};
use expensa_core::{AppError, ErrorMetadata, LogLevel};
use expensa_processing::{MultipartError, ValidationError};
use expensa_storage::StorageError;
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::upload::UploadRejection;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rule: IntoResponse and AppError both live in other crates)
///
/// `details` and `error_type` are left out of the body unless `expose_details`
/// is set; handlers set it from [`crate::state::AppState::expose_error_details`].
#[derive(Debug)]
pub struct HttpAppError {
    pub error: AppError,
    pub expose_details: bool,
}

impl HttpAppError {
    pub fn new(error: AppError) -> Self {
        Self {
            error,
            expose_details: false,
        }
    }

    pub fn with_details(mut self, expose: bool) -> Self {
        self.expose_details = expose;
        self
    }
}

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError::new(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError::new(AppError::from(err))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

impl ErrorResponse {
    fn from_app_error(app_error: &AppError, with_details: bool) -> Self {
        Self {
            error: app_error.client_message(),
            details: with_details.then(|| app_error.detailed_message()),
            error_type: with_details.then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.error;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Never for sensitive errors, whatever the deployment.
        let with_details = self.expose_details && !app_error.is_sensitive();
        let body = ErrorResponse::from_app_error(app_error, with_details);

        (status, Json(body)).into_response()
    }
}

// Convert domain errors to AppError / HttpAppError

/// Maps a pipeline error from one of the domain crates onto [`AppError`].
pub trait IntoAppError {
    fn into_app_error(self) -> AppError;
}

impl IntoAppError for StorageError {
    fn into_app_error(self) -> AppError {
        match self {
            // Any failure while storing is an upload failure for the client.
            StorageError::UploadFailed(msg) | StorageError::InvalidKey(msg) => {
                AppError::BackendFailure(msg)
            }
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        }
    }
}

impl IntoAppError for ValidationError {
    fn into_app_error(self) -> AppError {
        match self {
            ValidationError::FileTooLarge { max, .. } => {
                AppError::PayloadTooLarge(format!("File size exceeds {} limit", size_label(max)))
            }
            ValidationError::InvalidContentType { allowed, .. } => {
                AppError::UnsupportedMediaType(format!(
                    "Invalid file type. Only {} are allowed",
                    content_types_label(&allowed)
                ))
            }
        }
    }
}

impl IntoAppError for MultipartError {
    fn into_app_error(self) -> AppError {
        AppError::MalformedUpload(self.to_string())
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError::new(err.into_app_error())
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        HttpAppError::new(err.into_app_error())
    }
}

impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        HttpAppError::new(err.into_app_error())
    }
}

impl From<UploadRejection> for HttpAppError {
    fn from(rejection: UploadRejection) -> Self {
        HttpAppError::new(rejection.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: HttpAppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_from_storage_error_upload_failed() {
        let err: HttpAppError = StorageError::UploadFailed("503 SlowDown".to_string()).into();
        match err.error {
            AppError::BackendFailure(msg) => assert_eq!(msg, "503 SlowDown"),
            _ => panic!("Expected BackendFailure variant"),
        }
    }

    #[test]
    fn test_from_storage_error_invalid_key_is_upload_failure() {
        let err: HttpAppError = StorageError::InvalidKey("bad owner".to_string()).into();
        assert!(matches!(err.error, AppError::BackendFailure(_)));
        assert_eq!(err.error.http_status_code(), 500);
        assert_eq!(err.error.client_message(), "Failed to upload file");
    }

    #[test]
    fn test_from_validation_error_file_too_large() {
        let err: HttpAppError = ValidationError::FileTooLarge {
            size: 5 * 1024 * 1024 + 1,
            max: 5 * 1024 * 1024,
        }
        .into();
        match err.error {
            AppError::PayloadTooLarge(msg) => assert_eq!(msg, "File size exceeds 5MB limit"),
            _ => panic!("Expected PayloadTooLarge variant"),
        }
    }

    #[test]
    fn test_from_validation_error_invalid_content_type() {
        let err: HttpAppError = ValidationError::InvalidContentType {
            content_type: "application/zip".to_string(),
            allowed: vec![
                "image/jpeg".to_string(),
                "image/jpg".to_string(),
                "image/png".to_string(),
                "application/pdf".to_string(),
            ],
        }
        .into();
        match err.error {
            AppError::UnsupportedMediaType(msg) => assert_eq!(
                msg,
                "Invalid file type. Only JPG, PNG, and PDF are allowed"
            ),
            _ => panic!("Expected UnsupportedMediaType variant"),
        }
    }

    #[test]
    fn test_from_multipart_error() {
        let err: HttpAppError = MultipartError::MissingBoundary.into();
        assert_eq!(err.error.client_message(), "Invalid file upload");
        assert_eq!(err.error.http_status_code(), 400);
        assert!(!err.expose_details);
    }

    #[test]
    fn test_from_upload_rejection_keeps_error() {
        use crate::services::upload::UploadStage;

        let rejection =
            UploadRejection::new(UploadStage::AwaitingAuth, AppError::Unauthorized("no token".into()));
        let err: HttpAppError = rejection.into();
        assert_eq!(err.error.http_status_code(), 401);
    }

    #[tokio::test]
    async fn test_malformed_upload_never_carries_details() {
        let err = HttpAppError::from(MultipartError::MissingBoundary).with_details(true);
        let (status, json) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid file upload");
        assert_eq!(json["code"], "INVALID_UPLOAD");
        assert!(json.get("details").is_none());
        assert!(json.get("error_type").is_none());

        let (_, json) = render(HttpAppError::new(AppError::MissingFile).with_details(true)).await;
        assert_eq!(json["error"], "No file uploaded");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_sensitive_error_body_has_no_details() {
        let err = HttpAppError::new(AppError::BackendFailure("secret bucket name".to_string()))
            .with_details(true);
        let (status, json) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Failed to upload file");
        assert_eq!(json["code"], "UPLOAD_FAILED");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_details_follow_expose_flag() {
        let err = || HttpAppError::new(AppError::Unauthorized("token expired".to_string()));

        let (_, json) = render(err()).await;
        assert!(json.get("details").is_none());

        let (status, json) = render(err().with_details(true)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error_type"], "Unauthorized");
        assert!(json["details"].as_str().unwrap().contains("token expired"));
    }

    /// Serialized ErrorResponse has "error", "code", "recoverable", and optionally
    /// "details" / "error_type" / "suggested_action".
    #[test]
    fn test_error_response_shape() {
        let body = ErrorResponse::from_app_error(&AppError::MissingFile, false);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "No file uploaded");
        assert_eq!(json["code"], "NO_FILE_UPLOADED");
        assert_eq!(json["recoverable"], false);
        assert_eq!(json["suggested_action"], "Attach a file part to the form");
        assert!(json.get("details").is_none());
        assert!(json.get("error_type").is_none());
    }
}
