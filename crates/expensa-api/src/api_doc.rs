//! OpenAPI documentation, served as JSON at `crate::constants::OPENAPI_PATH`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use expensa_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Expense Tracker API",
        version = "0.1.0",
        description = "Bill upload for the expense tracker. Bills are validated and stored in an object store when one is configured, or returned inline as a data URI otherwise. Requests carry `Authorization: Bearer <token>`; the token carries expiry but no integrity protection. Returned object-store URLs are plain public URLs: the S3 bucket must allow anonymous reads, and the Azure container must have its public access level set to `blob`."
    ),
    paths(
        handlers::info::service_info,
        handlers::info::health_check,
        handlers::bill_upload::upload_bill,
    ),
    components(
        schemas(
            models::IdentityClaim,
            models::StoredFileReference,
            handlers::bill_upload::UploadResponse,
            handlers::info::HealthResponse,
            handlers::info::ServiceInfo,
            // Error
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "upload", description = "Bill upload"),
        (name = "health", description = "Service status")
    )
)]
pub struct ApiDoc;
