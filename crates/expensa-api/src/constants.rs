//! API constants

/// API base path prefix
pub const API_BASE: &str = "/api";

pub const UPLOAD_BILL_PATH: &str = "/api/upload/bill";

pub const OPENAPI_PATH: &str = "/api/openapi.json";

pub const SERVICE_NAME: &str = "Expense Tracker API";

pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";
