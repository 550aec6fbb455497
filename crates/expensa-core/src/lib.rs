//! Expensa Core Library
//!
//! Domain models, error taxonomy, configuration and the bearer token codec
//! shared by the storage, processing and API crates.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod token;

// Re-export commonly used types
pub use config::{BackendSelection, Config, ObjectStoreConfig, SelectionSource};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{IdentityClaim, StoredFileReference, UploadPolicy};
pub use storage_types::{ObjectStoreProvider, StorageBackend};
pub use token::{TokenCodec, TokenRejection};
