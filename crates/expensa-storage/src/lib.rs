//! Expensa Storage Library
//!
//! Storage routing for uploaded bills. Exactly one backend is active per process:
//!
//! - [`ObjectStoreStorage`]: writes to an S3-compatible bucket or an Azure Blob
//!   container and returns the object's public URL.
//! - [`InlineStorage`]: keeps nothing server-side and returns a `data:` URI.
//!
//! # Storage key format
//!
//! Object keys are owner-scoped: `{owner_id}/{uuid}.{ext}`, or `{owner_id}/{uuid}`
//! when the original filename has no extension. Key generation lives in the
//! `keys` module.

pub mod factory;
pub(crate) mod keys;
pub mod inline;
pub mod remote;
pub mod traits;

// Re-export commonly used types
pub use expensa_core::StorageBackend;
pub use factory::create_storage;
pub use inline::InlineStorage;
pub use remote::ObjectStoreStorage;
pub use traits::{Storage, StorageError, StorageResult};
