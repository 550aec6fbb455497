//! Key generation for object storage.
//!
//! Key format: `{owner_id}/{uuid}.{ext}`.

use std::path::Path;

use uuid::Uuid;

use crate::{StorageError, StorageResult};

const MAX_OWNER_LEN: usize = 128;
const MAX_EXTENSION_LEN: usize = 16;

/// Generate a fresh storage key for a file owned by `owner_id`.
///
/// Owner ids come from an unsigned token, so anything outside `[A-Za-z0-9_-]` is
/// replaced before it becomes a path segment.
pub fn generate_storage_key(owner_id: &str, filename: &str) -> StorageResult<String> {
    let owner = sanitize_owner(owner_id)?;
    let id = Uuid::new_v4();
    Ok(match file_extension(filename) {
        Some(ext) => format!("{}/{}.{}", owner, id, ext),
        None => format!("{}/{}", owner, id),
    })
}

pub fn sanitize_owner(owner_id: &str) -> StorageResult<String> {
    let sanitized: String = owner_id
        .trim()
        .chars()
        .take(MAX_OWNER_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if !sanitized.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(StorageError::InvalidKey(format!(
            "Owner id '{}' cannot be used as a key prefix",
            owner_id
        )));
    }
    Ok(sanitized)
}

/// Lowercased alphanumeric extension of `filename`, if it has one.
pub fn file_extension(filename: &str) -> Option<String> {
    let ext: String = Path::new(filename)
        .extension()?
        .to_string_lossy()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_EXTENSION_LEN)
        .collect::<String>()
        .to_ascii_lowercase();
    (!ext.is_empty()).then_some(ext)
}
