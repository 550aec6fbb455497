use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] =
    &["image/jpeg", "image/jpg", "image/png", "application/pdf"];

/// Size and type limits applied to an uploaded bill before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    /// Lowercase MIME types without parameters.
    pub allowed_content_types: Vec<String>,
}

impl UploadPolicy {
    pub fn new(max_bytes: usize, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_bytes,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.trim().to_lowercase())
                .filter(|ct| !ct.is_empty())
                .collect(),
        }
    }

    /// Human readable size limit, e.g. `5MB`.
    pub fn max_size_label(&self) -> String {
        size_label(self.max_bytes)
    }

    /// Short list of accepted formats, e.g. `JPG, PNG, and PDF`.
    pub fn allowed_label(&self) -> String {
        content_types_label(&self.allowed_content_types)
    }
}

pub fn size_label(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes > 0 && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

pub fn content_types_label(content_types: &[String]) -> String {
    let mut labels: Vec<String> = Vec::new();
    for ct in content_types {
        let label = match ct.as_str() {
            "image/jpeg" | "image/jpg" => "JPG".to_string(),
            other => other.rsplit('/').next().unwrap_or(other).to_uppercase(),
        };
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    match labels.len() {
        0 => "no file types".to_string(),
        1 => labels.remove(0),
        2 => format!("{} and {}", labels[0], labels[1]),
        n => format!("{}, and {}", labels[..n - 1].join(", "), labels[n - 1]),
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_UPLOAD_BYTES,
            DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

/// Handle to a stored bill. Either a public object URL or a `data:` URI;
/// both can be rendered directly without another lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredFileReference {
    pub url: String,
}

impl StoredFileReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn is_inline(&self) -> bool {
        self.url.starts_with("data:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = UploadPolicy::default();
        assert_eq!(policy.max_bytes, 5 * 1024 * 1024);
        assert_eq!(policy.max_size_label(), "5MB");
        assert!(policy
            .allowed_content_types
            .contains(&"application/pdf".to_string()));
        assert_eq!(policy.allowed_label(), "JPG, PNG, and PDF");
    }

    #[test]
    fn test_policy_normalizes_types() {
        let policy = UploadPolicy::new(10, vec![" Image/PNG ".to_string(), "".to_string()]);
        assert_eq!(policy.allowed_content_types, vec!["image/png".to_string()]);
        assert_eq!(policy.max_size_label(), "10 bytes");
        assert_eq!(policy.allowed_label(), "PNG");
    }

    #[test]
    fn test_reference_kind() {
        assert!(StoredFileReference::new("data:image/png;base64,AA==").is_inline());
        assert!(!StoredFileReference::new("https://bills.s3.us-east-1.amazonaws.com/u/x.png").is_inline());
    }
}
