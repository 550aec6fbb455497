use expensa_core::UploadPolicy;

use crate::multipart::MultipartPart;

/// Policy violations for an uploaded file
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },
}

/// Normalize a MIME type for comparison: parameters stripped, lowercased
/// (e.g. "Image/JPEG; charset=utf-8" -> "image/jpeg").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

/// Applies an [`UploadPolicy`] to a decoded file part.
///
/// Only the declared content type is checked; the bytes are never sniffed.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    policy: UploadPolicy,
}

impl UploadValidator {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.policy.max_bytes {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.policy.max_bytes,
            });
        }
        Ok(())
    }

    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = normalize_mime_type(content_type);
        if !self
            .policy
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.policy.allowed_content_types.clone(),
            });
        }
        Ok(())
    }

    /// Size first, then type.
    pub fn validate(&self, file: &MultipartPart) -> Result<(), ValidationError> {
        self.validate_file_size(file.size())?;
        self.validate_content_type(&file.content_type)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn test_validator() -> UploadValidator {
        UploadValidator::new(UploadPolicy::default())
    }

    fn file(content_type: &str, size: usize) -> MultipartPart {
        MultipartPart {
            field_name: "bill".to_string(),
            filename: Some("receipt".to_string()),
            content_type: content_type.to_string(),
            payload: Bytes::from(vec![0u8; size]),
        }
    }

    #[test]
    fn test_size_at_limit_accepted() {
        let validator = test_validator();
        assert!(validator.validate(&file("image/png", 5 * 1024 * 1024)).is_ok());
    }

    #[test]
    fn test_size_over_limit_rejected() {
        let validator = test_validator();
        assert_eq!(
            validator.validate(&file("image/png", 5 * 1024 * 1024 + 1)),
            Err(ValidationError::FileTooLarge {
                size: 5 * 1024 * 1024 + 1,
                max: 5 * 1024 * 1024,
            })
        );
    }

    #[test]
    fn test_empty_file_accepted() {
        assert!(test_validator().validate(&file("application/pdf", 0)).is_ok());
    }

    #[test]
    fn test_content_types() {
        let validator = test_validator();
        assert!(validator.validate_content_type("application/pdf").is_ok());
        assert!(validator.validate_content_type("image/jpg").is_ok());
        assert!(validator.validate_content_type("IMAGE/JPEG").is_ok());
        assert!(validator
            .validate_content_type("image/png; charset=binary")
            .is_ok());
        assert!(matches!(
            validator.validate_content_type("application/zip"),
            Err(ValidationError::InvalidContentType { .. })
        ));
        assert!(validator.validate_content_type("image/gif").is_err());
    }

    #[test]
    fn test_size_checked_before_type() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate(&file("application/zip", 6 * 1024 * 1024)),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_normalize_mime_type() {
        assert_eq!(normalize_mime_type("Image/JPEG; q=1"), "image/jpeg");
        assert_eq!(normalize_mime_type(""), "");
    }
}
