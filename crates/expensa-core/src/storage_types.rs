use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Where uploaded bills end up.
///
/// Chosen once at startup and reported back to clients in the `storage`
/// field of every successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Remote object store; references are public object URLs.
    External,
    /// No object store; references are `data:` URIs carrying the bytes.
    Inline,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "external" => Ok(StorageBackend::External),
            "inline" => Ok(StorageBackend::Inline),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::External => write!(f, "external"),
            StorageBackend::Inline => write!(f, "inline"),
        }
    }
}

/// Object store flavour behind the external backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectStoreProvider {
    S3,
    Azure,
}

impl FromStr for ObjectStoreProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s3" => Ok(ObjectStoreProvider::S3),
            "azure" => Ok(ObjectStoreProvider::Azure),
            _ => Err(anyhow::anyhow!("Invalid object store provider: {}", s)),
        }
    }
}

impl Display for ObjectStoreProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ObjectStoreProvider::S3 => write!(f, "s3"),
            ObjectStoreProvider::Azure => write!(f, "azure"),
        }
    }
}
