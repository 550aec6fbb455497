//! Configuration module
//!
//! Everything is read from the environment (optionally seeded from `.env`) once at
//! startup. The storage backend decision is made here and never revisited.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::models::{UploadPolicy, DEFAULT_ALLOWED_CONTENT_TYPES};
use crate::storage_types::{ObjectStoreProvider, StorageBackend};

const DEFAULT_PORT: u16 = 3000;
const MAX_UPLOAD_SIZE_MB: usize = 5;
const DEFAULT_S3_REGION: &str = "us-east-1";
const DEFAULT_AZURE_CONTAINER: &str = "bills";

/// Base configuration for the HTTP server
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// `compact` or `json`
    pub log_format: String,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub max_upload_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
}

/// Connection settings for the external object store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectStoreConfig {
    S3 {
        bucket: String,
        region: String,
        /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
        endpoint: Option<String>,
    },
    Azure {
        account: String,
        access_key: String,
        container: String,
        /// Explicit blob endpoint (Azurite or sovereign clouds)
        endpoint: Option<String>,
    },
}

impl ObjectStoreConfig {
    pub fn provider(&self) -> ObjectStoreProvider {
        match self {
            ObjectStoreConfig::S3 { .. } => ObjectStoreProvider::S3,
            ObjectStoreConfig::Azure { .. } => ObjectStoreProvider::Azure,
        }
    }
}

/// Why the storage backend ended up being what it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionSource {
    /// `STORAGE_BACKEND` was set.
    Explicit,
    /// Object store settings were found.
    CredentialsPresent,
    /// No object store settings; inline fallback.
    CredentialsAbsent,
}

impl Display for SelectionSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SelectionSource::Explicit => write!(f, "explicit"),
            SelectionSource::CredentialsPresent => write!(f, "credentials_present"),
            SelectionSource::CredentialsAbsent => write!(f, "credentials_absent"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackendSelection {
    pub backend: StorageBackend,
    pub source: SelectionSource,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub selection: BackendSelection,
    pub object_store: Option<ObjectStoreConfig>,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base: BaseConfig,
    pub upload: UploadConfig,
    pub storage: StorageConfig,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<AppConfig>);

impl Config {
    fn as_app(&self) -> &AppConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.as_app().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = AppConfig::from_lookup(&lookup)?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_app().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_app().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_app().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_app().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.as_app().base.log_format
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.as_app().upload.max_upload_size_bytes
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.as_app().upload.allowed_content_types
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(
            self.max_upload_size_bytes(),
            self.allowed_content_types().to_vec(),
        )
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_app().storage.selection.backend
    }

    pub fn backend_selection(&self) -> BackendSelection {
        self.as_app().storage.selection
    }

    pub fn object_store(&self) -> Option<&ObjectStoreConfig> {
        self.as_app().storage.object_store.as_ref()
    }
}

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

impl AppConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_name(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: var("PORT")
                .unwrap_or_else(|| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            log_format: var("LOG_FORMAT")
                .unwrap_or_else(|| "compact".to_string())
                .to_lowercase(),
        };

        let max_upload_size_mb = var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be a valid number"))?;
        let max_upload_size_bytes = max_upload_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large"))?;

        let upload = UploadConfig {
            max_upload_size_bytes,
            allowed_content_types: var("UPLOAD_ALLOWED_CONTENT_TYPES")
                .unwrap_or_else(|| DEFAULT_ALLOWED_CONTENT_TYPES.join(","))
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        let object_store = object_store_from_lookup(&var)?;
        let explicit_backend = var("STORAGE_BACKEND")
            .map(|s| s.parse::<StorageBackend>())
            .transpose()?;
        let selection = resolve_backend(explicit_backend, object_store.as_ref())?;

        Ok(AppConfig {
            base,
            upload,
            storage: StorageConfig {
                selection,
                // An inline backend never talks to the object store.
                object_store: match selection.backend {
                    StorageBackend::External => object_store,
                    StorageBackend::Inline => None,
                },
            },
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.upload.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.upload.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "UPLOAD_ALLOWED_CONTENT_TYPES must list at least one content type"
            ));
        }

        if !matches!(self.base.log_format.as_str(), "compact" | "json") {
            return Err(anyhow::anyhow!(
                "LOG_FORMAT must be 'compact' or 'json', got '{}'",
                self.base.log_format
            ));
        }

        if self.storage.selection.backend == StorageBackend::External
            && self.storage.object_store.is_none()
        {
            return Err(anyhow::anyhow!(
                "External storage selected but no object store is configured"
            ));
        }

        Ok(())
    }
}

/// Decide the storage backend once. An explicit choice wins; otherwise the
/// presence of object store settings decides.
pub fn resolve_backend(
    explicit: Option<StorageBackend>,
    object_store: Option<&ObjectStoreConfig>,
) -> Result<BackendSelection, anyhow::Error> {
    match (explicit, object_store) {
        (Some(StorageBackend::External), None) => Err(anyhow::anyhow!(
            "STORAGE_BACKEND=external requires S3_BUCKET or Azure storage credentials"
        )),
        (Some(backend), _) => Ok(BackendSelection {
            backend,
            source: SelectionSource::Explicit,
        }),
        (None, Some(_)) => Ok(BackendSelection {
            backend: StorageBackend::External,
            source: SelectionSource::CredentialsPresent,
        }),
        (None, None) => Ok(BackendSelection {
            backend: StorageBackend::Inline,
            source: SelectionSource::CredentialsAbsent,
        }),
    }
}

fn object_store_from_lookup<F>(var: &F) -> Result<Option<ObjectStoreConfig>, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
{
    let azure = azure_from_lookup(var);
    let s3 = var("S3_BUCKET").map(|bucket| ObjectStoreConfig::S3 {
        bucket,
        region: var("S3_REGION")
            .or_else(|| var("AWS_REGION"))
            .unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
        endpoint: var("S3_ENDPOINT"),
    });

    let provider = var("OBJECT_STORE_PROVIDER")
        .map(|s| s.parse::<ObjectStoreProvider>())
        .transpose()?;

    Ok(match provider {
        Some(ObjectStoreProvider::S3) => s3,
        Some(ObjectStoreProvider::Azure) => azure,
        None => azure.or(s3),
    })
}

fn azure_from_lookup<F>(var: &F) -> Option<ObjectStoreConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let container =
        var("AZURE_STORAGE_CONTAINER_NAME").unwrap_or_else(|| DEFAULT_AZURE_CONTAINER.to_string());

    if let Some(conn) = var("AZURE_STORAGE_CONNECTION_STRING") {
        let parsed = AzureConnectionString::parse(&conn);
        if let (Some(account), Some(access_key)) = (parsed.account_name, parsed.account_key) {
            return Some(ObjectStoreConfig::Azure {
                account,
                access_key,
                container,
                endpoint: parsed.blob_endpoint,
            });
        }
    }

    match (
        var("AZURE_STORAGE_ACCOUNT_NAME"),
        var("AZURE_STORAGE_ACCOUNT_KEY"),
    ) {
        (Some(account), Some(access_key)) => Some(ObjectStoreConfig::Azure {
            account,
            access_key,
            container,
            endpoint: var("AZURE_STORAGE_BLOB_ENDPOINT"),
        }),
        _ => None,
    }
}

/// The parts of an Azure storage connection string we care about.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AzureConnectionString {
    pub account_name: Option<String>,
    pub account_key: Option<String>,
    pub blob_endpoint: Option<String>,
}

impl AzureConnectionString {
    /// Parse `Key=Value;Key=Value` pairs. Keys are case-insensitive; values may
    /// themselves contain `=` (account keys are base64).
    pub fn parse(conn: &str) -> Self {
        let mut out = AzureConnectionString::default();
        for pair in conn.split(';') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            match key.trim().to_lowercase().as_str() {
                "accountname" => out.account_name = Some(value),
                "accountkey" => out.account_key = Some(value),
                "blobendpoint" => out.blob_endpoint = Some(value),
                _ => {}
            }
        }
        out
    }
}
