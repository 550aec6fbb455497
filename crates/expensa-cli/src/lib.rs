//! Helpers shared by the `expensa` command-line client.

use std::path::Path;

use anyhow::Context;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Content type sent for a local file, by extension.
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Thin client for the bill upload endpoint.
pub struct UploadClient {
    http: reqwest::Client,
    base_url: String,
}

impl UploadClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn upload_url(&self) -> String {
        format!("{}/api/upload/bill", self.base_url)
    }

    /// Send `file` as the `bill` part, with any extra scalar fields.
    pub async fn upload_bill(
        &self,
        token: &str,
        file: &Path,
        fields: &[(String, String)],
    ) -> anyhow::Result<serde_json::Value> {
        let data = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let filename = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("bill")
            .to_string();

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename)
            .mime_str(guess_content_type(file))?;
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in fields {
            form = form.text(name.clone(), value.clone());
        }
        let form = form.part("bill", part);

        tracing::debug!(url = %self.upload_url(), file = %file.display(), "Uploading bill");
        let response = self
            .http
            .post(self.upload_url())
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .context("Upload request failed")?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse response body")?;
        if !status.is_success() {
            anyhow::bail!("Upload rejected ({}): {}", status, body);
        }
        Ok(body)
    }
}

/// Parse `key=value` pairs given on the command line.
pub fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(k, _)| !k.trim().is_empty())
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

/// Milliseconds left before a token issued at `issued_at_ms` expires.
pub fn expires_in_ms(issued_at_ms: u64, ttl_ms: u64, now_ms: u64) -> u64 {
    issued_at_ms.saturating_add(ttl_ms).saturating_sub(now_ms)
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
