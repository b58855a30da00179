//! Remote web-service storage backend.
//!
//! Pushes archives to the destination installation over HTTP with a bearer
//! token. The destination owns the archive afterwards, so this backend can
//! never pull, delete, or check presence.

use crate::storage::{
    domain::{ArchiveFilename, LocalArtifact, StorageCapabilities, StorageCapability},
    ports::{LastErrorSlot, StorageBackend, StorageError, StorageResult},
};
use async_trait::async_trait;
use reqwest::{Body, Client, StatusCode, Url, header};
use std::io;
use std::time::Duration;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Push-only backend uploading archives to a destination web service.
#[derive(Debug)]
pub struct WebServiceStorage {
    client: Client,
    endpoint: Url,
    token: String,
    last_error: LastErrorSlot,
}

impl WebServiceStorage {
    /// Creates a backend for the given upload endpoint and token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotConfigured`] when the URL is invalid or the
    /// token is blank, and [`StorageError::Transport`] when the HTTP client
    /// cannot be constructed.
    pub fn new(endpoint: &str, token: impl Into<String>) -> StorageResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|err| {
            StorageError::NotConfigured(format!(
                "invalid destination web service URL '{endpoint}': {err}"
            ))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(StorageError::NotConfigured(format!(
                "destination web service URL '{endpoint}' must use http or https"
            )));
        }
        let token = token.into();
        if token.trim().is_empty() {
            return Err(StorageError::NotConfigured(
                "web service token has not been configured".to_owned(),
            ));
        }

        let client = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(StorageError::transport)?;

        Ok(Self {
            client,
            endpoint,
            token,
            last_error: LastErrorSlot::new(),
        })
    }

    /// Returns the upload endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn unsupported<T>(&self, operation: StorageCapability) -> StorageResult<T> {
        self.last_error.track(Err(StorageError::Unsupported {
            backend: self.name(),
            operation,
        }))
    }

    async fn upload(&self, filename: &ArchiveFilename, source: &LocalArtifact) -> StorageResult<()> {
        let file = tokio::fs::File::open(source.path().as_std_path())
            .await
            .map_err(|err| StorageError::from_io(filename, err))?;
        let length = file
            .metadata()
            .await
            .map_err(|err| StorageError::from_io(filename, err))?
            .len();

        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("filename", filename.as_str())])
            .bearer_auth(&self.token)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(header::CONTENT_LENGTH, length)
            .body(Body::from(file))
            .send()
            .await
            .map_err(StorageError::transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(StorageError::PermissionDenied {
                filename: filename.clone(),
                reason: format!("web service rejected token ({status}): {body}"),
            });
        }
        Err(StorageError::transport(io::Error::other(format!(
            "web service rejected archive ({status}): {body}"
        ))))
    }
}

#[async_trait]
impl StorageBackend for WebServiceStorage {
    fn name(&self) -> &'static str {
        "web_service"
    }

    fn capabilities(&self) -> StorageCapabilities {
        StorageCapabilities::push_only()
    }

    async fn pull(&self, _filename: &ArchiveFilename) -> StorageResult<LocalArtifact> {
        self.unsupported(StorageCapability::Pull)
    }

    async fn push(&self, filename: &ArchiveFilename, source: &LocalArtifact) -> StorageResult<()> {
        let result = self.upload(filename, source).await;
        self.last_error.track(result)
    }

    async fn delete(&self, _filename: &ArchiveFilename) -> StorageResult<()> {
        self.unsupported(StorageCapability::Delete)
    }

    async fn exists(&self, _filename: &ArchiveFilename) -> StorageResult<bool> {
        self.unsupported(StorageCapability::Exists)
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.get()
    }

    fn clear_error(&self) {
        self.last_error.clear();
    }
}
