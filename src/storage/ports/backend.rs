//! Storage backend port for archive transfer.

use crate::storage::domain::{
    ArchiveFilename, LocalArtifact, StorageCapabilities, StorageCapability,
};
use async_trait::async_trait;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Result type for storage backend operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Archive transfer contract.
///
/// Callers must check [`StorageBackend::ready_for_pull`] or
/// [`StorageBackend::ready_for_push`] before invoking the matching
/// operation. Every backend also records the detail of its most recent
/// failure so callers can log it in full and then clear it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Returns a short backend name for logs and reports.
    fn name(&self) -> &'static str;

    /// Returns the operations this backend supports.
    fn capabilities(&self) -> StorageCapabilities;

    /// Returns whether the backend can currently serve pulls.
    fn ready_for_pull(&self) -> bool {
        self.capabilities().supports(StorageCapability::Pull)
    }

    /// Returns whether the backend can currently accept pushes.
    fn ready_for_push(&self) -> bool {
        self.capabilities().supports(StorageCapability::Push)
    }

    /// Fetches an archive into a local artifact.
    ///
    /// The artifact never becomes visible under its final name until the
    /// copy is complete.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`], [`StorageError::PermissionDenied`]
    /// or [`StorageError::Transport`] when the archive cannot be fetched.
    async fn pull(&self, filename: &ArchiveFilename) -> StorageResult<LocalArtifact>;

    /// Uploads a completed archive. Re-pushing the same filename with the
    /// same content is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the upload fails.
    async fn push(&self, filename: &ArchiveFilename, source: &LocalArtifact) -> StorageResult<()>;

    /// Removes an archive.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the archive cannot be removed. Callers
    /// treat this as non-fatal.
    async fn delete(&self, filename: &ArchiveFilename) -> StorageResult<()>;

    /// Returns whether the archive is currently present.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when presence cannot be determined.
    async fn exists(&self, filename: &ArchiveFilename) -> StorageResult<bool>;

    /// Returns the detail of the most recent failure, if any.
    fn last_error(&self) -> Option<String>;

    /// Clears the recorded failure detail.
    fn clear_error(&self);
}

/// Errors returned by storage backend implementations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The archive does not exist in the backend.
    #[error("archive not found: {0}")]
    NotFound(ArchiveFilename),

    /// The backend refused access to the archive.
    #[error("permission denied for archive {filename}: {reason}")]
    PermissionDenied {
        /// Archive name.
        filename: ArchiveFilename,
        /// Reason string.
        reason: String,
    },

    /// The backend does not support the requested operation.
    #[error("storage backend '{backend}' does not support {operation}")]
    Unsupported {
        /// Backend name.
        backend: &'static str,
        /// Requested operation.
        operation: StorageCapability,
    },

    /// The backend is missing required settings.
    #[error("storage backend is not configured: {0}")]
    NotConfigured(String),

    /// Filesystem or network failure.
    #[error("storage transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl StorageError {
    /// Wraps a filesystem or network error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Maps an I/O error against a specific archive.
    #[must_use]
    pub fn from_io(filename: &ArchiveFilename, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(filename.clone()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                filename: filename.clone(),
                reason: err.to_string(),
            },
            _ => Self::transport(err),
        }
    }
}

/// Holder for the most recent failure detail of a backend.
#[derive(Debug, Default)]
pub struct LastErrorSlot {
    message: Mutex<Option<String>>,
}

impl LastErrorSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure detail, replacing any previous one.
    pub fn record(&self, message: impl Into<String>) {
        let mut slot = self.message.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(message.into());
    }

    /// Records the error of a failed result and passes the result through.
    ///
    /// # Errors
    ///
    /// Returns the original error unchanged.
    pub fn track<T>(&self, result: StorageResult<T>) -> StorageResult<T> {
        if let Err(err) = &result {
            self.record(err.to_string());
        }
        result
    }

    /// Returns the recorded failure detail.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clears the recorded failure detail.
    pub fn clear(&self) {
        let mut slot = self.message.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }
}
