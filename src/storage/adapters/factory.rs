//! Construction of the configured storage backend.

use super::{SharedDiskStorage, WebServiceStorage};
use crate::config::StorageSettings;
use crate::storage::ports::{StorageBackend, StorageResult};
use std::sync::Arc;

/// Builds the backend selected by the storage settings.
///
/// Returns `Ok(None)` when no backend has been selected; services treat that
/// as "storage not configured".
///
/// # Errors
///
/// Returns the backend constructor error when the selected backend cannot be
/// opened.
pub fn storage_from_settings(
    settings: Option<&StorageSettings>,
) -> StorageResult<Option<Arc<dyn StorageBackend>>> {
    let Some(selected) = settings else {
        return Ok(None);
    };

    let backend: Arc<dyn StorageBackend> = match selected {
        StorageSettings::SharedDisk {
            save_to,
            restore_from,
        } => Arc::new(SharedDiskStorage::open(save_to, restore_from)?),
        StorageSettings::WebService { url, token } => {
            Arc::new(WebServiceStorage::new(url, token.clone())?)
        }
    };
    tracing::debug!(backend = backend.name(), "storage backend selected");
    Ok(Some(backend))
}
