//! In-memory storage backend for orchestration tests.

use crate::storage::{
    domain::{ArchiveFilename, LocalArtifact, StorageCapabilities, StorageCapability},
    ports::{LastErrorSlot, StorageBackend, StorageError, StorageResult},
};
use async_trait::async_trait;
use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, RwLock};
use tempfile::TempDir;

/// Thread-safe in-memory storage backend.
///
/// Pulled archives are materialized as real files in a private temporary
/// directory so downstream extraction can read them.
#[derive(Debug, Clone)]
pub struct InMemoryStorage {
    state: Arc<RwLock<InMemoryStorageState>>,
    last_error: Arc<LastErrorSlot>,
}

#[derive(Debug)]
struct InMemoryStorageState {
    archives: HashMap<ArchiveFilename, Vec<u8>>,
    capabilities: StorageCapabilities,
    pull_failure: Option<String>,
    push_failure: Option<String>,
    staging: Option<TempDir>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::with_capabilities(StorageCapabilities::all())
    }
}

impl InMemoryStorage {
    /// Creates an empty backend supporting every operation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty backend with the given capabilities.
    #[must_use]
    pub fn with_capabilities(capabilities: StorageCapabilities) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryStorageState {
                archives: HashMap::new(),
                capabilities,
                pull_failure: None,
                push_failure: None,
                staging: None,
            })),
            last_error: Arc::new(LastErrorSlot::new()),
        }
    }

    /// Stores an archive directly, bypassing [`StorageBackend::push`].
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn insert(&self, filename: ArchiveFilename, content: impl Into<Vec<u8>>) -> StorageResult<()> {
        let mut state = self.write_state()?;
        state.archives.insert(filename, content.into());
        Ok(())
    }

    /// Returns the stored content of an archive, if present.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn content(&self, filename: &ArchiveFilename) -> StorageResult<Option<Vec<u8>>> {
        let state = self.read_state()?;
        Ok(state.archives.get(filename).cloned())
    }

    /// Makes every subsequent pull fail with the given detail.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn fail_pulls_with(&self, detail: impl Into<String>) -> StorageResult<()> {
        let mut state = self.write_state()?;
        state.pull_failure = Some(detail.into());
        Ok(())
    }

    /// Makes every subsequent push fail with the given detail.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn fail_pushes_with(&self, detail: impl Into<String>) -> StorageResult<()> {
        let mut state = self.write_state()?;
        state.push_failure = Some(detail.into());
        Ok(())
    }

    fn read_state(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, InMemoryStorageState>> {
        self.state
            .read()
            .map_err(|err| StorageError::transport(io::Error::other(err.to_string())))
    }

    fn write_state(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, InMemoryStorageState>> {
        self.state
            .write()
            .map_err(|err| StorageError::transport(io::Error::other(err.to_string())))
    }

    fn require(&self, capability: StorageCapability) -> StorageResult<()> {
        if self.capabilities().supports(capability) {
            return Ok(());
        }
        Err(StorageError::Unsupported {
            backend: self.name(),
            operation: capability,
        })
    }

    fn materialize(&self, filename: &ArchiveFilename) -> StorageResult<LocalArtifact> {
        self.require(StorageCapability::Pull)?;
        let mut state = self.write_state()?;
        if let Some(detail) = &state.pull_failure {
            return Err(StorageError::transport(io::Error::other(detail.clone())));
        }
        let content = state
            .archives
            .get(filename)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(filename.clone()))?;

        if state.staging.is_none() {
            let staging = tempfile::Builder::new()
                .prefix("coursemigration-memory-")
                .tempdir()
                .map_err(StorageError::transport)?;
            state.staging = Some(staging);
        }
        let staging_root = state
            .staging
            .as_ref()
            .map(|staging| staging.path().to_path_buf())
            .ok_or_else(|| StorageError::NotConfigured("staging directory unavailable".to_owned()))?;
        let root = Utf8PathBuf::from_path_buf(staging_root).map_err(|path| {
            StorageError::NotConfigured(format!("staging directory {} is not valid UTF-8", path.display()))
        })?;

        let staging = Dir::open_ambient_dir(&root, ambient_authority())
            .map_err(StorageError::transport)?;
        staging
            .write(filename.as_str(), content)
            .map_err(|err| StorageError::from_io(filename, err))?;
        Ok(LocalArtifact::new(root.join(filename.as_str())))
    }

    fn store_pushed(&self, filename: &ArchiveFilename, source: &LocalArtifact) -> StorageResult<()> {
        self.require(StorageCapability::Push)?;
        let content = source.read().map_err(StorageError::transport)?;
        let mut state = self.write_state()?;
        if let Some(detail) = &state.push_failure {
            return Err(StorageError::transport(io::Error::other(detail.clone())));
        }
        state.archives.insert(filename.clone(), content);
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn capabilities(&self) -> StorageCapabilities {
        self.read_state()
            .map(|state| state.capabilities)
            .unwrap_or_else(|_| StorageCapabilities::none())
    }

    async fn pull(&self, filename: &ArchiveFilename) -> StorageResult<LocalArtifact> {
        self.last_error.track(self.materialize(filename))
    }

    async fn push(&self, filename: &ArchiveFilename, source: &LocalArtifact) -> StorageResult<()> {
        self.last_error.track(self.store_pushed(filename, source))
    }

    async fn delete(&self, filename: &ArchiveFilename) -> StorageResult<()> {
        let result = self.require(StorageCapability::Delete).and_then(|()| {
            let mut state = self.write_state()?;
            state
                .archives
                .remove(filename)
                .map(|_| ())
                .ok_or_else(|| StorageError::NotFound(filename.clone()))
        });
        self.last_error.track(result)
    }

    async fn exists(&self, filename: &ArchiveFilename) -> StorageResult<bool> {
        let result = self
            .require(StorageCapability::Exists)
            .and_then(|()| Ok(self.read_state()?.archives.contains_key(filename)));
        self.last_error.track(result)
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.get()
    }

    fn clear_error(&self) {
        self.last_error.clear();
    }
}
