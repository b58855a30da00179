//! Shared-disk storage backend.
//!
//! Archives are written to a `save_to` directory and read from a
//! `restore_from` directory. Deployments usually point both at the same
//! shared mount, one side writing and the other side reading.

use crate::storage::{
    domain::{ArchiveFilename, LocalArtifact, StorageCapabilities},
    ports::{LastErrorSlot, StorageBackend, StorageError, StorageResult},
};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::{Dir, File};
use sha2::digest::Output;
use sha2::{Digest, Sha256};
use std::io;
use std::sync::Arc;
use tempfile::TempDir;

/// Backend reading and writing archives on a shared filesystem.
#[derive(Debug)]
pub struct SharedDiskStorage {
    disk: Arc<DiskHandles>,
    last_error: LastErrorSlot,
}

#[derive(Debug)]
struct DiskHandles {
    save_to: Dir,
    restore_from: Dir,
    restore_from_path: Utf8PathBuf,
    staging: Dir,
    staging_path: Utf8PathBuf,
    // Removes the staging directory when the backend is dropped.
    _staging_guard: TempDir,
}

impl SharedDiskStorage {
    /// Opens both configured directories and a private staging area for
    /// pulled copies.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotConfigured`] when a directory is blank or
    /// cannot be opened, and [`StorageError::Transport`] when the staging
    /// area cannot be created.
    pub fn open(save_to: &Utf8Path, restore_from: &Utf8Path) -> StorageResult<Self> {
        if save_to.as_str().trim().is_empty() || restore_from.as_str().trim().is_empty() {
            return Err(StorageError::NotConfigured(
                "shared disk directories have not been configured".to_owned(),
            ));
        }

        let save_to_dir = open_configured_dir(save_to, "save-to")?;
        let restore_from_dir = open_configured_dir(restore_from, "restore-from")?;

        let staging_guard = tempfile::Builder::new()
            .prefix("coursemigration-staging-")
            .tempdir()
            .map_err(StorageError::transport)?;
        let staging_path =
            Utf8PathBuf::from_path_buf(staging_guard.path().to_path_buf()).map_err(|path| {
                StorageError::NotConfigured(format!(
                    "staging directory {} is not valid UTF-8",
                    path.display()
                ))
            })?;
        let staging = Dir::open_ambient_dir(&staging_path, ambient_authority())
            .map_err(StorageError::transport)?;

        Ok(Self {
            disk: Arc::new(DiskHandles {
                save_to: save_to_dir,
                restore_from: restore_from_dir,
                restore_from_path: restore_from.to_owned(),
                staging,
                staging_path,
                _staging_guard: staging_guard,
            }),
            last_error: LastErrorSlot::new(),
        })
    }

    async fn run_blocking<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&DiskHandles) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let disk = Arc::clone(&self.disk);
        tokio::task::spawn_blocking(move || f(&disk))
            .await
            .map_err(StorageError::transport)?
    }
}

fn open_configured_dir(path: &Utf8Path, label: &str) -> StorageResult<Dir> {
    Dir::open_ambient_dir(path, ambient_authority()).map_err(|err| {
        StorageError::NotConfigured(format!("cannot open {label} directory '{path}': {err}"))
    })
}

/// Removes a file if present. Removing a missing file is a no-op, so
/// calling this twice for the same name succeeds both times.
fn remove_if_present(dir: &Dir, name: &str) -> io::Result<()> {
    match dir.remove_file(name) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// Hashes a file without holding its content in memory.
fn sha256_of(mut file: File) -> io::Result<Output<Sha256>> {
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize())
}

impl DiskHandles {
    fn stage_copy(&self, filename: &ArchiveFilename) -> StorageResult<LocalArtifact> {
        let io_error = |err: io::Error| StorageError::from_io(filename, err);
        remove_if_present(&self.staging, filename.as_str()).map_err(io_error)?;

        let partial = filename.partial_name();
        if let Err(err) = self
            .restore_from
            .copy(filename.as_str(), &self.staging, &partial)
        {
            if let Err(cleanup_err) = remove_if_present(&self.staging, &partial) {
                tracing::debug!(%filename, error = %cleanup_err, "failed to remove partial copy");
            }
            return Err(io_error(err));
        }

        self.staging
            .rename(&partial, &self.staging, filename.as_str())
            .map_err(io_error)?;
        Ok(LocalArtifact::new(self.staging_path.join(filename.as_str())))
    }

    fn write_archive(&self, filename: &ArchiveFilename, source: &LocalArtifact) -> StorageResult<()> {
        let io_error = |err: io::Error| StorageError::from_io(filename, err);
        let digest = source
            .open()
            .and_then(sha256_of)
            .map_err(StorageError::transport)?;

        match self.save_to.open(filename.as_str()).and_then(sha256_of) {
            Ok(existing) if existing == digest => {
                tracing::debug!(%filename, "archive already present with identical content");
                return Ok(());
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(io_error(err)),
        }

        let partial = filename.partial_name();
        if let Err(err) = self.copy_to_partial(source, &partial) {
            if let Err(cleanup_err) = remove_if_present(&self.save_to, &partial) {
                tracing::debug!(%filename, error = %cleanup_err, "failed to remove partial archive");
            }
            return Err(io_error(err));
        }
        self.save_to
            .rename(&partial, &self.save_to, filename.as_str())
            .map_err(io_error)
    }

    fn copy_to_partial(&self, source: &LocalArtifact, partial: &str) -> io::Result<()> {
        let mut reader = source.open()?;
        let mut target = self.save_to.create(partial)?;
        io::copy(&mut reader, &mut target)?;
        target.sync_all()
    }

    fn source_path(&self, filename: &ArchiveFilename) -> Utf8PathBuf {
        self.restore_from_path.join(filename.as_str())
    }
}

#[async_trait]
impl StorageBackend for SharedDiskStorage {
    fn name(&self) -> &'static str {
        "shared_disk"
    }

    fn capabilities(&self) -> StorageCapabilities {
        StorageCapabilities::all()
    }

    async fn pull(&self, filename: &ArchiveFilename) -> StorageResult<LocalArtifact> {
        let lookup = filename.clone();
        let result = self.run_blocking(move |disk| disk.stage_copy(&lookup)).await;
        if let Err(err) = &result {
            let detail = match err {
                StorageError::NotFound(_) | StorageError::PermissionDenied { .. } => format!(
                    "Cannot read file. Either the file does not exist or there is a permission problem. ({})",
                    self.disk.source_path(filename)
                ),
                other => other.to_string(),
            };
            self.last_error.record(detail);
        }
        result
    }

    async fn push(&self, filename: &ArchiveFilename, source: &LocalArtifact) -> StorageResult<()> {
        let target = filename.clone();
        let source = source.clone();
        let result = self
            .run_blocking(move |disk| disk.write_archive(&target, &source))
            .await;
        self.last_error.track(result)
    }

    async fn delete(&self, filename: &ArchiveFilename) -> StorageResult<()> {
        let target = filename.clone();
        let result = self
            .run_blocking(move |disk| {
                disk.restore_from
                    .remove_file(target.as_str())
                    .map_err(|err| StorageError::from_io(&target, err))
            })
            .await;
        self.last_error.track(result)
    }

    async fn exists(&self, filename: &ArchiveFilename) -> StorageResult<bool> {
        let target = filename.clone();
        let result = self
            .run_blocking(move |disk| match disk.restore_from.metadata(target.as_str()) {
                Ok(metadata) => Ok(metadata.is_file()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(err) => Err(StorageError::from_io(&target, err)),
            })
            .await;
        self.last_error.track(result)
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.get()
    }

    fn clear_error(&self) {
        self.last_error.clear();
    }
}
