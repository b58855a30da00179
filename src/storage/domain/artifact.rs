//! Local artifact handles produced by pulls and course backups.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::{Dir, File};
use std::io;

/// A local file holding archive content, usable by the restore engine.
///
/// Handles returned by a pull are working copies; the authoritative
/// archive stays in the storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalArtifact {
    path: Utf8PathBuf,
}

impl LocalArtifact {
    /// Wraps a path to an existing local file.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the artifact path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Reads the full artifact content.
    ///
    /// This performs blocking I/O.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the file cannot be read.
    pub fn read(&self) -> io::Result<Vec<u8>> {
        let (dir, file_name) = ambient_dir_and_file(&self.path)?;
        dir.read(file_name)
    }

    /// Opens the artifact for streaming reads.
    ///
    /// This performs blocking I/O.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the file cannot be opened.
    pub fn open(&self) -> io::Result<File> {
        let (dir, file_name) = ambient_dir_and_file(&self.path)?;
        dir.open(file_name)
    }

    /// Deletes the artifact. Deleting an artifact that is already gone is
    /// not an error.
    ///
    /// This performs blocking I/O.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error for failures other than a missing
    /// file.
    pub fn delete(&self) -> io::Result<()> {
        let (dir, file_name) = ambient_dir_and_file(&self.path)?;
        match dir.remove_file(file_name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// Opens the parent directory of `path` with ambient authority and returns
/// it together with the final path component.
pub(crate) fn ambient_dir_and_file(path: &Utf8Path) -> io::Result<(Dir, String)> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path '{path}' has no file name"),
        )
    })?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name.to_owned()))
}
