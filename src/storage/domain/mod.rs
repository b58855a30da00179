//! Domain model for archive storage.

mod artifact;
mod capabilities;
mod error;
mod filename;

pub use artifact::LocalArtifact;
pub use capabilities::{StorageCapabilities, StorageCapability};
pub use error::StorageDomainError;
pub use filename::ArchiveFilename;

pub(crate) use artifact::ambient_dir_and_file;
