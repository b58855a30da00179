//! Error types for storage domain validation.

use thiserror::Error;

/// Errors returned while constructing storage domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageDomainError {
    /// The archive filename is empty after trimming.
    #[error("archive filename must not be empty")]
    EmptyFilename,

    /// The archive filename contains a path separator or a relative
    /// path component.
    #[error("archive filename '{0}' must be a plain file name")]
    InvalidFilename(String),
}
