//! Archive file names used as the join key between migration records and
//! storage backends.

use super::StorageDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated name of an archive artifact.
///
/// The name is a single path component, so every backend can resolve it
/// against its own root without escaping it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArchiveFilename(String);

impl ArchiveFilename {
    /// Creates a validated archive filename.
    ///
    /// # Errors
    ///
    /// Returns [`StorageDomainError::EmptyFilename`] for blank values and
    /// [`StorageDomainError::InvalidFilename`] for values containing path
    /// separators, NUL bytes, or `.`/`..` components.
    pub fn new(value: impl Into<String>) -> Result<Self, StorageDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(StorageDomainError::EmptyFilename);
        }

        let has_separator = normalized.contains(['/', '\\', '\0']);
        if has_separator || normalized == "." || normalized == ".." {
            return Err(StorageDomainError::InvalidFilename(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the filename as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the hidden name used while a copy of this file is being
    /// written, so partial content never appears under the final name.
    #[must_use]
    pub fn partial_name(&self) -> String {
        format!(".{}.partial", self.0)
    }
}

impl TryFrom<String> for ArchiveFilename {
    type Error = StorageDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ArchiveFilename> for String {
    fn from(value: ArchiveFilename) -> Self {
        value.0
    }
}

impl AsRef<str> for ArchiveFilename {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ArchiveFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
