//! Immutable migration configuration.
//!
//! All settings are collected into one [`MigrationConfig`] value at process
//! start and passed explicitly into each service.
//!
//! # Examples
//!
//! ```
//! use coursemigration::config::MigrationConfig;
//!
//! let config = MigrationConfig::default();
//! assert_eq!(config.max_restore_retries, 2);
//! assert!(config.storage.is_none());
//! ```

use crate::course::domain::CategoryId;
use crate::storage::domain::ambient_dir_and_file;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Identifies a storage backend variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendType {
    /// Two directories on a shared filesystem.
    SharedDisk,
    /// Push-only upload to a destination web service.
    WebService,
}

impl StorageBackendType {
    /// Returns the canonical configuration value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SharedDisk => "shared_disk",
            Self::WebService => "web_service",
        }
    }
}

impl fmt::Display for StorageBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-specific storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "storage_backend_type", rename_all = "snake_case")]
pub enum StorageSettings {
    /// Shared-disk backend settings.
    SharedDisk {
        /// Directory backups are written to.
        save_to: Utf8PathBuf,
        /// Directory restores read from.
        restore_from: Utf8PathBuf,
    },
    /// Web-service backend settings.
    WebService {
        /// Upload endpoint of the destination installation.
        url: String,
        /// Bearer token for the destination web service.
        token: String,
    },
}

impl StorageSettings {
    /// Returns the backend variant these settings configure.
    #[must_use]
    pub const fn backend_type(&self) -> StorageBackendType {
        match self {
            Self::SharedDisk { .. } => StorageBackendType::SharedDisk,
            Self::WebService { .. } => StorageBackendType::WebService,
        }
    }
}

/// Migration engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Selected storage backend, if any.
    pub storage: Option<StorageSettings>,
    /// Maximum restore retries; `0` disables retries.
    pub max_restore_retries: u32,
    /// Delete the archive from storage after a successful restore.
    pub delete_on_success: bool,
    /// Delete the archive from storage after a failed restore.
    pub delete_on_fail: bool,
    /// Hide restored courses from learners.
    pub hide_restored_course: bool,
    /// Category used when an intake row leaves the destination blank.
    pub default_destination_category: Option<CategoryId>,
    /// Discard the locally produced archive when pushing it fails.
    pub delete_local_archive_after_failed_push: bool,
    /// Delay before the first restore retry, in seconds.
    pub retry_base_delay_secs: u64,
    /// Upper bound on the delay between restore retries, in seconds.
    pub retry_max_delay_secs: u64,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            storage: None,
            max_restore_retries: 2,
            delete_on_success: false,
            delete_on_fail: false,
            hide_restored_course: false,
            default_destination_category: None,
            delete_local_archive_after_failed_push: true,
            retry_base_delay_secs: 60,
            retry_max_delay_secs: 86_400,
        }
    }
}

impl MigrationConfig {
    /// Loads and validates a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read,
    /// [`ConfigError::Parse`] for malformed JSON, and validation errors from
    /// [`MigrationConfig::validate`].
    pub fn from_json_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let (dir, file_name) = ambient_dir_and_file(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let raw = dir
            .read_to_string(&file_name)
            .map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?;
        Self::from_json_str(&raw)
    }

    /// Parses and validates a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and validation
    /// errors from [`MigrationConfig::validate`].
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the storage backend settings.
    #[must_use]
    pub fn with_storage(mut self, storage: StorageSettings) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the maximum number of restore retries.
    #[must_use]
    pub const fn with_max_restore_retries(mut self, retries: u32) -> Self {
        self.max_restore_retries = retries;
        self
    }

    /// Returns the selected storage backend variant.
    #[must_use]
    pub fn storage_backend_type(&self) -> Option<StorageBackendType> {
        self.storage.as_ref().map(StorageSettings::backend_type)
    }

    /// Returns the delay before the first restore retry.
    #[must_use]
    pub const fn retry_base_delay(&self) -> Duration {
        Duration::from_secs(self.retry_base_delay_secs)
    }

    /// Returns the upper bound on retry delays.
    #[must_use]
    pub const fn retry_max_delay(&self) -> Duration {
        Duration::from_secs(self.retry_max_delay_secs)
    }

    /// Checks settings that serde cannot validate on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when storage settings are incomplete or the
    /// retry delays are inconsistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_base_delay_secs > self.retry_max_delay_secs {
            return Err(ConfigError::InvalidRetryDelays {
                base: self.retry_base_delay_secs,
                max: self.retry_max_delay_secs,
            });
        }

        match &self.storage {
            None => Ok(()),
            Some(StorageSettings::SharedDisk {
                save_to,
                restore_from,
            }) => {
                validate_directory("save_to", save_to)?;
                validate_directory("restore_from", restore_from)
            }
            Some(StorageSettings::WebService { url, token }) => {
                let trimmed = url.trim();
                if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
                    return Err(ConfigError::InvalidUrl(url.clone()));
                }
                if token.trim().is_empty() {
                    return Err(ConfigError::MissingToken);
                }
                Ok(())
            }
        }
    }
}

fn validate_directory(field: &'static str, path: &Utf8Path) -> Result<(), ConfigError> {
    if path.as_str().trim().is_empty() {
        return Err(ConfigError::MissingDirectory(field));
    }
    if path.is_relative() {
        return Err(ConfigError::RelativeDirectory {
            field,
            path: path.to_owned(),
        });
    }
    Ok(())
}

/// Errors returned while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// Configuration file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for [`MigrationConfig`].
    #[error("failed to parse configuration: {0}")]
    Parse(#[source] serde_json::Error),

    /// A shared-disk directory is blank.
    #[error("storage directory '{0}' has not been configured")]
    MissingDirectory(&'static str),

    /// A shared-disk directory is relative.
    #[error("storage directory '{field}' must be absolute, got '{path}'")]
    RelativeDirectory {
        /// Setting name.
        field: &'static str,
        /// Configured path.
        path: Utf8PathBuf,
    },

    /// The web-service URL is not an http(s) URL.
    #[error("destination web service URL '{0}' must use http or https")]
    InvalidUrl(String),

    /// The web-service token is blank.
    #[error("destination web service token has not been configured")]
    MissingToken,

    /// The base retry delay exceeds the maximum delay.
    #[error("retry base delay {base}s exceeds maximum delay {max}s")]
    InvalidRetryDelays {
        /// Base delay in seconds.
        base: u64,
        /// Maximum delay in seconds.
        max: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, MigrationConfig, StorageBackendType, StorageSettings};
    use crate::course::domain::CategoryId;
    use rstest::rstest;

    #[rstest]
    fn missing_fields_take_defaults() -> eyre::Result<()> {
        let config = MigrationConfig::from_json_str("{}")?;
        eyre::ensure!(config == MigrationConfig::default());
        Ok(())
    }

    #[rstest]
    fn parses_shared_disk_settings() -> eyre::Result<()> {
        let config = MigrationConfig::from_json_str(
            r#"{
                "storage": {
                    "storage_backend_type": "shared_disk",
                    "save_to": "/srv/migration/out",
                    "restore_from": "/srv/migration/in"
                },
                "max_restore_retries": 5,
                "delete_on_success": true,
                "default_destination_category": 7
            }"#,
        )?;

        eyre::ensure!(config.storage_backend_type() == Some(StorageBackendType::SharedDisk));
        eyre::ensure!(config.max_restore_retries == 5);
        eyre::ensure!(config.delete_on_success);
        eyre::ensure!(config.default_destination_category == Some(CategoryId::new(7)?));
        Ok(())
    }

    #[rstest]
    fn rejects_zero_default_category() {
        let result = MigrationConfig::from_json_str(r#"{"default_destination_category": 0}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[rstest]
    #[case("/srv/out", "", "restore_from")]
    #[case("", "/srv/in", "save_to")]
    fn rejects_blank_directories(
        #[case] save_to: &str,
        #[case] restore_from: &str,
        #[case] field: &str,
    ) {
        let config = MigrationConfig::default().with_storage(StorageSettings::SharedDisk {
            save_to: save_to.into(),
            restore_from: restore_from.into(),
        });
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::MissingDirectory(name)) if name == field));
    }

    #[rstest]
    fn rejects_relative_directories() {
        let config = MigrationConfig::default().with_storage(StorageSettings::SharedDisk {
            save_to: "relative/out".into(),
            restore_from: "/srv/in".into(),
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RelativeDirectory { field: "save_to", .. })
        ));
    }

    #[rstest]
    #[case("ftp://example.org/upload", "token", false)]
    #[case("https://example.org/upload", "   ", false)]
    #[case("https://example.org/upload", "token", true)]
    fn validates_web_service_settings(#[case] url: &str, #[case] token: &str, #[case] valid: bool) {
        let config = MigrationConfig::default().with_storage(StorageSettings::WebService {
            url: url.to_owned(),
            token: token.to_owned(),
        });
        assert_eq!(config.validate().is_ok(), valid);
    }

    #[rstest]
    fn rejects_inverted_retry_delays() {
        let config = MigrationConfig {
            retry_base_delay_secs: 600,
            retry_max_delay_secs: 60,
            ..MigrationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRetryDelays { base: 600, max: 60 })
        ));
    }
}
