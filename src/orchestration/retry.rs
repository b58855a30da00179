//! Retry and backoff decisions for failed restore executions.

use super::FailureKind;
use crate::config::MigrationConfig;
use crate::migration::domain::MigrationRecord;
use crate::storage::ports::StorageBackend;
use std::fmt;
use std::time::Duration;

/// Why a retry was approved or declined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// All conditions hold.
    Approved,
    /// `max_restore_retries` is zero.
    RetriesDisabled,
    /// The failure category cannot be fixed by retrying.
    NotRetryable(FailureKind),
    /// The attempt count exceeds the configured maximum.
    Exhausted {
        /// Attempt that just failed.
        attempt: u32,
        /// Configured maximum.
        max: u32,
    },
    /// The record has no archive filename.
    MissingFilename,
    /// No storage backend is configured.
    StorageUnavailable,
    /// The archive is no longer in storage.
    ArchiveMissing,
    /// Archive presence could not be determined.
    ArchiveCheckFailed(String),
    /// The record could not be loaded or updated.
    RecordUnavailable(String),
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => f.write_str("retry approved"),
            Self::RetriesDisabled => f.write_str("retries are disabled"),
            Self::NotRetryable(kind) => write!(f, "{kind} failures are not retried"),
            Self::Exhausted { attempt, max } => {
                write!(f, "attempt {attempt} exceeds the maximum of {max} retries")
            }
            Self::MissingFilename => f.write_str("the migration has no archive filename"),
            Self::StorageUnavailable => f.write_str("no storage backend is configured"),
            Self::ArchiveMissing => f.write_str("the archive is no longer in storage"),
            Self::ArchiveCheckFailed(detail) => {
                write!(f, "archive presence could not be checked: {detail}")
            }
            Self::RecordUnavailable(detail) => {
                write!(f, "the migration record is unavailable: {detail}")
            }
        }
    }
}

/// Outcome of consulting the retry controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryDecision {
    /// Whether the execution should be rescheduled.
    pub should_retry: bool,
    /// Attempt number of the execution that failed.
    pub attempt: u32,
    /// Explanation for logs and reports.
    pub reason: RetryReason,
}

impl RetryDecision {
    /// A declined decision.
    #[must_use]
    pub const fn declined(attempt: u32, reason: RetryReason) -> Self {
        Self {
            should_retry: false,
            attempt,
            reason,
        }
    }

    const fn approved(attempt: u32) -> Self {
        Self {
            should_retry: true,
            attempt,
            reason: RetryReason::Approved,
        }
    }
}

/// Bounded retry policy with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Builds the policy from configuration.
    #[must_use]
    pub fn from_config(config: &MigrationConfig) -> Self {
        Self::new(
            config.max_restore_retries,
            config.retry_base_delay(),
            config.retry_max_delay(),
        )
    }

    /// Returns the configured maximum number of retries.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Decides whether a failed execution of `record` should be retried.
    ///
    /// The record's attempt counter identifies the execution that failed.
    /// A retry is approved only when retries are enabled, the failure is
    /// retryable, the attempt is within the maximum, and the archive is
    /// confirmed present in storage.
    pub async fn decide(
        &self,
        record: &MigrationRecord,
        failure: FailureKind,
        storage: Option<&dyn StorageBackend>,
    ) -> RetryDecision {
        let attempt = record.attempts();
        if self.max_retries == 0 {
            return RetryDecision::declined(attempt, RetryReason::RetriesDisabled);
        }
        if !failure.is_retryable() {
            return RetryDecision::declined(attempt, RetryReason::NotRetryable(failure));
        }
        if attempt > self.max_retries {
            return RetryDecision::declined(
                attempt,
                RetryReason::Exhausted {
                    attempt,
                    max: self.max_retries,
                },
            );
        }
        let Some(filename) = record.filename() else {
            return RetryDecision::declined(attempt, RetryReason::MissingFilename);
        };
        let Some(storage) = storage else {
            return RetryDecision::declined(attempt, RetryReason::StorageUnavailable);
        };
        match storage.exists(filename).await {
            Ok(true) => RetryDecision::approved(attempt),
            Ok(false) => RetryDecision::declined(attempt, RetryReason::ArchiveMissing),
            Err(err) => {
                let detail = storage.last_error().unwrap_or_else(|| err.to_string());
                storage.clear_error();
                RetryDecision::declined(attempt, RetryReason::ArchiveCheckFailed(detail))
            }
        }
    }

    /// Returns the delay before retrying after `attempt` failed.
    ///
    /// The delay doubles from the base delay with each attempt and never
    /// exceeds the maximum delay.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 2_u32.checked_pow(exponent).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&MigrationConfig::default())
    }
}
