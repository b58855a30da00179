//! Aggregate result of a bulk intake run.

use crate::migration::domain::MigrationId;
use minijinja::{Environment, context};
use serde::Serialize;
use thiserror::Error;

const SUMMARY_TEMPLATE: &str = "\
Processed {{ total }} row{{ '' if total == 1 else 's' }}: \
{{ succeeded }} queued, {{ failed }} failed, {{ malformed }} malformed.
{%- for error in errors %}
{{ error }}
{%- endfor %}";

/// Counts and messages reported after a bulk intake run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntakeSummary {
    /// Data rows read.
    pub total: usize,
    /// Rows whose backup succeeded and restore was queued.
    pub succeeded: usize,
    /// Valid rows whose backup failed.
    pub failed: usize,
    /// Rows rejected by validation.
    pub malformed: usize,
    /// Per-row messages in file order.
    pub errors: Vec<String>,
    /// Restore records created for successful rows.
    pub migrations: Vec<MigrationId>,
}

/// Error raised when the summary template cannot be rendered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to render intake summary: {0}")]
pub struct SummaryRenderError(pub String);

impl IntakeSummary {
    /// Returns whether any row failed.
    #[must_use]
    pub const fn has_errors(&self) -> bool {
        self.failed > 0 || self.malformed > 0
    }

    /// Returns the per-row messages joined by newlines.
    #[must_use]
    pub fn error_text(&self) -> String {
        self.errors.join("\n")
    }

    /// Renders the plain-text report shown to the uploader.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryRenderError`] when template rendering fails.
    pub fn render_text(&self) -> Result<String, SummaryRenderError> {
        let environment = Environment::new();
        environment
            .render_str(
                SUMMARY_TEMPLATE,
                context! {
                    total => self.total,
                    succeeded => self.succeeded,
                    failed => self.failed,
                    malformed => self.malformed,
                    errors => &self.errors,
                },
            )
            .map_err(|error| SummaryRenderError(error.to_string()))
    }
}
